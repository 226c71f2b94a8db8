//! tagrelay: RFID tag-read dispatch daemon binary.
//! Wires the reader session, event pipeline, and delivery pool in one
//! process and runs until interrupted.

use clap::Parser;

mod cli;
mod daemon;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = std::env::var("TAGRELAY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let args = cli::Cli::parse();

    tracing::info!("tagrelay daemon starting");
    daemon::run_daemon(args).await
}
