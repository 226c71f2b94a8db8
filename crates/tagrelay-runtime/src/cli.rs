//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::Parser;

use tagrelay_reader::DEFAULT_READER_PORT;

/// Production tracking service endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://172.22.81.182:8080/rfid/updateCurrentHub";

#[derive(Debug, Parser)]
#[command(name = "tagrelay", about = "RFID tag-read dispatch daemon")]
pub struct Cli {
    /// Reader hardware host address
    pub host: String,

    /// Reader host interface TCP port
    #[arg(long, env = "TAGRELAY_READER_PORT", default_value_t = DEFAULT_READER_PORT)]
    pub port: u16,

    /// Tracking service base URL for status notifications
    #[arg(long, env = "TAGRELAY_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// JSON dispatch rules file (default: built-in two-channel table)
    #[arg(long, env = "TAGRELAY_RULES")]
    pub rules: Option<PathBuf>,

    /// Number of delivery workers
    #[arg(long, env = "TAGRELAY_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Delivery queue capacity
    #[arg(long, env = "TAGRELAY_QUEUE_CAPACITY", default_value_t = 256)]
    pub queue_capacity: usize,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "TAGRELAY_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}
