//! Daemon wiring: reader session → pipeline → delivery pool, plus
//! signal handling and ordered shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use tagrelay_core::{DispatchTable, Pipeline};
use tagrelay_notify::{DeliveryPool, NotificationClient, delivery_queue};
use tagrelay_reader::ReaderSession;

use crate::cli::Cli;

/// How long shutdown waits for in-flight deliveries before abandoning
/// them.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Run the daemon until interrupted or the reader stream ends.
///
/// Startup failures (unreachable reader, malformed rules file) propagate
/// to `main`, which owns the exit code. Nothing past startup terminates
/// the process.
pub async fn run_daemon(args: Cli) -> anyhow::Result<()> {
    let table = match &args.rules {
        Some(path) => DispatchTable::from_json_file(path).context("loading dispatch rules")?,
        None => DispatchTable::default_rules(),
    };
    tracing::info!(channels = table.len(), "dispatch table loaded");

    let client = NotificationClient::new(&args.endpoint, Duration::from_secs(args.timeout_secs))
        .context("building notification client")?;
    let (sink, rx) = delivery_queue(args.queue_capacity);
    let pool = DeliveryPool::spawn(client, rx, args.workers);
    let pipeline = Arc::new(Pipeline::new(table, sink));

    let session = ReaderSession::connect(&args.host, args.port).await?;
    let mut reader = session.start_reading(Arc::clone(&pipeline));

    tokio::select! {
        () = shutdown_signal() => {}
        () = reader.wait() => {
            tracing::warn!("reader stream ended unexpectedly");
        }
    }

    // Teardown order: stop the event source first, then the pipeline,
    // then give in-flight deliveries a short drain window. Teardown
    // never fails the daemon.
    reader.stop();
    pipeline.stop().await;
    let stats = pipeline.stats();
    tracing::info!(
        received = stats.received,
        dispatched = stats.dispatched,
        duplicates = stats.duplicates,
        unroutable = stats.unroutable,
        queue_rejected = stats.queue_rejected,
        "pipeline totals"
    );
    if tokio::time::timeout(DRAIN_GRACE, pool.join()).await.is_err() {
        tracing::warn!("abandoning in-flight deliveries");
    }
    tracing::info!("daemon stopped");
    Ok(())
}

/// Completes on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                tracing::error!(%err, "failed to register SIGTERM handler");
                ctrl_c.await.ok();
                tracing::info!("received ctrl-c, shutting down");
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagrelay_core::DispatchRule;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Fake reader hardware: one session, canned report lines, close.
    async fn fake_reader(lines: &'static str) -> (String, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            socket.write_all(lines.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
        });
        (addr.ip().to_string(), addr.port())
    }

    /// Fake tracking service: accepts connections until aborted, records
    /// each request line, answers 200.
    async fn fake_tracking_service() -> (String, Arc<std::sync::Mutex<Vec<String>>>, JoinHandle<()>)
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let recorder = Arc::clone(&seen);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let recorder = Arc::clone(&recorder);
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let mut request = Vec::new();
                    loop {
                        let Ok(n) = socket.read(&mut buf).await else {
                            return;
                        };
                        request.extend_from_slice(&buf[..n]);
                        if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    let head = String::from_utf8_lossy(&request);
                    if let Some(line) = head.lines().next() {
                        recorder.lock().expect("recorder").push(line.to_string());
                    }
                    socket
                        .write_all(
                            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                        )
                        .await
                        .ok();
                    socket.shutdown().await.ok();
                });
            }
        });

        (
            format!("http://{addr}/rfid/updateCurrentHub"),
            seen,
            handle,
        )
    }

    async fn wait_for_requests(seen: &std::sync::Mutex<Vec<String>>, expected: usize) {
        for _ in 0..100 {
            if seen.lock().expect("recorder").len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "timed out waiting for {expected} requests, saw {:?}",
            seen.lock().expect("recorder")
        );
    }

    /// Full path: fake hardware → reader session → pipeline → delivery
    /// pool → fake tracking service. Same wiring as `run_daemon`, minus
    /// signal handling.
    #[tokio::test]
    async fn reads_flow_end_to_end_with_per_pair_dedup() {
        let (endpoint, seen, service) = fake_tracking_service().await;
        let (host, port) =
            fake_reader("1\tE2000\n1\tE2000\n2\tE2000\n1\tE2000\n7\tE2000\n").await;

        let table = DispatchTable::new()
            .with_rule(1, DispatchRule::new("Hub-A-intermediate", "DISPATCHED_2"))
            .with_rule(2, DispatchRule::new("Hub-B-transfer", "DISPATCHED_1"));
        let client =
            NotificationClient::new(&endpoint, Duration::from_secs(5)).expect("client");
        let (sink, rx) = delivery_queue(16);
        let pool = DeliveryPool::spawn(client, rx, 2);
        let pipeline = Arc::new(Pipeline::new(table, sink));

        let session = ReaderSession::connect(&host, port).await.expect("connect");
        let mut reader = session.start_reading(Arc::clone(&pipeline));

        tokio::time::timeout(Duration::from_secs(5), reader.wait())
            .await
            .expect("stream should end");
        wait_for_requests(&seen, 2).await;

        // One POST per distinct (channel, tag) pair, channel 7 ignored.
        let requests = seen.lock().expect("recorder").clone();
        assert_eq!(requests.len(), 2);
        assert!(
            requests.iter().any(|line| line
                .contains("rfid=E2000&current_hub=Hub-A-intermediate&status=DISPATCHED_2")),
            "missing channel 1 notification: {requests:?}"
        );
        assert!(
            requests
                .iter()
                .any(|line| line.contains("status=DISPATCHED_1")),
            "missing channel 2 notification: {requests:?}"
        );

        // Orderly shutdown: reader already done, repeated stops safe.
        reader.stop();
        reader.stop();
        pipeline.stop().await;
        pipeline.stop().await;
        tokio::time::timeout(DRAIN_GRACE, pool.join())
            .await
            .expect("pool drains once sink is dropped");
        service.abort();
    }

    #[tokio::test]
    async fn unreachable_reader_fails_startup() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let result = ReaderSession::connect(&addr.ip().to_string(), addr.port()).await;
        assert!(result.is_err(), "startup must fail on unreachable reader");
    }
}
