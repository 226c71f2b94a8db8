//! Bounded delivery queue and worker pool.
//!
//! The pipeline hands payloads to a [`QueueSink`] (non-blocking
//! `try_send`); a fixed number of workers drain the queue and perform
//! the HTTP deliveries. The queue bound plus the worker count cap the
//! number of in-flight requests. Workers never retry and never touch
//! the dedup state; outcomes are logged and forgotten.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use tagrelay_core::{DispatchError, DispatchSink, NotificationOutcome, NotificationRequest};

use crate::client::NotificationClient;

// ─── Queue sink ───────────────────────────────────────────────────

/// Sending side of the delivery queue, plugged into the pipeline.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::Sender<NotificationRequest>,
}

impl DispatchSink for QueueSink {
    fn dispatch(&self, request: NotificationRequest) -> Result<(), DispatchError> {
        self.tx.try_send(request).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })
    }
}

/// Create a bounded delivery queue. The sink goes to the pipeline, the
/// receiver to [`DeliveryPool::spawn`].
pub fn delivery_queue(capacity: usize) -> (QueueSink, mpsc::Receiver<NotificationRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSink { tx }, rx)
}

// ─── Worker pool ──────────────────────────────────────────────────

/// Handles for the spawned delivery workers. Workers exit on their own
/// once every [`QueueSink`] clone is dropped and the queue drains.
#[derive(Debug)]
pub struct DeliveryPool {
    handles: Vec<JoinHandle<()>>,
}

impl DeliveryPool {
    /// Spawn `workers` tasks draining `rx` through `client`.
    pub fn spawn(
        client: NotificationClient,
        rx: mpsc::Receiver<NotificationRequest>,
        workers: usize,
    ) -> Self {
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..workers.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let client = client.clone();
                tokio::spawn(async move {
                    run_worker(worker, client, rx).await;
                })
            })
            .collect();
        Self { handles }
    }

    /// Wait for every worker to exit. Completes only after the queue's
    /// senders are gone; the runtime bounds this with a drain grace
    /// timeout and abandons the pool if it elapses.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn run_worker(
    worker: usize,
    client: NotificationClient,
    rx: Arc<Mutex<mpsc::Receiver<NotificationRequest>>>,
) {
    loop {
        // Hold the receiver lock only while waiting; delivery happens
        // outside it so workers overlap on the network.
        let next = { rx.lock().await.recv().await };
        let Some(request) = next else {
            tracing::debug!(worker, "delivery queue closed, worker exiting");
            break;
        };

        match client.send(&request).await {
            NotificationOutcome::Delivered(body) => {
                tracing::info!(tag = %request.tag_id, "notification delivered");
                tracing::debug!(tag = %request.tag_id, %body, "remote response");
            }
            NotificationOutcome::RemoteError(code) => {
                tracing::error!(tag = %request.tag_id, code, "remote service rejected notification");
            }
            NotificationOutcome::TransportError(cause) => {
                tracing::error!(tag = %request.tag_id, %cause, "notification transport failed");
            }
        }
    }
}
