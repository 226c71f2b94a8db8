//! Event pipeline: the single decision point between the reader's event
//! stream and the delivery pool.
//!
//! Per event: resolve the channel's rule, claim the (channel, tag) pair
//! in the dedup gate, and hand the payload to the [`DispatchSink`], all
//! under one mutex guard, so racing callbacks for the same tag can never
//! both pass the gate. The handoff is non-blocking; delivery outcomes
//! are the pool's concern and never flow back here.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::dedup::SeenSet;
use crate::routes::DispatchTable;
use crate::types::{NotificationRequest, TagReadEvent};

// ─── Dispatch sink seam ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The delivery queue is at capacity; no attempt was initiated.
    #[error("delivery queue full")]
    QueueFull,

    /// The delivery pool has shut down.
    #[error("delivery queue closed")]
    Closed,
}

/// Where the pipeline hands off payloads for delivery.
///
/// Implementations must be non-blocking: the pipeline calls `dispatch`
/// while holding its state lock, on the event-receive path.
pub trait DispatchSink: Send + Sync {
    fn dispatch(&self, request: NotificationRequest) -> Result<(), DispatchError>;
}

// ─── Pipeline counters ────────────────────────────────────────────

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    dispatched: AtomicU64,
    duplicates: AtomicU64,
    unroutable: AtomicU64,
    queue_rejected: AtomicU64,
    dropped_after_stop: AtomicU64,
}

/// Snapshot of pipeline activity, logged at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub received: u64,
    pub dispatched: u64,
    pub duplicates: u64,
    pub unroutable: u64,
    pub queue_rejected: u64,
    pub dropped_after_stop: u64,
}

// ─── Pipeline ─────────────────────────────────────────────────────

/// Mutable state behind the pipeline mutex. The sink lives here so that
/// `stop` can drop it, which is what terminates the delivery pool once
/// the queue drains.
#[derive(Debug)]
struct Inner<S> {
    seen: SeenSet,
    sink: Option<S>,
}

/// The read-event dispatch pipeline.
///
/// `handle_event` takes `&self` and is safe to call from concurrent
/// tasks; the routing table is immutable and the dedup gate is guarded.
#[derive(Debug)]
pub struct Pipeline<S> {
    table: DispatchTable,
    inner: Mutex<Inner<S>>,
    counters: Counters,
}

impl<S: DispatchSink> Pipeline<S> {
    pub fn new(table: DispatchTable, sink: S) -> Self {
        Self {
            table,
            inner: Mutex::new(Inner {
                seen: SeenSet::new(),
                sink: Some(sink),
            }),
            counters: Counters::default(),
        }
    }

    /// Process one read event. Never blocks on the network, never
    /// returns an error to the event source.
    pub async fn handle_event(&self, event: TagReadEvent) {
        self.counters.received.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(channel = event.channel, tag = %event.tag_id, "tag read");

        // Unroutable channels leave no trace in the dedup gate.
        let Some(rule) = self.table.resolve(event.channel) else {
            self.counters.unroutable.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(channel = event.channel, tag = %event.tag_id, "no dispatch rule");
            return;
        };

        let mut inner = self.inner.lock().await;

        if inner.sink.is_none() {
            self.counters.dropped_after_stop.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(tag = %event.tag_id, "pipeline stopped, event dropped");
            return;
        }

        // The hardware reports an in-range tag many times per second;
        // everything past the first sighting is dropped silently.
        if !inner.seen.claim(event.channel, &event.tag_id) {
            self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let request = NotificationRequest {
            tag_id: event.tag_id.clone(),
            current_hub: rule.current_hub.clone(),
            status: rule.status.clone(),
        };

        // The lock is held since the sink check, so the sink is still there.
        let handoff = inner
            .sink
            .as_ref()
            .map(|sink| sink.dispatch(request))
            .unwrap_or(Err(DispatchError::Closed));

        match handoff {
            Ok(()) => {
                self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    channel = event.channel,
                    tag = %event.tag_id,
                    status = %rule.status,
                    "first sighting, notification queued"
                );
            }
            Err(err) => {
                // No attempt was initiated, so the claim is rolled back;
                // an in-range tag will be read again within milliseconds.
                inner.seen.release(event.channel, &event.tag_id);
                self.counters.queue_rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    channel = event.channel,
                    tag = %event.tag_id,
                    "delivery handoff rejected: {err}"
                );
            }
        }
    }

    /// Stop the pipeline: drop the sink so the delivery pool terminates
    /// once its queue drains. Safe to call more than once; returns
    /// `true` only on the call that actually stopped it.
    pub async fn stop(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.sink.take() {
            Some(_) => {
                tracing::info!("pipeline stopped");
                true
            }
            None => false,
        }
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            received: self.counters.received.load(Ordering::Relaxed),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
            unroutable: self.counters.unroutable.load(Ordering::Relaxed),
            queue_rejected: self.counters.queue_rejected.load(Ordering::Relaxed),
            dropped_after_stop: self.counters.dropped_after_stop.load(Ordering::Relaxed),
        }
    }

    /// Number of (channel, tag) pairs recorded in the dedup gate.
    pub async fn seen_len(&self) -> usize {
        self.inner.lock().await.seen.len()
    }
}
