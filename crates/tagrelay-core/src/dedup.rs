//! Per-channel dedup gate: which tags have already been dispatched on
//! which channel. State grows monotonically for the process lifetime;
//! tags are never forgotten (no eviction, no persistence).

use std::collections::{HashMap, HashSet};

/// Per-channel sets of already-dispatched tag ids.
///
/// Owned by the pipeline behind its state mutex; the methods here are
/// plain `&mut` operations and rely on the caller for atomicity of the
/// check-then-mark sequence ([`SeenSet::claim`] does both in one call).
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    channels: HashMap<u16, HashSet<String>>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership check without mutation.
    pub fn is_new(&self, channel: u16, tag_id: &str) -> bool {
        self.channels
            .get(&channel)
            .is_none_or(|tags| !tags.contains(tag_id))
    }

    /// Record a tag as dispatched on a channel.
    pub fn mark_seen(&mut self, channel: u16, tag_id: &str) {
        self.channels
            .entry(channel)
            .or_default()
            .insert(tag_id.to_string());
    }

    /// Atomic check-and-insert: returns `true` exactly once per
    /// (channel, tag) pair. This is the pipeline's dedup gate.
    pub fn claim(&mut self, channel: u16, tag_id: &str) -> bool {
        self.channels
            .entry(channel)
            .or_default()
            .insert(tag_id.to_string())
    }

    /// Roll back a claim whose dispatch attempt could not be initiated
    /// (delivery queue full). Not used on delivery *failure*: a failed
    /// attempt still counts as the tag's one attempt.
    pub fn release(&mut self, channel: u16, tag_id: &str) {
        if let Some(tags) = self.channels.get_mut(&channel) {
            tags.remove(tag_id);
        }
    }

    /// Total tags recorded across all channels.
    pub fn len(&self) -> usize {
        self.channels.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.values().all(HashSet::is_empty)
    }
}
