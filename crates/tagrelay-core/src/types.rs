use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Read events ──────────────────────────────────────────────────

/// One physical tag detection as reported by the reader hardware.
///
/// Ephemeral: exists only for the duration of a single dispatch decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagReadEvent {
    /// Antenna/port identifier the tag was read on.
    pub channel: u16,
    /// Unique identifier read from the physical tag (EPC).
    pub tag_id: String,
    /// Stamped at receipt; used for diagnostics only.
    pub observed_at: DateTime<Utc>,
}

impl TagReadEvent {
    pub fn new(channel: u16, tag_id: impl Into<String>) -> Self {
        Self {
            channel,
            tag_id: tag_id.into(),
            observed_at: Utc::now(),
        }
    }
}

impl fmt::Display for TagReadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{} {}", self.channel, self.tag_id)
    }
}

// ─── Outbound notifications ───────────────────────────────────────

/// Payload handed to the delivery pool for one status-transition
/// notification. Immutable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub tag_id: String,
    pub current_hub: String,
    pub status: String,
}

/// Result of a single delivery attempt. Consumed only for logging;
/// never alters the seen set retroactively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum NotificationOutcome {
    /// HTTP 200; carries the response body.
    Delivered(String),
    /// Non-200 response; carries the status code.
    RemoteError(u16),
    /// The request never produced a response (connect failure, timeout).
    TransportError(String),
}

impl NotificationOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}
