//! Dispatch routing: the channel → (hub, status) policy table.
//!
//! This is the only place hub naming and status-code policy may appear.
//! The table is read-only after startup; a channel with no rule means
//! "ignore this event", never a fatal condition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// The (hub description, status code) pair emitted for a channel's
/// first sighting of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRule {
    /// Free-text hub description sent as `current_hub`.
    pub current_hub: String,
    /// Status code string sent as `status`.
    pub status: String,
}

impl DispatchRule {
    pub fn new(current_hub: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            current_hub: current_hub.into(),
            status: status.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse rules file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Open routing table mapping channel ids to dispatch rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchTable {
    rules: HashMap<u16, DispatchRule>,
}

impl DispatchTable {
    /// Empty table; every event is unroutable until rules are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// The two production rules the service ships with.
    pub fn default_rules() -> Self {
        Self::new()
            .with_rule(1, DispatchRule::new("Received at Atlanta Hub", "DISPATCHED_2"))
            .with_rule(
                2,
                DispatchRule::new(
                    "Received at Chennai Hub, Dispatched to Atlanta Hub",
                    "DISPATCHED_1",
                ),
            )
    }

    pub fn with_rule(mut self, channel: u16, rule: DispatchRule) -> Self {
        self.rules.insert(channel, rule);
        self
    }

    /// Load a table from a JSON file of the form
    /// `{"1": {"current_hub": "...", "status": "..."}, ...}`.
    pub fn from_json_file(path: &Path) -> Result<Self, RulesError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| RulesError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Look up the rule for a channel. `None` means the channel carries
    /// no dispatch policy and its events are ignored.
    pub fn resolve(&self, channel: u16) -> Option<&DispatchRule> {
        self.rules.get(&channel)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
