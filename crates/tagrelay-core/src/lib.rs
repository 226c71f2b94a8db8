//! Core dispatch logic for tagrelay: data model, channel dedup gate,
//! routing table, and the event pipeline. No I/O lives here; the reader
//! session and the HTTP delivery pool are separate crates plugged in at
//! the [`pipeline::DispatchSink`] seam.

pub mod dedup;
pub mod pipeline;
pub mod routes;
pub mod types;

pub use dedup::SeenSet;
pub use pipeline::{DispatchError, DispatchSink, Pipeline, PipelineStats};
pub use routes::{DispatchRule, DispatchTable, RulesError};
pub use types::{NotificationOutcome, NotificationRequest, TagReadEvent};
