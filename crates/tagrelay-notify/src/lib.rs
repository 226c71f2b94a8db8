//! Outbound delivery for tagrelay: the HTTP notification client and the
//! bounded worker pool that drains the pipeline's delivery queue.

pub mod client;
pub mod worker;

pub use client::NotificationClient;
pub use worker::{DeliveryPool, QueueSink, delivery_queue};
