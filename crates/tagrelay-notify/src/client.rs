//! HTTP notification client: one POST per status-transition, outcome
//! reported as a value, never as a propagated error.

use std::time::Duration;

use tagrelay_core::{NotificationOutcome, NotificationRequest};

/// Stateless client for the tracking service's `updateCurrentHub`
/// endpoint. The underlying `reqwest::Client` holds the connection pool
/// and is shared across all concurrent deliveries.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    http: reqwest::Client,
    base_url: String,
}

impl NotificationClient {
    /// Build a client for the given base URL. `timeout` bounds each
    /// delivery attempt end to end; expiry surfaces as a
    /// [`NotificationOutcome::TransportError`].
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Perform exactly one delivery attempt: POST with `rfid`,
    /// `current_hub` and `status` query parameters and no body.
    ///
    /// All failure modes are captured in the returned outcome; this
    /// method never panics and never returns `Err` across its boundary.
    /// No retries, no queuing.
    pub async fn send(&self, request: &NotificationRequest) -> NotificationOutcome {
        let response = self
            .http
            .post(self.base_url.as_str())
            .query(&[
                ("rfid", request.tag_id.as_str()),
                ("current_hub", request.current_hub.as_str()),
                ("status", request.status.as_str()),
            ])
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                if status == reqwest::StatusCode::OK {
                    match response.text().await {
                        Ok(body) => NotificationOutcome::Delivered(body),
                        Err(err) => NotificationOutcome::TransportError(err.to_string()),
                    }
                } else {
                    NotificationOutcome::RemoteError(status.as_u16())
                }
            }
            Err(err) => NotificationOutcome::TransportError(err.to_string()),
        }
    }
}
