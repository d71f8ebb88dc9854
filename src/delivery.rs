//! Inspection of a repository webhook's delivery log.
//!
//! Used to confirm end to end that GitHub delivered an event to the filter
//! endpoint and to read back the response the endpoint gave it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::platform::types::Delivery;
use crate::platform::Platform;
use crate::webhook::response::DeliveryResponse;

pub struct DeliveryInspector {
    platform: Arc<dyn Platform>,
    token: Option<String>,
    repo_full_name: String,
    hook_id: u64,
}

impl DeliveryInspector {
    pub fn new(
        platform: Arc<dyn Platform>,
        token: Option<String>,
        repo_full_name: impl Into<String>,
        hook_id: u64,
    ) -> Self {
        Self {
            platform,
            token,
            repo_full_name: repo_full_name.into(),
            hook_id,
        }
    }

    /// Ids of all deliveries currently in the log.
    pub async fn known_ids(&self) -> Result<HashSet<u64>> {
        let deliveries = self
            .platform
            .list_deliveries(self.token.as_deref(), &self.repo_full_name, self.hook_id)
            .await?;
        Ok(deliveries.into_iter().map(|d| d.id).collect())
    }

    /// Poll until a delivery of `event` not in `known` shows up and return it.
    ///
    /// When several new deliveries match, the oldest one wins.
    pub async fn wait_for_delivery(
        &self,
        event: &str,
        known: &HashSet<u64>,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Delivery> {
        let deadline = Instant::now().checked_add(timeout).ok_or_else(|| {
            AppError::Config(format!("Timeout of {}s is out of range", timeout.as_secs()))
        })?;

        loop {
            let deliveries = self
                .platform
                .list_deliveries(self.token.as_deref(), &self.repo_full_name, self.hook_id)
                .await?;

            let found = deliveries
                .iter()
                .filter(|d| d.event == event && !known.contains(&d.id))
                .map(|d| d.id)
                .min();

            if let Some(id) = found {
                tracing::info!(
                    repo = %self.repo_full_name,
                    hook_id = self.hook_id,
                    delivery = id,
                    event = event,
                    "Found new webhook delivery"
                );
                return self
                    .platform
                    .get_delivery(self.token.as_deref(), &self.repo_full_name, self.hook_id, id)
                    .await;
            }

            let next_poll = Instant::now().checked_add(interval);
            if next_poll.map_or(true, |next| next > deadline) {
                return Err(AppError::Timeout(format!(
                    "no new {event} delivery for {} hook {} within {}s",
                    self.repo_full_name,
                    self.hook_id,
                    timeout.as_secs()
                )));
            }

            tracing::debug!(event = event, "No new delivery yet, polling again");
            tokio::time::sleep(interval).await;
        }
    }

    /// Like [`wait_for_delivery`](Self::wait_for_delivery), returning the
    /// endpoint's recorded response parsed.
    pub async fn wait_for_response(
        &self,
        event: &str,
        known: &HashSet<u64>,
        timeout: Duration,
        interval: Duration,
    ) -> Result<DeliveryResponse> {
        let delivery = self.wait_for_delivery(event, known, timeout, interval).await?;
        let payload = delivery.response.payload.ok_or_else(|| {
            AppError::GitHubApi(format!(
                "Delivery {} has no recorded response",
                delivery.summary.id
            ))
        })?;
        Ok(serde_json::from_str(&payload)?)
    }
}
