use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use reqwest::StatusCode;
use tokio::task::JoinSet;

use crate::config::{ForwardConfig, RepoConfig};
use crate::error::{AppError, Result};

/// The parts of an accepted delivery relayed downstream.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub url: String,
    pub event: String,
    pub delivery_id: Option<String>,
    pub signature: Option<String>,
    pub body: Bytes,
}

/// Relays accepted deliveries to a downstream URL.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    default_url: Option<String>,
    in_flight: Arc<Mutex<JoinSet<()>>>,
}

impl Forwarder {
    pub fn new(config: &ForwardConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build forward client: {e}")))?;

        Ok(Self {
            client,
            default_url: config.url.clone(),
            in_flight: Arc::default(),
        })
    }

    /// Downstream URL for a repo, if any.
    pub fn target<'a>(&'a self, repo: &'a RepoConfig) -> Option<&'a str> {
        repo.forward_url.as_deref().or(self.default_url.as_deref())
    }

    /// POST the delivery downstream, preserving the GitHub headers.
    pub async fn send(&self, request: &ForwardRequest) -> Result<StatusCode> {
        let mut builder = self
            .client
            .post(&request.url)
            .header("content-type", "application/json")
            .header("x-github-event", &request.event);

        if let Some(id) = &request.delivery_id {
            builder = builder.header("x-github-delivery", id);
        }
        if let Some(sig) = &request.signature {
            builder = builder.header("x-hub-signature-256", sig);
        }

        let response = builder.body(request.body.clone()).send().await?;
        Ok(response.status())
    }

    /// Forward in the background; the outcome is only logged.
    pub fn spawn(&self, request: ForwardRequest) {
        let forwarder = self.clone();
        let Ok(mut in_flight) = self.in_flight.lock() else {
            tracing::error!(url = %request.url, "Forward task set poisoned, dropping delivery");
            return;
        };
        // Reap finished forwards so the set only holds pending ones
        while in_flight.try_join_next().is_some() {}
        in_flight.spawn(async move {
            match forwarder.send(&request).await {
                Ok(status) if status.is_success() => {
                    tracing::info!(
                        url = %request.url,
                        event = %request.event,
                        status = %status,
                        "Forwarded delivery"
                    );
                }
                Ok(status) => {
                    tracing::warn!(
                        url = %request.url,
                        event = %request.event,
                        status = %status,
                        "Downstream rejected forwarded delivery"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        url = %request.url,
                        event = %request.event,
                        error = %e,
                        "Failed to forward delivery"
                    );
                }
            }
        });
    }

    /// Wait up to `timeout` for background forwards to finish. Returns how
    /// many were still pending and got aborted.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let mut pending = match self.in_flight.lock() {
            Ok(mut in_flight) => std::mem::take(&mut *in_flight),
            Err(_) => return 0,
        };
        if pending.is_empty() {
            return 0;
        }

        tracing::info!(pending = pending.len(), "Waiting for forwarded deliveries");
        let finished = tokio::time::timeout(timeout, async {
            while pending.join_next().await.is_some() {}
        })
        .await;

        if finished.is_ok() {
            return 0;
        }
        let aborted = pending.len();
        tracing::warn!(aborted = aborted, "Dropping forwards still in flight at shutdown");
        pending.abort_all();
        aborted
    }
}
