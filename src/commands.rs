//! Operator commands run from the CLI besides `serve`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::delivery::DeliveryInspector;
use crate::error::{AppError, ClientError, Result};
use crate::platform::types::{CreateWebhook, DeliverySummary, Hook};
use crate::server::AppState;
use crate::webhook::events::WebhookEvent;
use crate::webhook::handler::evaluate_event;
use crate::webhook::response::DeliveryResponse;

/// Evaluate a payload file against a configured repo's filter groups,
/// without signature verification.
pub async fn evaluate(
    state: &AppState,
    repo: &str,
    event_type: &str,
    payload_path: &Path,
) -> Result<DeliveryResponse> {
    let entry = state
        .registry
        .get(repo)
        .ok_or_else(|| AppError::Config(format!("Repo {repo} is not configured")))?;

    let payload = tokio::fs::read(payload_path).await?;
    let event = match WebhookEvent::parse(event_type, &payload) {
        Ok(event) => event,
        Err(_) => return Ok(ClientError::InvalidPayload.into()),
    };

    let response = match evaluate_event(state, entry, &event).await? {
        Some(group) => {
            tracing::info!(repo = repo, group = group, "Payload matched filter group");
            DeliveryResponse::accepted()
        }
        None => ClientError::FilterUnmatched.into(),
    };

    Ok(response)
}

/// Create a webhook pointing at `url` on every configured repo.
pub async fn register(state: &AppState, url: &str) -> Result<Vec<(String, Hook)>> {
    let mut created = Vec::with_capacity(state.registry.len());

    for entry in state.registry.entries() {
        let full_name = state.config.full_name(&entry.config)?;
        let token = state.config.token_for(&entry.config);

        let hook = state
            .platform
            .create_webhook(
                token,
                &full_name,
                &CreateWebhook {
                    url: url.to_string(),
                    secret: state.config.webhook_secret().to_string(),
                    events: state.config.webhook.events.clone(),
                },
            )
            .await?;

        tracing::info!(
            repo = %full_name,
            hook_id = hook.id,
            active = hook.active,
            "Registered webhook"
        );
        created.push((full_name, hook));
    }

    Ok(created)
}

/// Build a delivery inspector for `repo`, using its configured token when
/// it is a known repo.
pub fn inspector(state: &AppState, repo: &str, hook_id: u64) -> DeliveryInspector {
    let token = repo_token(state, repo);
    DeliveryInspector::new(
        Arc::clone(&state.platform),
        token.map(str::to_string),
        repo,
        hook_id,
    )
}

pub async fn list_deliveries(
    state: &AppState,
    repo: &str,
    hook_id: u64,
) -> Result<Vec<DeliverySummary>> {
    let token = repo_token(state, repo);
    state.platform.list_deliveries(token, repo, hook_id).await
}

fn repo_token<'a>(state: &'a AppState, repo: &str) -> Option<&'a str> {
    match state.registry.get(repo) {
        Some(entry) => state.config.token_for(&entry.config),
        None => state.config.github.token.as_deref(),
    }
}

/// Snapshot the delivery log, then wait for the next `event` delivery and
/// return the response the endpoint gave it.
pub async fn wait_for_response(
    state: &AppState,
    repo: &str,
    hook_id: u64,
    event: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<DeliveryResponse> {
    let inspector = inspector(state, repo, hook_id);
    let known = inspector.known_ids().await?;
    tracing::info!(
        repo = repo,
        hook_id = hook_id,
        known = known.len(),
        event = event,
        "Waiting for webhook delivery"
    );
    inspector
        .wait_for_response(event, &known, timeout, interval)
        .await
}
