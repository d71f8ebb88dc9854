use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use crate::error::{AppError, ClientError, Result};
use crate::filter::ConditionType;
use crate::forward::ForwardRequest;
use crate::registry::RepoEntry;
use crate::server::AppState;
use crate::webhook::events::WebhookEvent;
use crate::webhook::response::DeliveryResponse;
use crate::webhook::signature::verify_signature;

pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> DeliveryResponse {
    let delivery_id = header(&headers, "x-github-delivery").unwrap_or("-").to_string();

    match process_delivery(&state, &headers, body).await {
        Ok(()) => DeliveryResponse::accepted(),
        Err(AppError::Client(e)) => {
            tracing::warn!(delivery = %delivery_id, reason = %e, "Rejected webhook delivery");
            e.into()
        }
        Err(e) => {
            tracing::error!(delivery = %delivery_id, error = %e, "Failed to process webhook delivery");
            DeliveryResponse::server_error(e.to_string())
        }
    }
}

async fn process_delivery(state: &AppState, headers: &HeaderMap, body: Bytes) -> Result<()> {
    let signature = header(headers, "x-hub-signature-256");
    verify_signature(state.config.webhook_secret(), &body, signature)?;

    let event_type = header(headers, "x-github-event").ok_or(ClientError::MissingEvent)?;

    let event = WebhookEvent::parse(event_type, &body).map_err(|e| {
        tracing::debug!(error = %e, event_type = %event_type, "Failed to parse webhook event");
        ClientError::InvalidPayload
    })?;

    let entry = event
        .repository()
        .and_then(|repo| state.registry.lookup(repo))
        .ok_or(ClientError::UnknownRepository)?;

    tracing::info!(
        event_type = %event_type,
        repo = %entry.config.name,
        sender = event.sender().map(|s| s.login.as_str()).unwrap_or("-"),
        "Received webhook event"
    );

    let Some(group) = evaluate_event(state, entry, &event).await? else {
        return Err(ClientError::FilterUnmatched.into());
    };

    tracing::info!(
        event_type = %event_type,
        repo = %entry.config.name,
        group = group,
        "Payload matched filter group"
    );

    if let Some(url) = state.forwarder.target(&entry.config) {
        state.forwarder.spawn(ForwardRequest {
            url: url.to_string(),
            event: event_type.to_string(),
            delivery_id: header(headers, "x-github-delivery").map(str::to_string),
            signature: signature.map(str::to_string),
            body,
        });
    }

    Ok(())
}

/// Evaluate a parsed event against a repo's filter groups, returning the
/// index of the first matching group.
///
/// Pull request file paths are fetched from GitHub only when a group that
/// filters on them can still match on its other conditions.
pub async fn evaluate_event(
    state: &AppState,
    entry: &RepoEntry,
    event: &WebhookEvent,
) -> Result<Option<usize>> {
    let mut mapping = event.mapping();

    if let Some(pr_number) = event.pull_request_number() {
        if entry.filters.needs(ConditionType::FilePath, &mapping) {
            let repo_full_name = match event.repository() {
                Some(repo) => repo.full_name.clone(),
                None => state.config.full_name(&entry.config)?,
            };
            let token = state.config.token_for(&entry.config);
            let files = state
                .platform
                .pull_request_files(token, &repo_full_name, pr_number)
                .await?;
            mapping.file_paths = Some(files);
        }
    }

    tracing::debug!(mapping = ?mapping, "Mapped webhook payload");

    Ok(entry.filters.matching_group(&mapping))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
