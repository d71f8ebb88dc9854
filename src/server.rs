use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::forward::Forwarder;
use crate::platform::github::GitHubPlatform;
use crate::platform::Platform;
use crate::registry::RepoRegistry;

pub struct AppState {
    pub config: AppConfig,
    pub registry: RepoRegistry,
    pub platform: Arc<dyn Platform>,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: AppConfig) -> crate::error::Result<Self> {
        let platform = Arc::new(GitHubPlatform::new(&config.github));
        Self::with_platform(config, platform)
    }

    pub fn with_platform(
        config: AppConfig,
        platform: Arc<dyn Platform>,
    ) -> crate::error::Result<Self> {
        let registry = RepoRegistry::build(&config)?;
        let forwarder = Forwarder::new(&config.forward)?;

        Ok(Self {
            config,
            registry,
            platform,
            forwarder,
        })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.server.max_body_bytes);

    Router::new()
        .route(
            "/webhooks/github",
            post(crate::webhook::handler::handle_webhook).layer(body_limit),
        )
        .route("/health", axum::routing::get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}
