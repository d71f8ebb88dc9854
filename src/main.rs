use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hookfilter::commands;
use hookfilter::config::AppConfig;
use hookfilter::server::{create_router, AppState};
use hookfilter::shutdown::wait_for_shutdown;

#[derive(Parser)]
#[command(name = "hookfilter", about = "Signature-checking, rule-filtering GitHub webhook endpoint")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook endpoint (default)
    Serve,
    /// Evaluate a payload file against a repo's filter groups
    Evaluate {
        #[arg(long)]
        repo: String,
        #[arg(long)]
        event: String,
        #[arg(long)]
        payload: PathBuf,
    },
    /// Create a webhook on every configured repo pointing at URL
    Register {
        #[arg(long)]
        url: String,
    },
    /// List a webhook's deliveries, or wait for the next one of an event
    Deliveries {
        /// Repository as owner/repo
        #[arg(long)]
        repo: String,
        #[arg(long)]
        hook_id: u64,
        /// Wait for a new delivery of this event and print its response
        #[arg(long)]
        wait_event: Option<String>,
        /// Seconds to wait before giving up
        #[arg(long, default_value_t = 300)]
        timeout: u64,
        /// Seconds between polls
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    let state = Arc::new(AppState::new(config.clone())?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, state).await?,
        Command::Evaluate {
            repo,
            event,
            payload,
        } => {
            let response = commands::evaluate(&state, &repo, &event, &payload).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Register { url } => {
            for (repo, hook) in commands::register(&state, &url).await? {
                println!("{repo}\t{}", hook.id);
            }
        }
        Command::Deliveries {
            repo,
            hook_id,
            wait_event: Some(event),
            timeout,
            interval,
        } => {
            let response = commands::wait_for_response(
                &state,
                &repo,
                hook_id,
                &event,
                Duration::from_secs(timeout),
                Duration::from_secs(interval),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Deliveries { repo, hook_id, .. } => {
            for d in commands::list_deliveries(&state, &repo, hook_id).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    d.id,
                    d.delivered_at.to_rfc3339(),
                    d.event,
                    d.status_code
                );
            }
        }
    }

    Ok(())
}

async fn serve(config: AppConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        repos = state.registry.len(),
        "Starting hookfilter server"
    );

    if state.registry.is_empty() {
        tracing::warn!("No repos configured; every delivery will be rejected");
    }

    let app = create_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    ))
    .await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    state
        .forwarder
        .drain(Duration::from_secs(config.forward.timeout_secs))
        .await;

    tracing::info!("Shutdown complete");

    Ok(())
}
