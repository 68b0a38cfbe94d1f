//! cropai-ui - Crop disease detection web service
//!
//! Serves the browser UI, owns one view-state orchestrator per browser
//! session and talks to the hosted backend for prediction, persistence and
//! authentication.
//!
//! Default port: 5780 (loopback only)

use anyhow::Result;
use clap::Parser;
use cropai_common::config::{self, CliOverrides};
use cropai_common::events::EventBus;
use cropai_ui::services::{GoTrueAuthClient, HttpPredictionClient, RestPersistenceClient};
use cropai_ui::session::SessionLimits;
use cropai_ui::{build_router, AppState, EVENT_BUS_CAPACITY};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "cropai-ui")]
#[command(about = "Crop disease detection web service")]
#[command(version)]
struct Args {
    /// Path to config file (default: ~/.config/cropai/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Public access key for the backend
    #[arg(long)]
    anon_key: Option<String>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// HTTP bind address
    #[arg(long)]
    bind: Option<String>,
}

/// EnvFilter directive for a configured level
///
/// A bare level applies to this workspace's crates and the HTTP trace
/// layer; anything containing `=` or `,` is used verbatim.
fn log_directive(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!(
            "cropai_ui={0},cropai_common={0},tower_http={0}",
            level.trim()
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = config::load_toml_config(args.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_directive(&toml_config.logging.level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cropai-ui v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOverrides {
        api_url: args.api_url,
        anon_key: args.anon_key,
        port: args.port,
        bind_address: args.bind,
    };
    let service_config = match config::resolve_service_config(&cli, &toml_config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let backend = &service_config.backend;
    info!("Backend: {}", backend.api_url);
    info!("Prediction endpoint: {}", backend.prediction_url());

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("cropai-ui/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let state = AppState::new(
        Arc::new(HttpPredictionClient::new(http_client.clone(), backend)),
        Arc::new(RestPersistenceClient::new(http_client.clone(), backend)),
        Arc::new(GoTrueAuthClient::new(http_client, backend)),
        event_bus,
        SessionLimits::from(service_config.sessions),
    );
    let limits = state.sessions.limits();
    info!(
        "Sessions: idle timeout {}s, limit {}",
        limits.idle_timeout.as_secs(),
        limits.max_sessions
    );
    let _sweeper = state.sessions.spawn_sweeper();
    let app = build_router(state);

    let addr = format!("{}:{}", service_config.bind_address, service_config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("cropai-ui stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
