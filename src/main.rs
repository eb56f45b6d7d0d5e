mod api;
mod config;
mod db;
mod error;
mod models;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;

/// HTTP service for portfolio projects.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Listen address, overrides BIND_ADDR
    #[arg(long)]
    bind: Option<String>,

    /// Do not create the projects table on startup
    #[arg(long)]
    skip_schema: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init()?;
    init_tracing();

    // Initialize database connection
    let db = db::init(&config).await?;
    if !cli.skip_schema {
        db.ensure_schema().await?;
    }

    let cors = api::cors_layer(&config.cors_origins).context("invalid CORS_ORIGINS")?;
    let state = AppState::new(Arc::new(db.clone()), config.max_list_limit);
    let app = api::router(state, cors);

    let bind = cli.bind.unwrap_or(config.bind_addr);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(address = %bind, "listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    db.close().await;
    tracing::info!("shut down");

    Ok(result?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
