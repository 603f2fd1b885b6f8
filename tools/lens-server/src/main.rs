//! PriceLens API server.
//!
//! Routes:
//! - `POST /api/google-lens` - visual matches for `{ "imageUrl": ... }`
//! - `GET /api/health` - liveness check
//!
//! The provider API key stays on the server; clients only ever talk to
//! these routes.

mod config;
mod routes;
mod upstream;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lens_observability::{init_logging, LogConfig, LogFormat, LogLevel};

use config::ServerConfig;
use routes::AppState;
use upstream::SerpLensUpstream;

/// PriceLens API server - same-origin proxy for visual product search
#[derive(Parser)]
#[command(name = "lens-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format: human or json
    #[arg(long, default_value = "human")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    init_logging(&LogConfig::new(level, cli.log_format)).context("Failed to initialize logging")?;

    let mut config = match cli.config.as_deref() {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    }
    .apply_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    if config.api_key.trim().is_empty() {
        tracing::warn!("no provider API key configured; every visual match request will fail");
    }

    let state = AppState {
        upstream: Arc::new(SerpLensUpstream::new(&config)),
    };
    let app = routes::router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
