//! Nødvarsel monitor binary entrypoint.
//! Validates the feed, starts the poll coordinator and serves the sensor API.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nodvarsel_monitor::api::{self, AppState};
use nodvarsel_monitor::config::AppConfig;
use nodvarsel_monitor::coordinator::Coordinator;
use nodvarsel_monitor::feed::fetcher::{FeedClient, RSS_URL};
use nodvarsel_monitor::metrics::Metrics;
use nodvarsel_monitor::setup;

/// Compact logs by default; `LOG_FORMAT=json` for structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("ctrl-c handler: {e:#}");
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default().context("loading configuration")?;
    let metrics = Metrics::init()?;

    if let Err(e) = setup::validate_connection(RSS_URL).await {
        error!(reason = e.key(), error = %e, "setup validation failed");
        return Err(e.into());
    }
    let client = FeedClient::new().context("building feed client")?;

    let coordinator = Coordinator::new(Arc::new(client), cfg.scan_interval)?;
    if let Err(e) = coordinator.first_refresh().await {
        warn!(error = %e, "first refresh failed; retrying on schedule");
    }
    let poller = coordinator.spawn();
    info!(
        scan_interval = cfg.scan_interval,
        entry_id = %cfg.entry_id,
        "Nødvarsel started"
    );

    let app = api::router(AppState::new(coordinator, &cfg.entry_id)).merge(metrics.router());
    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    info!(addr = %cfg.bind_addr, "serving sensor API");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    poller.abort();
    Ok(())
}
