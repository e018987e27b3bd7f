//! SCM Pulse API Server
//!
//! Loads the CSV exports into an in-memory snapshot and serves the dashboard
//! REST endpoints, the scheduling stream and the risk alert feed.

use dotenvy::dotenv;
use scm_pulse::aggregation::Aggregator;
use scm_pulse::config::Config;
use scm_pulse::core::http::{start_server, AppState, HealthStatus};
use scm_pulse::core::scheduler::SnapshotRefresher;
use scm_pulse::data::{CsvDirectorySource, DatasetSource, SnapshotStore};
use scm_pulse::logging;
use scm_pulse::metrics::Metrics;
use scm_pulse::services::RiskFeed;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    // Initialize logging based on environment
    logging::init_logging();

    let config = Config::from_env()?;
    info!("Starting SCM Pulse API Server");
    info!(environment = %config.environment, "Environment");
    info!(data_dir = %config.data_dir.display(), "Data directory");
    info!(aggregator = %config.aggregator, "Aggregator options");

    let metrics = Arc::new(Metrics::new()?);
    let store = Arc::new(SnapshotStore::empty().with_metrics(metrics.clone()));
    let source: Arc<dyn DatasetSource> = Arc::new(CsvDirectorySource::new(config.data_dir.clone()));

    // Serve an empty snapshot rather than refusing to start
    if let Err(e) = store.refresh(source.as_ref()).await {
        warn!(error = %e, "Initial dataset load failed, serving empty snapshot");
    }

    let risk_feed = Arc::new(RiskFeed::new(
        store.clone(),
        Duration::from_secs(config.risk_feed_interval_seconds),
    ));
    risk_feed.start().await;

    let refresher = if config.snapshot_refresh_seconds > 0 {
        let refresher = SnapshotRefresher::new(
            store.clone(),
            source.clone(),
            config.snapshot_refresh_seconds,
        )?;
        refresher.start().await;
        Some(refresher)
    } else {
        info!("Scheduled snapshot refresh disabled (SNAPSHOT_REFRESH_SECONDS=0)");
        None
    };

    let state = AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics,
        start_time: Arc::new(Instant::now()),
        store,
        source: Some(source),
        aggregator: Aggregator::new(config.aggregator),
        risk_feed: risk_feed.clone(),
    };

    let port = config.port;
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(state, port).await {
            error!(error = %e, "HTTP server error");
        }
    });

    // Graceful shutdown
    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    risk_feed.stop().await;
    if let Some(refresher) = refresher {
        refresher.stop().await;
    }
    info!("API server stopped");

    Ok(())
}
