//! Cron-based scheduler that periodically reloads the dataset snapshot

use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::data::{DatasetSource, SnapshotStore};
use crate::error::ConfigError;

/// Reloads the dataset from its source on a fixed cadence and swaps it into the store
pub struct SnapshotRefresher {
    store: Arc<SnapshotStore>,
    source: Arc<dyn DatasetSource>,
    schedule: Schedule,
    cron_expr: String,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

/// Cron expression firing every `interval_seconds`
///
/// The interval must divide its unit evenly (a minute, an hour or a day),
/// otherwise the schedule would restart at every unit boundary and fire
/// with uneven gaps. A full day fires at midnight UTC.
///
/// Cron format: second minute hour day month weekday
pub fn cron_expression(interval_seconds: u64) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: "SNAPSHOT_REFRESH_SECONDS",
        value: interval_seconds.to_string(),
        reason: reason.to_string(),
    };

    match interval_seconds {
        0 => Err(invalid("scheduled refresh is disabled")),
        s if s < 60 && 60 % s == 0 => Ok(format!("*/{} * * * * *", s)),
        s if s < 3600 && s % 60 == 0 && 60 % (s / 60) == 0 => Ok(format!("0 */{} * * * *", s / 60)),
        s if s < 86_400 && s % 3600 == 0 && 24 % (s / 3600) == 0 => {
            Ok(format!("0 0 */{} * * *", s / 3600))
        }
        86_400 => Ok("0 0 0 * * *".to_string()),
        _ => Err(invalid(
            "interval must divide a minute, an hour or a day evenly (e.g. 15, 300, 7200, 86400)",
        )),
    }
}

impl SnapshotRefresher {
    /// Create a new refresher
    ///
    /// # Arguments
    /// * `store` - Snapshot store that receives each reload
    /// * `source` - Where datasets are loaded from
    /// * `interval_seconds` - Refresh interval in seconds (0 = disabled)
    pub fn new(
        store: Arc<SnapshotStore>,
        source: Arc<dyn DatasetSource>,
        interval_seconds: u64,
    ) -> Result<Self, ConfigError> {
        let cron_expr = cron_expression(interval_seconds)?;
        let schedule = Schedule::from_str(&cron_expr).map_err(|e| ConfigError::InvalidValue {
            key: "SNAPSHOT_REFRESH_SECONDS",
            value: interval_seconds.to_string(),
            reason: format!("invalid cron expression '{}': {}", cron_expr, e),
        })?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            source = %source.describe(),
            "SnapshotRefresher: created with interval {}s (cron: {})",
            interval_seconds,
            cron_expr
        );

        Ok(Self {
            store,
            source,
            schedule,
            cron_expr,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub fn cron_expr(&self) -> &str {
        &self.cron_expr
    }

    /// Start the refresh loop
    pub async fn start(&self) {
        let store = self.store.clone();
        let source = self.source.clone();
        let schedule = self.schedule.clone();

        let handle = tokio::spawn(async move {
            info!("SnapshotRefresher: started, waiting for cron schedule...");

            loop {
                let mut upcoming = schedule.upcoming(chrono::Utc);
                if let Some(next_tick) = upcoming.next() {
                    let now = chrono::Utc::now();
                    if next_tick > now {
                        let duration = (next_tick - now).to_std().unwrap_or_default();
                        tokio::time::sleep(duration).await;
                    }
                } else {
                    tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                    continue;
                }

                // A failed reload leaves the previous snapshot in place
                match store.refresh(source.as_ref()).await {
                    Ok(dataset) => {
                        info!(
                            rows = dataset.row_count(),
                            "SnapshotRefresher: cron tick, snapshot reloaded"
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "SnapshotRefresher: reload failed");
                    }
                }
            }
        });

        let mut h = self.handle.write().await;
        if let Some(previous) = h.replace(handle) {
            previous.abort();
        }
        info!("SnapshotRefresher: started successfully");
    }

    /// Stop the refresher
    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("SnapshotRefresher: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.is_some()
    }
}
