//! Risk alert feed pushed to WebSocket subscribers
//!
//! A background task recomputes the alerts from the current snapshot on a
//! fixed interval and broadcasts each one. Delivery is best effort: a
//! subscriber that falls behind skips what it missed and picks up from the
//! next message, and the same alert is re-sent on every tick while it holds.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::data::SnapshotStore;
use crate::reports::risk_alerts;

const CHANNEL_CAPACITY: usize = 256;

pub struct RiskFeed {
    store: Arc<SnapshotStore>,
    sender: broadcast::Sender<String>,
    interval: Duration,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl RiskFeed {
    pub fn new(store: Arc<SnapshotStore>, interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            store,
            sender,
            interval,
            handle: Arc::new(RwLock::new(None)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Compute the alerts for the current snapshot and broadcast them.
    ///
    /// Returns how many alerts were published; 0 when nobody is listening.
    pub fn publish_once(&self) -> usize {
        publish(&self.store, &self.sender)
    }

    /// Start publishing on the configured interval
    pub async fn start(&self) {
        let store = self.store.clone();
        let sender = self.sender.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let sent = publish(&store, &sender);
                debug!(alerts = sent, "RiskFeed: tick published {} alerts", sent);
            }
        });

        let mut h = self.handle.write().await;
        if let Some(previous) = h.replace(handle) {
            previous.abort();
        }
        info!(interval_secs = self.interval.as_secs(), "RiskFeed: started");
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("RiskFeed: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.is_some()
    }
}

fn publish(store: &SnapshotStore, sender: &broadcast::Sender<String>) -> usize {
    if sender.receiver_count() == 0 {
        return 0;
    }

    let dataset = store.current();
    let mut sent = 0;
    for alert in risk_alerts(&dataset, Utc::now()) {
        match serde_json::to_string(&alert) {
            Ok(json) => {
                if sender.send(json).is_ok() {
                    sent += 1;
                }
            }
            Err(e) => warn!(error = %e, "RiskFeed: failed to serialize alert"),
        }
    }
    sent
}
