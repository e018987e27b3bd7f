//! WebSocket endpoints: day-by-day scheduling stream and the risk alert feed

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use chrono::{NaiveDate, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::core::http::AppState;
use crate::reports::{risk_alerts, ScheduleTimeline};

const DEFAULT_INTERVAL_SECONDS: u64 = 1;
const DATE_HINT: &str = "Use format YYYY-MM-DD for start and end";

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    /// Seconds between payloads; 0 sends them back to back
    pub interval: Option<u64>,
}

impl DateRangeQuery {
    fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::parse_from_str(self.start.as_deref()?.trim(), "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(self.end.as_deref()?.trim(), "%Y-%m-%d").ok()?;
        Some((start, end))
    }
}

pub async fn scheduling_feed(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Response {
    ws.on_upgrade(move |socket| stream_schedule(socket, state, query))
}

async fn send_json(socket: &mut WebSocket, value: &impl serde::Serialize) -> bool {
    match serde_json::to_string(value) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize payload");
            false
        }
    }
}

async fn stream_schedule(mut socket: WebSocket, state: AppState, query: DateRangeQuery) {
    let Some((start, end)) = query.range() else {
        send_json(&mut socket, &json!({ "error": "invalid_date", "hint": DATE_HINT })).await;
        let _ = socket.send(Message::Close(None)).await;
        return;
    };

    let timeline = match ScheduleTimeline::build(&state.store.current(), &state.aggregator) {
        Ok(timeline) => timeline,
        Err(e) => {
            send_json(&mut socket, &json!({ "error": e.to_string() })).await;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    if timeline.skipped_rows > 0 {
        debug!(skipped = timeline.skipped_rows, "forecast rows left out of the scheduling stream");
    }

    let interval = Duration::from_secs(query.interval.unwrap_or(DEFAULT_INTERVAL_SECONDS));
    info!(%start, %end, "Scheduling stream opened for {} to {}", start, end);

    let mut day = start;
    while day <= end {
        if !send_json(&mut socket, &timeline.payload_for(day)).await {
            debug!(%day, "Scheduling stream client went away");
            return;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
        if !interval.is_zero() && day <= end {
            tokio::time::sleep(interval).await;
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}

pub async fn risk_feed(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| forward_risk_alerts(socket, state))
}

/// Send the alerts that hold right now, then relay everything the feed publishes
async fn forward_risk_alerts(socket: WebSocket, state: AppState) {
    let mut alerts_rx = state.risk_feed.subscribe();
    state.metrics.feed_subscribers.inc();
    let (mut sender, mut receiver) = socket.split();

    let dataset = state.store.current();
    for alert in risk_alerts(&dataset, Utc::now()) {
        let Ok(text) = serde_json::to_string(&alert) else {
            continue;
        };
        if sender.send(Message::Text(text.into())).await.is_err() {
            state.metrics.feed_subscribers.dec();
            return;
        }
    }
    drop(dataset);

    loop {
        tokio::select! {
            published = alerts_rx.recv() => match published {
                Ok(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!(missed, "Risk feed subscriber lagged, skipping {} alerts", missed);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.metrics.feed_subscribers.dec();
    debug!("Risk feed subscriber disconnected");
}
