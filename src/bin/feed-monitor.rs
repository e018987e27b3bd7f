//! SCM Pulse Feed Monitor
//!
//! Subscribes to the risk alert feed of a running API server and logs every
//! alert it receives, reconnecting when the server goes away.

use dotenvy::dotenv;
use scm_pulse::config::Config;
use scm_pulse::logging;
use scm_pulse::services::{FeedClient, FeedEvent};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    // Initialize logging based on environment
    logging::init_logging();

    let config = Config::from_env()?;
    info!("Starting SCM Pulse Feed Monitor");
    info!(environment = %config.environment, "Environment");

    let client = FeedClient::new(&config.feed_url)?;
    info!(url = %client.url(), "Subscribing to risk feed");
    let (handle, mut events) = client.spawn();

    let monitor = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                FeedEvent::Connected => info!("Feed connected"),
                FeedEvent::Message(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(alert) => info!(
                        severity = %alert["Severity"],
                        headline = %alert["Headline"],
                        "Risk alert received"
                    ),
                    Err(_) => warn!(payload = %text, "Unrecognized feed payload"),
                },
                FeedEvent::Disconnected => warn!("Feed disconnected"),
                FeedEvent::Error(e) => {
                    error!(error = %e, "Feed reconnection gave up");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down feed monitor...");
            handle.abort();
        }
        _ = monitor => {
            error!("Feed monitor stopped");
        }
    }

    Ok(())
}
