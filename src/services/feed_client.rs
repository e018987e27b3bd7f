//! Reconnecting WebSocket client for the dashboard feeds

use backon::{ExponentialBuilder, Retryable};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

/// Something that happened on the feed connection
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connected,
    Message(String),
    Disconnected,
    /// Reconnection gave up after the configured number of attempts
    Error(String),
}

#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: usize,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl ReconnectPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts)
            .with_jitter()
    }
}

/// Feed subscriber that reconnects with exponential backoff whenever the
/// server drops the connection
pub struct FeedClient {
    url: Url,
    policy: ReconnectPolicy,
}

impl FeedClient {
    pub fn new(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(url)?,
            policy: ReconnectPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Run the connection loop in the background; events arrive on the returned channel.
    ///
    /// The task ends when reconnection gives up or the receiver is dropped.
    pub fn spawn(self) -> (tokio::task::JoinHandle<()>, mpsc::Receiver<FeedEvent>) {
        let (tx, rx) = mpsc::channel(256);
        let handle = tokio::spawn(async move {
            self.run(tx).await;
        });
        (handle, rx)
    }

    async fn run(self, events: mpsc::Sender<FeedEvent>) {
        let url = self.url.as_str().to_string();

        loop {
            let connected = (|| async { connect_async(url.as_str()).await })
                .retry(self.policy.backoff())
                .notify(|e, delay| {
                    warn!(url = %url, error = %e, delay_ms = delay.as_millis(), "FeedClient: connect failed, retrying");
                })
                .await;

            let (stream, _) = match connected {
                Ok(ok) => ok,
                Err(e) => {
                    let _ = events.send(FeedEvent::Error(e.to_string())).await;
                    return;
                }
            };

            info!(url = %url, "FeedClient: connected");
            if events.send(FeedEvent::Connected).await.is_err() {
                return;
            }

            let (_, mut read) = stream.split();
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if events.send(FeedEvent::Message(text)).await.is_err() {
                            return;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(url = %url, error = %e, "FeedClient: read error");
                        break;
                    }
                }
            }

            warn!(url = %url, "FeedClient: disconnected, reconnecting");
            if events.send(FeedEvent::Disconnected).await.is_err() {
                return;
            }
        }
    }
}
