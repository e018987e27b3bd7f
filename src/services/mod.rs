//! Long-running services: feed publishers and subscribers.

pub mod feed_client;
pub mod feeds;

pub use feed_client::{FeedClient, FeedEvent, ReconnectPolicy};
pub use feeds::RiskFeed;
