//! Supply-chain analytics backend: CSV snapshots, period aggregation,
//! REST endpoints and WebSocket feeds.

pub mod aggregation;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod reports;
pub mod services;
