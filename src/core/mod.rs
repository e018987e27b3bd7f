//! Core application primitives (HTTP surface, WebSocket feeds, refresh scheduler)

pub mod http;
pub mod scheduler;
pub mod ws;

pub use http::*;
pub use scheduler::*;
