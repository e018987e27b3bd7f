//! Dashboard reports computed from a dataset snapshot.

pub mod inventory;
pub mod risk;
pub mod sales;
pub mod schedule;

pub use inventory::*;
pub use risk::*;
pub use sales::*;
pub use schedule::*;

/// Round to two decimals, the precision every KPI tile shows
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
