//! Period aggregation: bucket timestamped values by calendar period.

pub mod aggregator;
pub mod dates;
pub mod period;

pub use aggregator::*;
pub use period::*;
