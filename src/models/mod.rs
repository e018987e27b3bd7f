//! Shared data models spanning the data, aggregation and API layers.

pub mod aggregate;
pub mod observation;
pub mod records;

pub use aggregate::{AggregateResult, ForecastPeriodSummary, PeriodAggregate};
pub use observation::{Observation, RawObservation};
pub use records::{
    AlertRecord, ForecastRecord, Product, SalesRecord, ScheduleRecord, StockRecord,
};
