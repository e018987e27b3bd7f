//! Error types shared across the crate

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while bucketing observations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregationError {
    /// A row whose date could not be resolved to a calendar day
    #[error("malformed observation at row {row}: unparseable date '{raw}'")]
    MalformedObservation { row: usize, raw: String },

    /// Caller asked for a granularity the aggregator does not implement
    #[error("unsupported period '{0}' (expected daily, weekly, monthly, quarterly or yearly)")]
    UnsupportedPeriod(String),
}

/// Failures raised while loading the CSV dataset
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{path}' is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("dataset load task failed: {0}")]
    Task(String),
}

/// Invalid environment configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
