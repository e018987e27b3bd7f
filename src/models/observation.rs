use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::aggregation::dates::parse_timestamp;
use crate::error::AggregationError;

/// One timestamped data point with an already-validated date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            timestamp,
            value,
            group_key: None,
        }
    }

    pub fn with_group(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }
}

/// A data point whose date cell has not been parsed yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub date: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
}

impl RawObservation {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
            group_key: None,
        }
    }

    pub fn with_group(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }

    /// Validate the date cell; `row` is reported back in the error
    pub fn parse(&self, row: usize) -> Result<Observation, AggregationError> {
        let timestamp =
            parse_timestamp(&self.date).ok_or_else(|| AggregationError::MalformedObservation {
                row,
                raw: self.date.clone(),
            })?;
        Ok(Observation {
            timestamp,
            value: self.value,
            group_key: self.group_key.clone(),
        })
    }
}
