use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::Period;

/// One finalized bucket, ready to be drawn as a chart point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAggregate {
    /// Display label (`Jan '24`, `W3`, `Q2 '23`, ...)
    pub period: String,
    /// Canonical, year-qualified key (`2024-01`, `2024-W03`, ...)
    pub key: String,
    pub period_start: NaiveDate,
    pub total: f64,
    pub average: f64,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<BTreeMap<String, f64>>,
}

/// Output of one aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub period: Period,
    pub buckets: Vec<PeriodAggregate>,
    /// Rows left out because of a malformed date (or a missing value under
    /// the drop policy)
    pub skipped_rows: usize,
}

impl AggregateResult {
    pub fn empty(period: Period) -> Self {
        Self {
            period,
            buckets: Vec::new(),
            skipped_rows: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn total_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn total_sum(&self) -> f64 {
        self.buckets.iter().map(|b| b.total).sum()
    }

    /// Keep every `every`-th bucket, starting with the first.
    ///
    /// Only ever applied to finished buckets; thinning raw rows before
    /// bucketing would corrupt the sums. `every` of 0 or 1 is a no-op.
    pub fn decimate(mut self, every: usize) -> Self {
        if every > 1 {
            self.buckets = self
                .buckets
                .into_iter()
                .enumerate()
                .filter(|(index, _)| index % every == 0)
                .map(|(_, bucket)| bucket)
                .collect();
        }
        self
    }
}

/// Legacy wire shape of `/api/forecasts/{period}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriodSummary {
    pub period: String,
    pub total_demand: f64,
    pub average_demand: f64,
}

impl From<&PeriodAggregate> for ForecastPeriodSummary {
    fn from(bucket: &PeriodAggregate) -> Self {
        Self {
            period: bucket.key.clone(),
            total_demand: bucket.total,
            average_demand: bucket.average,
        }
    }
}
