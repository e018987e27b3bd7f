//! Single-pass fold of observations into period buckets

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::period::{BucketId, Period};
use crate::error::AggregationError;
use crate::models::aggregate::{AggregateResult, PeriodAggregate};
use crate::models::observation::{Observation, RawObservation};

/// Group key used for observations that carry none when splitting by group
pub const UNGROUPED_KEY: &str = "(ungrouped)";

/// What to do with a row whose date cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Leave the row out and count it in `skipped_rows`
    #[default]
    Skip,
    /// Fail the whole run with `MalformedObservation`
    Abort,
}

impl FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MalformedPolicy::Skip),
            "abort" => Ok(MalformedPolicy::Abort),
            other => Err(format!("expected 'skip' or 'abort', got '{}'", other)),
        }
    }
}

/// What to do with a NaN or infinite value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingValuePolicy {
    /// Contribute 0 to the sum but still count the row
    #[default]
    CountAsZero,
    /// Leave the row out and count it in `skipped_rows`
    DropRow,
}

impl FromStr for MissingValuePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "count" | "count_as_zero" => Ok(MissingValuePolicy::CountAsZero),
            "drop" | "drop_row" => Ok(MissingValuePolicy::DropRow),
            other => Err(format!("expected 'zero' or 'drop', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregatorOptions {
    pub malformed: MalformedPolicy,
    pub missing_value: MissingValuePolicy,
}

/// Stateless period aggregator; every call returns a fresh result
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    options: AggregatorOptions,
}

impl Aggregator {
    pub fn new(options: AggregatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> AggregatorOptions {
        self.options
    }

    /// Bucket observations whose dates are already valid
    pub fn aggregate(
        &self,
        observations: &[Observation],
        period: Period,
        group_by: bool,
    ) -> AggregateResult {
        let mut acc = Accumulator::new(period, group_by, self.options.missing_value);
        for observation in observations {
            acc.push(observation);
        }
        acc.finish()
    }

    /// Parse date cells and bucket the rows, applying the malformed-row policy
    pub fn aggregate_raw(
        &self,
        rows: &[RawObservation],
        period: Period,
        group_by: bool,
    ) -> Result<AggregateResult, AggregationError> {
        let mut acc = Accumulator::new(period, group_by, self.options.missing_value);
        for (row, raw) in rows.iter().enumerate() {
            match raw.parse(row) {
                Ok(observation) => acc.push(&observation),
                Err(e) => match self.options.malformed {
                    MalformedPolicy::Skip => {
                        debug!(row = row, date = %raw.date, "skipping observation with malformed date");
                        acc.skipped += 1;
                    }
                    MalformedPolicy::Abort => return Err(e),
                },
            }
        }
        Ok(acc.finish())
    }
}

impl fmt::Display for AggregatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed={:?} missing_value={:?}", self.malformed, self.missing_value)
    }
}

struct Bucket {
    sum: f64,
    count: usize,
    group_sums: Option<BTreeMap<String, f64>>,
}

struct Accumulator {
    period: Period,
    group_by: bool,
    missing_value: MissingValuePolicy,
    buckets: BTreeMap<BucketId, Bucket>,
    skipped: usize,
}

impl Accumulator {
    fn new(period: Period, group_by: bool, missing_value: MissingValuePolicy) -> Self {
        Self {
            period,
            group_by,
            missing_value,
            buckets: BTreeMap::new(),
            skipped: 0,
        }
    }

    fn push(&mut self, observation: &Observation) {
        let value = if observation.value.is_finite() {
            observation.value
        } else {
            match self.missing_value {
                MissingValuePolicy::CountAsZero => 0.0,
                MissingValuePolicy::DropRow => {
                    self.skipped += 1;
                    return;
                }
            }
        };

        let group_by = self.group_by;
        let id = self.period.bucket_of(observation.timestamp.date());
        let bucket = self.buckets.entry(id).or_insert_with(|| Bucket {
            sum: 0.0,
            count: 0,
            group_sums: group_by.then(BTreeMap::new),
        });

        bucket.sum += value;
        bucket.count += 1;

        if let Some(groups) = bucket.group_sums.as_mut() {
            let key = observation.group_key.as_deref().unwrap_or(UNGROUPED_KEY);
            *groups.entry(key.to_string()).or_insert(0.0) += value;
        }
    }

    fn finish(self) -> AggregateResult {
        // BTreeMap iteration follows BucketId ordering, which is chronological.
        let buckets = self
            .buckets
            .into_iter()
            .map(|(id, bucket)| PeriodAggregate {
                period: id.label(),
                key: id.key(),
                period_start: id.start(),
                total: bucket.sum,
                average: bucket.sum / bucket.count as f64,
                count: bucket.count,
                series: bucket.group_sums,
            })
            .collect();

        AggregateResult {
            period: self.period,
            buckets,
            skipped_rows: self.skipped,
        }
    }
}
