//! Calendar granularities and their bucket identities

use crate::error::AggregationError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity used to group observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Period {
    pub fn all() -> [Period; 5] {
        [
            Period::Daily,
            Period::Weekly,
            Period::Monthly,
            Period::Quarterly,
            Period::Yearly,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Quarterly => "quarterly",
            Period::Yearly => "yearly",
        }
    }

    /// Resolve a calendar day to the bucket it falls into
    pub fn bucket_of(&self, date: NaiveDate) -> BucketId {
        match self {
            Period::Daily => BucketId::Day(date),
            Period::Weekly => {
                // ISO 8601: weeks start on Monday and week 1 holds the first Thursday,
                // so late-December days can belong to week 1 of the next ISO year.
                let iso = date.iso_week();
                BucketId::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
            Period::Monthly => BucketId::Month {
                year: date.year(),
                month: date.month(),
            },
            Period::Quarterly => BucketId::Quarter {
                year: date.year(),
                quarter: date.month0() / 3 + 1,
            },
            Period::Yearly => BucketId::Year(date.year()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Period::Daily),
            "weekly" | "week" => Ok(Period::Weekly),
            "monthly" | "month" => Ok(Period::Monthly),
            "quarterly" | "quarter" => Ok(Period::Quarterly),
            "yearly" | "year" | "annual" => Ok(Period::Yearly),
            _ => Err(AggregationError::UnsupportedPeriod(s.to_string())),
        }
    }
}

/// Identity of one bucket within a single aggregation run.
///
/// Every variant embeds the year, and the derived ordering compares the year
/// first, so sorting bucket ids sorts them chronologically. A run only ever
/// produces ids of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketId {
    Day(NaiveDate),
    /// `year` is the ISO week-year, which differs from the calendar year
    /// around the new year
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year(i32),
}

impl BucketId {
    /// First calendar day covered by the bucket
    pub fn start(&self) -> NaiveDate {
        let start = match *self {
            BucketId::Day(date) => Some(date),
            BucketId::Week { year, week } => NaiveDate::from_isoywd_opt(year, week, Weekday::Mon),
            BucketId::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
            BucketId::Quarter { year, quarter } => {
                NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
            }
            BucketId::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
        };
        // Ids are only built by `Period::bucket_of`, whose components are always in range.
        start.unwrap_or(NaiveDate::MIN)
    }

    /// Chart label: short and readable, year kept where months or quarters repeat
    pub fn label(&self) -> String {
        match *self {
            BucketId::Day(date) => date.format("%Y-%m-%d").to_string(),
            BucketId::Week { week, .. } => format!("W{}", week),
            BucketId::Month { .. } => self.start().format("%b '%y").to_string(),
            BucketId::Quarter { year, quarter } => {
                format!("Q{} '{:02}", quarter, year.rem_euclid(100))
            }
            BucketId::Year(year) => year.to_string(),
        }
    }

    /// Canonical key, unique across years, used on the wire
    pub fn key(&self) -> String {
        match *self {
            BucketId::Day(date) => date.format("%Y-%m-%d").to_string(),
            BucketId::Week { year, week } => format!("{}-W{:02}", year, week),
            BucketId::Month { year, month } => format!("{}-{:02}", year, month),
            BucketId::Quarter { year, quarter } => format!("{}-Q{}", year, quarter),
            BucketId::Year(year) => year.to_string(),
        }
    }
}
