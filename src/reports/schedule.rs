//! Day-by-day scheduling view streamed by the scheduling feed

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::aggregation::dates::parse_date;
use crate::aggregation::{Aggregator, Period};
use crate::data::Dataset;
use crate::error::AggregationError;
use crate::models::observation::RawObservation;
use crate::models::records::ScheduleRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySchedulePayload {
    pub date: NaiveDate,
    /// Forecasted demand for the day, per product
    pub forecasted_demand: BTreeMap<String, f64>,
    pub production_schedule: Vec<ScheduleRecord>,
    pub total_qty_scheduled: i64,
    pub ts: DateTime<Utc>,
}

/// One line of the production schedule table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Units")]
    pub units: i64,
}

/// Schedule rows in file order, shaped for the schedule table
pub fn schedule_table(dataset: &Dataset) -> Vec<ScheduleRow> {
    dataset
        .schedule
        .iter()
        .map(|s| ScheduleRow {
            date: s.scheduled_date.clone(),
            product: s.product_name.clone(),
            units: s.scheduled_quantity,
        })
        .collect()
}

/// Forecast and schedule rows indexed by calendar day
#[derive(Debug, Clone, Default)]
pub struct ScheduleTimeline {
    demand: HashMap<NaiveDate, BTreeMap<String, f64>>,
    schedule: HashMap<NaiveDate, Vec<ScheduleRecord>>,
    /// Forecast rows whose date could not be parsed
    pub skipped_rows: usize,
}

impl ScheduleTimeline {
    pub fn build(dataset: &Dataset, aggregator: &Aggregator) -> Result<Self, AggregationError> {
        let rows: Vec<RawObservation> = dataset
            .forecasts
            .iter()
            .map(|f| f.to_observation())
            .collect();
        let daily = aggregator.aggregate_raw(&rows, Period::Daily, true)?;

        let demand = daily
            .buckets
            .into_iter()
            .map(|b| (b.period_start, b.series.unwrap_or_default()))
            .collect();

        let mut schedule: HashMap<NaiveDate, Vec<ScheduleRecord>> = HashMap::new();
        for record in &dataset.schedule {
            if let Some(day) = parse_date(&record.scheduled_date) {
                schedule.entry(day).or_default().push(record.clone());
            }
        }

        Ok(Self {
            demand,
            schedule,
            skipped_rows: daily.skipped_rows,
        })
    }

    pub fn payload_for(&self, date: NaiveDate) -> DailySchedulePayload {
        let production_schedule = self.schedule.get(&date).cloned().unwrap_or_default();
        let total_qty_scheduled = production_schedule.iter().map(|s| s.scheduled_quantity).sum();

        DailySchedulePayload {
            date,
            forecasted_demand: self.demand.get(&date).cloned().unwrap_or_default(),
            production_schedule,
            total_qty_scheduled,
            ts: Utc::now(),
        }
    }
}
