//! Immutable dataset snapshots behind an atomically swapped pointer.
//!
//! Readers grab an `Arc<Dataset>` and keep using it for as long as they
//! need; a refresh builds a complete new dataset off to the side and
//! publishes it with a single pointer swap, so no reader ever observes a
//! half-loaded table.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};

use super::source::DatasetSource;
use crate::aggregation::dates::parse_timestamp;
use crate::error::DataError;
use crate::metrics::Metrics;
use crate::models::records::{
    AlertRecord, ForecastRecord, Product, SalesRecord, ScheduleRecord, StockRecord,
};

#[derive(Debug, Clone)]
pub struct Dataset {
    pub forecasts: Vec<ForecastRecord>,
    pub sales: Vec<SalesRecord>,
    pub stock: Vec<StockRecord>,
    pub alerts: Vec<AlertRecord>,
    pub schedule: Vec<ScheduleRecord>,
    /// Rows the loader could not read at all
    pub rejected_rows: usize,
    /// When a source produced this dataset; `None` for one built in place
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self {
            forecasts: Vec::new(),
            sales: Vec::new(),
            stock: Vec::new(),
            alerts: Vec::new(),
            schedule: Vec::new(),
            rejected_rows: 0,
            loaded_at: None,
        }
    }

    pub fn with_forecasts(mut self, forecasts: Vec<ForecastRecord>) -> Self {
        self.forecasts = forecasts;
        self
    }

    pub fn with_sales(mut self, sales: Vec<SalesRecord>) -> Self {
        self.sales = sales;
        self
    }

    pub fn with_stock(mut self, stock: Vec<StockRecord>) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_alerts(mut self, alerts: Vec<AlertRecord>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_schedule(mut self, schedule: Vec<ScheduleRecord>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_rejected_rows(mut self, rejected_rows: usize) -> Self {
        self.rejected_rows = rejected_rows;
        self
    }

    pub fn with_loaded_at(mut self, loaded_at: DateTime<Utc>) -> Self {
        self.loaded_at = Some(loaded_at);
        self
    }

    pub fn row_count(&self) -> usize {
        self.forecasts.len() + self.sales.len() + self.stock.len() + self.alerts.len() + self.schedule.len()
    }

    /// Forecast and sales rows the aggregator cannot bucket as written,
    /// either for an unparseable date or a missing value
    pub fn malformed_rows(&self) -> usize {
        let forecasts = self
            .forecasts
            .iter()
            .map(|f| (f.date.as_str(), f.forecasted_demand));
        let sales = self.sales.iter().map(|s| (s.order_date.as_str(), s.sales));
        forecasts
            .chain(sales)
            .filter(|(date, value)| parse_timestamp(date).is_none() || !value.is_finite())
            .count()
    }

    /// Distinct products in order of first appearance, keyed by card id
    pub fn products(&self) -> Vec<Product> {
        let mut seen = HashSet::new();
        self.forecasts
            .iter()
            .filter(|f| seen.insert(f.product_card_id.as_str()))
            .map(|f| Product {
                product_card_id: f.product_card_id.clone(),
                product_name: f.product_name.clone(),
            })
            .collect()
    }

    pub fn forecasts_matching<'a>(
        &'a self,
        filter: &'a ForecastFilter,
    ) -> impl Iterator<Item = &'a ForecastRecord> + 'a {
        self.forecasts.iter().filter(move |f| filter.matches(f))
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

/// Product filter shared by the forecast endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastFilter {
    #[serde(rename = "PRODUCT_CARD_ID")]
    pub product_card_id: Option<String>,
    #[serde(rename = "PRODUCT_NAME")]
    pub product_name: Option<String>,
}

impl ForecastFilter {
    pub fn matches(&self, record: &ForecastRecord) -> bool {
        self.product_card_id
            .as_deref()
            .map_or(true, |id| record.product_card_id == id)
            && self
                .product_name
                .as_deref()
                .map_or(true, |name| record.product_name == name)
    }
}

/// Holder of the current dataset snapshot
pub struct SnapshotStore {
    current: ArcSwap<Dataset>,
    metrics: Option<Arc<Metrics>>,
}

impl SnapshotStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            current: ArcSwap::from_pointee(dataset),
            metrics: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Dataset::new())
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        record_snapshot(&metrics, &self.current());
        self.metrics = Some(metrics);
        self
    }

    /// The snapshot readers should use right now
    pub fn current(&self) -> Arc<Dataset> {
        self.current.load_full()
    }

    /// Publish `dataset`, returning the snapshot it replaced
    pub fn replace(&self, dataset: Dataset) -> Arc<Dataset> {
        if let Some(metrics) = &self.metrics {
            metrics.snapshot_refresh_total.inc();
            record_snapshot(metrics, &dataset);
        }
        self.current.swap(Arc::new(dataset))
    }

    /// Load a fresh dataset from `source` and publish it.
    ///
    /// On failure the current snapshot stays in place.
    pub async fn refresh(&self, source: &dyn DatasetSource) -> Result<Arc<Dataset>, DataError> {
        match source.load().await {
            Ok(dataset) => {
                info!(
                    source = %source.describe(),
                    rows = dataset.row_count(),
                    "snapshot refreshed"
                );
                self.replace(dataset);
                Ok(self.current())
            }
            Err(e) => {
                error!(source = %source.describe(), error = %e, "snapshot refresh failed, keeping previous snapshot");
                Err(e)
            }
        }
    }
}

fn record_snapshot(metrics: &Metrics, dataset: &Dataset) {
    metrics.snapshot_rows.set(dataset.row_count() as f64);
    metrics.snapshot_malformed_rows.set(dataset.malformed_rows() as i64);
}
