//! CSV ingestion into typed records

use csv::StringRecord;
use chrono::Utc;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{
    flag, int_or_zero, number_or_nan, number_or_zero, ColumnMap, FieldSpec, ALERT_FIELDS,
    FORECAST_FIELDS, SALES_FIELDS, SCHEDULE_FIELDS, STOCK_FIELDS,
};
use super::snapshot::Dataset;
use crate::error::DataError;
use crate::models::records::{
    AlertRecord, ForecastRecord, SalesRecord, ScheduleRecord, StockRecord,
};

pub const FORECASTS_FILE: &str = "all_pump_forecasts.csv";
pub const SALES_FILE: &str = "Pump_Data.csv";
pub const STOCK_FILE: &str = "total_stock_levels_updated.csv";
pub const ALERTS_FILE: &str = "total_demo_sku_inventory_alerts.csv";
pub const SCHEDULE_FILE: &str = "total_production_schedule.csv";

/// A row that could not be turned into a record
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number in the file, header included
    pub line: usize,
    pub message: String,
}

/// Records read from one file plus what went wrong along the way
#[derive(Debug, Clone)]
pub struct LoadReport<T> {
    pub path: PathBuf,
    pub records: Vec<T>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl<T> LoadReport<T> {
    fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            records: Vec::new(),
            row_errors: Vec::new(),
            rows_read: 0,
        }
    }
}

/// Read `path`, resolve its headers against `fields` and convert each row with `parse`
pub fn load_table<T, F>(path: &Path, fields: &[FieldSpec], parse: F) -> Result<LoadReport<T>, DataError>
where
    F: Fn(&ColumnMap, &StringRecord) -> Result<T, String>,
{
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let columns = ColumnMap::resolve(&headers, fields, path)?;

    let mut report = LoadReport::empty(path);
    for (idx, result) in reader.records().enumerate() {
        // records() starts on the line after the header
        let line = idx + 2;
        report.rows_read += 1;

        let outcome = result
            .map_err(|e| format!("CSV parse error: {}", e))
            .and_then(|record| parse(&columns, &record));

        match outcome {
            Ok(record) => report.records.push(record),
            Err(message) => {
                debug!(path = %path.display(), line = line, error = %message, "skipping CSV row");
                report.row_errors.push(RowError { line, message });
            }
        }
    }

    if !report.row_errors.is_empty() {
        warn!(
            path = %path.display(),
            rejected = report.row_errors.len(),
            rows = report.rows_read,
            "{} of {} rows rejected while loading {}",
            report.row_errors.len(),
            report.rows_read,
            path.display()
        );
    }

    Ok(report)
}

/// Like `load_table`, but a missing file yields an empty report
pub fn load_optional_table<T, F>(
    path: &Path,
    fields: &[FieldSpec],
    parse: F,
) -> Result<LoadReport<T>, DataError>
where
    F: Fn(&ColumnMap, &StringRecord) -> Result<T, String>,
{
    if !path.exists() {
        warn!(path = %path.display(), "optional data file not found, continuing with an empty table");
        return Ok(LoadReport::empty(path));
    }
    load_table(path, fields, parse)
}

pub fn parse_forecast(columns: &ColumnMap, record: &StringRecord) -> Result<ForecastRecord, String> {
    Ok(ForecastRecord {
        date: columns.text(record, "date"),
        forecasted_demand: number_or_nan(columns.get(record, "forecasted_demand")),
        product_card_id: columns.text(record, "product_card_id"),
        product_name: columns.text(record, "product_name"),
        frequency: columns.get(record, "frequency").map(str::to_string),
    })
}

pub fn parse_sales(columns: &ColumnMap, record: &StringRecord) -> Result<SalesRecord, String> {
    Ok(SalesRecord {
        order_item_id: columns.text(record, "order_item_id"),
        order_date: columns.text(record, "order_date"),
        sales: number_or_nan(columns.get(record, "sales")),
        discount_rate: number_or_zero(columns.get(record, "discount_rate")),
        late_delivery_risk: flag(columns.get(record, "late_delivery_risk")),
        customer_city: columns.text(record, "customer_city"),
        category_name: columns.text(record, "category_name"),
        shipping_mode: columns.text(record, "shipping_mode"),
        order_region: columns.text(record, "order_region"),
        product_name: columns.text(record, "product_name"),
    })
}

pub fn parse_stock(columns: &ColumnMap, record: &StringRecord) -> Result<StockRecord, String> {
    let sku_no = columns
        .get(record, "sku_no")
        .ok_or_else(|| "empty SKU_No".to_string())?;
    Ok(StockRecord {
        sku_no: sku_no.to_string(),
        stock_on_hand: int_or_zero(columns.get(record, "stock_on_hand")),
        in_transit: int_or_zero(columns.get(record, "in_transit")),
        lead_time_days: number_or_zero(columns.get(record, "lead_time_days")),
    })
}

pub fn parse_alert(columns: &ColumnMap, record: &StringRecord) -> Result<AlertRecord, String> {
    let sku_no = columns
        .get(record, "sku_no")
        .ok_or_else(|| "empty SKU_No".to_string())?;
    Ok(AlertRecord {
        sku_no: sku_no.to_string(),
        available: int_or_zero(columns.get(record, "available")),
        reorder_point: int_or_zero(columns.get(record, "reorder_point")),
        supplier: columns.get(record, "supplier").map(str::to_string),
    })
}

pub fn parse_schedule(columns: &ColumnMap, record: &StringRecord) -> Result<ScheduleRecord, String> {
    Ok(ScheduleRecord {
        scheduled_date: columns.text(record, "scheduled_date"),
        product_name: columns.text(record, "product_name"),
        scheduled_quantity: int_or_zero(columns.get(record, "scheduled_quantity")),
    })
}

/// Load every known export from `dir` into a fresh dataset.
///
/// The forecast file is mandatory; the others load as empty tables when absent.
pub fn load_directory(dir: &Path) -> Result<Dataset, DataError> {
    let forecasts = load_table(&dir.join(FORECASTS_FILE), FORECAST_FIELDS, parse_forecast)?;
    let sales = load_optional_table(&dir.join(SALES_FILE), SALES_FIELDS, parse_sales)?;
    let stock = load_optional_table(&dir.join(STOCK_FILE), STOCK_FIELDS, parse_stock)?;
    let alerts = load_optional_table(&dir.join(ALERTS_FILE), ALERT_FIELDS, parse_alert)?;
    let schedule = load_optional_table(&dir.join(SCHEDULE_FILE), SCHEDULE_FIELDS, parse_schedule)?;

    let rejected_rows = forecasts.row_errors.len()
        + sales.row_errors.len()
        + stock.row_errors.len()
        + alerts.row_errors.len()
        + schedule.row_errors.len();

    let dataset = Dataset::new()
        .with_forecasts(forecasts.records)
        .with_sales(sales.records)
        .with_stock(stock.records)
        .with_alerts(alerts.records)
        .with_schedule(schedule.records)
        .with_rejected_rows(rejected_rows)
        .with_loaded_at(Utc::now());

    info!(
        dir = %dir.display(),
        forecasts = dataset.forecasts.len(),
        sales = dataset.sales.len(),
        stock = dataset.stock.len(),
        alerts = dataset.alerts.len(),
        schedule = dataset.schedule.len(),
        rejected = rejected_rows,
        "dataset loaded from {}",
        dir.display()
    );

    Ok(dataset)
}
