//! Declarative field-alias tables for the upstream CSV exports.
//!
//! Exports come from several tools and disagree on header spelling
//! (`Order Item Id` vs `order_item_id`, a UTF-8 BOM glued to the first
//! column, ...). Each record kind lists the spellings it accepts; headers
//! are normalized once per file and resolved to column indices before any
//! row is read.

use csv::StringRecord;
use std::collections::HashMap;
use std::path::Path;

use crate::error::DataError;

/// One logical field and the header spellings that map to it
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

const fn required(name: &'static str, aliases: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        aliases,
        required: true,
    }
}

const fn optional(name: &'static str, aliases: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        aliases,
        required: false,
    }
}

pub const FORECAST_FIELDS: &[FieldSpec] = &[
    required("date", &["Date", "forecast_date"]),
    required("forecasted_demand", &["Forecasted_Demand", "forecast", "demand"]),
    required("product_card_id", &["PRODUCT_CARD_ID", "product_id"]),
    required("product_name", &["PRODUCT_NAME", "product"]),
    optional("frequency", &["FREQUENCY"]),
];

pub const SALES_FIELDS: &[FieldSpec] = &[
    optional("order_item_id", &["Order Item Id"]),
    required("order_date", &["order date (DateOrders)", "order_date", "Order Date"]),
    required("sales", &["Sales"]),
    optional("discount_rate", &["Order Item Discount Rate"]),
    optional("late_delivery_risk", &["Late_delivery_risk"]),
    optional("customer_city", &["Customer City"]),
    optional("category_name", &["Category Name"]),
    optional("shipping_mode", &["Shipping Mode"]),
    optional("order_region", &["Order Region"]),
    optional("product_name", &["Product Name"]),
];

pub const STOCK_FIELDS: &[FieldSpec] = &[
    required("sku_no", &["SKU_No", "sku", "sku_id"]),
    optional("stock_on_hand", &["Stock_On_Hand"]),
    optional("in_transit", &["In_Transit"]),
    optional("lead_time_days", &["Lead_Time_Days", "lead_time"]),
];

pub const ALERT_FIELDS: &[FieldSpec] = &[
    required("sku_no", &["SKU_No", "sku", "sku_id"]),
    required("available", &["Available"]),
    required("reorder_point", &["Reorder_Point"]),
    optional("supplier", &["Supplier", "supplier_name", "Vendor"]),
];

pub const SCHEDULE_FIELDS: &[FieldSpec] = &[
    required("scheduled_date", &["Scheduled_Date", "Date"]),
    optional("product_name", &["Product_Name", "PRODUCT_NAME", "Product"]),
    required("scheduled_quantity", &["Scheduled_Quantity", "Quantity"]),
];

/// Lowercase, strip a leading BOM and collapse every run of
/// non-alphanumeric characters into a single underscore.
pub fn normalize_header(name: &str) -> String {
    let name = name.trim().trim_start_matches('\u{feff}');
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Logical field name → column index for one file
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<&'static str, usize>,
}

impl ColumnMap {
    pub fn resolve(
        headers: &StringRecord,
        fields: &[FieldSpec],
        path: &Path,
    ) -> Result<Self, DataError> {
        let by_header: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header(name), idx))
            .collect();

        let mut indices = HashMap::new();
        for field in fields {
            let found = std::iter::once(field.name)
                .chain(field.aliases.iter().copied())
                .find_map(|alias| by_header.get(&normalize_header(alias)).copied());

            match found {
                Some(idx) => {
                    indices.insert(field.name, idx);
                }
                None if field.required => {
                    return Err(DataError::MissingColumn {
                        path: path.to_path_buf(),
                        column: field.name.to_string(),
                    });
                }
                None => {}
            }
        }

        Ok(Self { indices })
    }

    pub fn contains(&self, field: &str) -> bool {
        self.indices.contains_key(field)
    }

    /// Trimmed cell for `field`; `None` when the column is absent or the cell is empty
    pub fn get<'r>(&self, record: &'r StringRecord, field: &str) -> Option<&'r str> {
        self.indices
            .get(field)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
    }

    pub fn text(&self, record: &StringRecord, field: &str) -> String {
        self.get(record, field).unwrap_or_default().to_string()
    }
}

/// Parse a numeric cell, tolerating thousands separators and a `%` suffix
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Missing or unparseable cells become NaN, leaving the call to the
/// aggregator's missing-value policy
pub fn number_or_nan(cell: Option<&str>) -> f64 {
    cell.and_then(parse_number).unwrap_or(f64::NAN)
}

pub fn number_or_zero(cell: Option<&str>) -> f64 {
    cell.and_then(parse_number).unwrap_or(0.0)
}

/// Integer cell, truncating any fractional part; missing or bad cells are 0
pub fn int_or_zero(cell: Option<&str>) -> i64 {
    cell.and_then(parse_number).map(|v| v.trunc() as i64).unwrap_or(0)
}

pub fn flag(cell: Option<&str>) -> bool {
    matches!(
        cell.map(|c| c.to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "y")
    )
}
