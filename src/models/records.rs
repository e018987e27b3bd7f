//! Typed rows of the CSV exports.
//!
//! Date cells stay as raw strings: they are validated when the rows are
//! turned into observations, so a bad date skips one data point instead of
//! failing the whole load.

use serde::{Deserialize, Serialize};

use crate::models::observation::RawObservation;

/// Demand forecast per product and day (`all_pump_forecasts.csv`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(rename = "Date")]
    pub date: String,
    /// NaN when the cell was empty or not a number
    #[serde(rename = "Forecasted_Demand")]
    pub forecasted_demand: f64,
    #[serde(rename = "PRODUCT_CARD_ID")]
    pub product_card_id: String,
    #[serde(rename = "PRODUCT_NAME")]
    pub product_name: String,
    #[serde(rename = "FREQUENCY", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

impl ForecastRecord {
    pub fn to_observation(&self) -> RawObservation {
        RawObservation::new(self.date.clone(), self.forecasted_demand)
            .with_group(self.product_name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "PRODUCT_CARD_ID")]
    pub product_card_id: String,
    #[serde(rename = "PRODUCT_NAME")]
    pub product_name: String,
}

/// One order line of the historical sales export (`Pump_Data.csv`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub order_item_id: String,
    pub order_date: String,
    /// NaN when the cell was empty or not a number
    pub sales: f64,
    pub discount_rate: f64,
    pub late_delivery_risk: bool,
    pub customer_city: String,
    pub category_name: String,
    pub shipping_mode: String,
    pub order_region: String,
    pub product_name: String,
}

impl SalesRecord {
    /// Sales amount for sums and breakdowns, with unreadable cells counted as 0
    pub fn amount(&self) -> f64 {
        if self.sales.is_finite() {
            self.sales
        } else {
            0.0
        }
    }

    pub fn to_observation(&self) -> RawObservation {
        RawObservation::new(self.order_date.clone(), self.sales)
            .with_group(self.product_name.clone())
    }
}

/// Stock position per SKU (`total_stock_levels_updated.csv`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "SKU_No")]
    pub sku_no: String,
    #[serde(rename = "Stock_On_Hand")]
    pub stock_on_hand: i64,
    #[serde(rename = "In_Transit")]
    pub in_transit: i64,
    #[serde(rename = "Lead_Time_Days")]
    pub lead_time_days: f64,
}

/// Availability against reorder point (`total_demo_sku_inventory_alerts.csv`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(rename = "SKU_No")]
    pub sku_no: String,
    #[serde(rename = "Available")]
    pub available: i64,
    #[serde(rename = "Reorder_Point")]
    pub reorder_point: i64,
    #[serde(rename = "Supplier", default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

impl AlertRecord {
    pub fn below_reorder_point(&self) -> bool {
        self.available < self.reorder_point
    }
}

/// Planned production run (`total_production_schedule.csv`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    #[serde(rename = "Scheduled_Date")]
    pub scheduled_date: String,
    #[serde(rename = "Product_Name")]
    pub product_name: String,
    #[serde(rename = "Scheduled_Quantity")]
    pub scheduled_quantity: i64,
}
