//! Inventory KPIs and reorder-point chart

use serde::Serialize;
use std::collections::HashSet;

use super::round2;
use crate::data::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryKpis {
    pub total_skus: usize,
    pub total_stock_on_hand: i64,
    pub in_transit: i64,
    pub below_reorder_point: usize,
    pub avg_lead_time: f64,
    pub scheduled_qty: i64,
}

pub fn inventory_kpis(dataset: &Dataset) -> InventoryKpis {
    let stock = &dataset.stock;
    let avg_lead_time = if stock.is_empty() {
        0.0
    } else {
        stock.iter().map(|s| s.lead_time_days).sum::<f64>() / stock.len() as f64
    };

    InventoryKpis {
        total_skus: stock.iter().map(|s| s.sku_no.as_str()).collect::<HashSet<_>>().len(),
        total_stock_on_hand: stock.iter().map(|s| s.stock_on_hand).sum(),
        in_transit: stock.iter().map(|s| s.in_transit).sum(),
        below_reorder_point: dataset.alerts.iter().filter(|a| a.below_reorder_point()).count(),
        avg_lead_time: round2(avg_lead_time),
        scheduled_qty: dataset.schedule.iter().map(|s| s.scheduled_quantity).sum(),
    }
}

/// One bar of the reorder chart, keyed the way the dashboard reads it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderPoint {
    #[serde(rename = "SKU_No")]
    pub sku_no: String,
    #[serde(rename = "Available")]
    pub available: i64,
    #[serde(rename = "Reorder_Point")]
    pub reorder_point: i64,
    pub below_reorder: bool,
}

pub fn reorder_chart(dataset: &Dataset) -> Vec<ReorderPoint> {
    dataset
        .alerts
        .iter()
        .map(|a| ReorderPoint {
            sku_no: a.sku_no.clone(),
            available: a.available,
            reorder_point: a.reorder_point,
            below_reorder: a.below_reorder_point(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadTime {
    #[serde(rename = "SKU_No")]
    pub sku_no: String,
    #[serde(rename = "Lead_Time_Days")]
    pub lead_time_days: f64,
}

pub fn lead_times(dataset: &Dataset) -> Vec<LeadTime> {
    dataset
        .stock
        .iter()
        .map(|s| LeadTime {
            sku_no: s.sku_no.clone(),
            lead_time_days: s.lead_time_days,
        })
        .collect()
}

/// Alerts without a supplier cell are counted under this name
pub const UNASSIGNED_SUPPLIER: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierAlerts {
    #[serde(rename = "Supplier")]
    pub supplier: String,
    #[serde(rename = "Alert_Count")]
    pub alert_count: usize,
}

/// SKUs under their reorder point, counted per supplier in order of first appearance
pub fn supplier_alerts(dataset: &Dataset) -> Vec<SupplierAlerts> {
    let mut counts: Vec<SupplierAlerts> = Vec::new();
    for alert in dataset.alerts.iter().filter(|a| a.below_reorder_point()) {
        let supplier = alert.supplier.as_deref().unwrap_or(UNASSIGNED_SUPPLIER);
        match counts.iter_mut().find(|c| c.supplier == supplier) {
            Some(entry) => entry.alert_count += 1,
            None => counts.push(SupplierAlerts {
                supplier: supplier.to_string(),
                alert_count: 1,
            }),
        }
    }
    counts
}
