//! Historical sales KPIs and chart breakdowns

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use super::round2;
use crate::aggregation::{Aggregator, Period};
use crate::error::AggregationError;
use crate::models::observation::RawObservation;
use crate::models::records::SalesRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesKpis {
    pub total_orders: usize,
    pub total_sales: f64,
    /// Mean discount rate, as a percentage
    pub avg_discount: f64,
    pub late_deliveries: usize,
}

/// `None` when there are no sales rows to summarize
pub fn sales_kpis(sales: &[SalesRecord]) -> Option<SalesKpis> {
    if sales.is_empty() {
        return None;
    }

    let total_orders = sales
        .iter()
        .map(|s| s.order_item_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let total_sales: f64 = sales.iter().map(|s| s.amount()).sum();
    let avg_discount = sales.iter().map(|s| s.discount_rate).sum::<f64>() / sales.len() as f64;
    let late_deliveries = sales.iter().filter(|s| s.late_delivery_risk).count();

    Some(SalesKpis {
        total_orders,
        total_sales: round2(total_sales),
        avg_discount: round2(avg_discount * 100.0),
        late_deliveries,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesMetric {
    CitySales,
    CategoryDistribution,
    MonthlySales,
    ShippingMode,
    RegionSales,
    TopProducts,
}

impl FromStr for SalesMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city-sales" => Ok(SalesMetric::CitySales),
            "category-distribution" => Ok(SalesMetric::CategoryDistribution),
            "monthly-sales" => Ok(SalesMetric::MonthlySales),
            "shipping-mode" => Ok(SalesMetric::ShippingMode),
            "region-sales" => Ok(SalesMetric::RegionSales),
            "top-products" => Ok(SalesMetric::TopProducts),
            other => Err(format!("Invalid metric '{}'", other)),
        }
    }
}

/// Chart payload for one sales breakdown.
///
/// Every shape is parallel arrays (`labels`, `values`) under the keys the
/// dashboard charts read.
pub fn sales_metric(
    metric: SalesMetric,
    sales: &[SalesRecord],
    aggregator: &Aggregator,
) -> Result<Value, AggregationError> {
    let payload = match metric {
        SalesMetric::CitySales => {
            let cities = top_n(sum_by(sales, |s| &s.customer_city), 10);
            json!({ "cities": labels(&cities), "sales": values(&cities) })
        }
        SalesMetric::CategoryDistribution => {
            let categories = sum_by(sales, |s| &s.category_name);
            json!({ "categories": labels(&categories), "sales": values(&categories) })
        }
        SalesMetric::MonthlySales => {
            let rows: Vec<RawObservation> = sales
                .iter()
                .map(|s| RawObservation::new(s.order_date.clone(), s.sales))
                .collect();
            let monthly = aggregator.aggregate_raw(&rows, Period::Monthly, false)?;
            let months: Vec<&str> = monthly.buckets.iter().map(|b| b.key.as_str()).collect();
            let totals: Vec<f64> = monthly.buckets.iter().map(|b| b.total).collect();
            json!({ "months": months, "sales": totals, "skipped_rows": monthly.skipped_rows })
        }
        SalesMetric::ShippingMode => {
            let modes = count_by(sales, |s| &s.shipping_mode);
            let names: Vec<&str> = modes.iter().map(|(mode, _)| mode.as_str()).collect();
            let counts: Vec<usize> = modes.iter().map(|(_, count)| *count).collect();
            json!({ "modes": names, "counts": counts })
        }
        SalesMetric::RegionSales => {
            let regions = top_n(sum_by(sales, |s| &s.order_region), usize::MAX);
            json!({ "regions": labels(&regions), "sales": values(&regions) })
        }
        SalesMetric::TopProducts => {
            let products = top_n(sum_by(sales, |s| &s.product_name), 5);
            json!({ "products": labels(&products), "sales": values(&products) })
        }
    };
    Ok(payload)
}

/// Sum sales per key, keeping keys in order of first appearance
fn sum_by<F>(sales: &[SalesRecord], key: F) -> Vec<(String, f64)>
where
    F: Fn(&SalesRecord) -> &String,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(String, f64)> = Vec::new();
    for record in sales {
        let k = key(record);
        let slot = *index.entry(k.as_str()).or_insert_with(|| {
            totals.push((k.clone(), 0.0));
            totals.len() - 1
        });
        totals[slot].1 += record.amount();
    }
    totals
}

fn count_by<F>(sales: &[SalesRecord], key: F) -> Vec<(String, usize)>
where
    F: Fn(&SalesRecord) -> &String,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in sales {
        let k = key(record);
        let slot = *index.entry(k.as_str()).or_insert_with(|| {
            counts.push((k.clone(), 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }
    counts
}

/// Largest totals first; ties keep first-appearance order
fn top_n(mut totals: Vec<(String, f64)>, n: usize) -> Vec<(String, f64)> {
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals.truncate(n);
    totals
}

fn labels(pairs: &[(String, f64)]) -> Vec<&str> {
    pairs.iter().map(|(label, _)| label.as_str()).collect()
}

fn values(pairs: &[(String, f64)]) -> Vec<f64> {
    pairs.iter().map(|(_, value)| *value).collect()
}
