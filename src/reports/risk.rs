//! Risk alerts derived from inventory and delivery data

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::Dataset;

/// Late-delivery share above which an alert is raised
pub const LATE_DELIVERY_ALERT_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One alert as pushed on the risk feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAlert {
    #[serde(rename = "Date")]
    pub date: DateTime<Utc>,
    #[serde(rename = "Headline")]
    pub headline: String,
    #[serde(rename = "PESTEL_Category")]
    pub pestel_category: String,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "Affected_Domains")]
    pub affected_domains: String,
    #[serde(rename = "Recommended_Actions")]
    pub recommended_actions: String,
    #[serde(rename = "Severity")]
    pub severity: Severity,
}

/// Current alerts for `dataset`: one per SKU under its reorder point, plus
/// one for the late-delivery rate when it crosses the threshold
pub fn risk_alerts(dataset: &Dataset, now: DateTime<Utc>) -> Vec<RiskAlert> {
    let mut alerts: Vec<RiskAlert> = dataset
        .alerts
        .iter()
        .filter(|a| a.below_reorder_point())
        .map(|a| {
            let coverage = if a.reorder_point > 0 {
                a.available as f64 / a.reorder_point as f64
            } else {
                0.0
            };
            let severity = if a.available <= 0 {
                Severity::High
            } else if coverage < 0.5 {
                Severity::Medium
            } else {
                Severity::Low
            };
            RiskAlert {
                date: now,
                headline: format!("{} below reorder point", a.sku_no),
                pestel_category: "Economic".to_string(),
                summary: format!(
                    "{} units available against a reorder point of {}",
                    a.available, a.reorder_point
                ),
                affected_domains: "Inventory".to_string(),
                recommended_actions: format!(
                    "Raise a purchase order for {} units of {}",
                    a.reorder_point - a.available,
                    a.sku_no
                ),
                severity,
            }
        })
        .collect();

    if !dataset.sales.is_empty() {
        let late = dataset.sales.iter().filter(|s| s.late_delivery_risk).count();
        let ratio = late as f64 / dataset.sales.len() as f64;
        if ratio > LATE_DELIVERY_ALERT_RATIO {
            alerts.push(RiskAlert {
                date: now,
                headline: "Late delivery risk elevated".to_string(),
                pestel_category: "Economic".to_string(),
                summary: format!(
                    "{} of {} orders ({:.1}%) are flagged as late-delivery risks",
                    late,
                    dataset.sales.len(),
                    ratio * 100.0
                ),
                affected_domains: "Logistics".to_string(),
                recommended_actions: "Review carrier performance and shipping modes".to_string(),
                severity: if ratio > 0.75 { Severity::High } else { Severity::Medium },
            });
        }
    }

    alerts
}
