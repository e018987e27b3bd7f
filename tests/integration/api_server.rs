//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics, and the aggregation endpoints
//! against the fixture dataset.


use scm_pulse::aggregation::{AggregatorOptions, MalformedPolicy};
use scm_pulse::data::Dataset;
use serde_json::{json, Value};

use test_utils::TestApiServer;

#[tokio::test]
async fn health_endpoint_reports_snapshot() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "scm-pulse");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert!(body["snapshot_loaded_at"].is_string());
    assert_eq!(body["snapshot_rows"], 16);
}

#[tokio::test]
async fn health_reports_no_load_time_for_an_unloaded_snapshot() {
    let app = TestApiServer::with_dataset(Dataset::new(), AggregatorOptions::default());
    let body: Value = app.server.get("/health").await.json();

    assert!(body["snapshot_loaded_at"].is_null());
    assert_eq!(body["snapshot_rows"], 0);
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    for _ in 0..3 {
        let _ = app.server.get("/health").await;
    }

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    for name in [
        "http_requests_total",
        "http_request_duration_seconds",
        "http_requests_in_flight",
        "snapshot_rows",
        "snapshot_malformed_rows",
        "feed_subscribers",
    ] {
        assert!(body.contains(name), "Expected {} metric", name);
    }
    assert!(app.state.metrics.http_requests_total.get() >= 3);
}

#[tokio::test]
async fn products_are_listed_once_each() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/products").await;
    assert_eq!(response.status_code(), 200);

    assert_eq!(
        response.json::<Value>(),
        json!([
            { "PRODUCT_CARD_ID": "P1", "PRODUCT_NAME": "Pump A" },
            { "PRODUCT_CARD_ID": "P2", "PRODUCT_NAME": "Pump B" }
        ])
    );
}

#[tokio::test]
async fn forecasts_filter_by_product() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .get("/api/forecasts")
        .add_query_param("PRODUCT_NAME", "Pump B")
        .await;
    assert_eq!(response.status_code(), 200);

    let rows: Vec<Value> = response.json();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["PRODUCT_CARD_ID"] == "P2"));
}

#[tokio::test]
async fn forecast_monthly_keeps_the_wire_shape() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/forecasts/monthly").await;
    assert_eq!(response.status_code(), 200);

    assert_eq!(
        response.json::<Value>(),
        json!([
            { "period": "2023-12", "total_demand": 2.0, "average_demand": 2.0 },
            { "period": "2024-01", "total_demand": 15.0, "average_demand": 7.5 },
            { "period": "2024-02", "total_demand": 10.0, "average_demand": 5.0 }
        ])
    );
    assert_eq!(app.state.metrics.snapshot_malformed_rows.get(), 1);
}

#[tokio::test]
async fn malformed_row_gauge_tracks_the_snapshot_not_the_traffic() {
    let app = TestApiServer::new().await;
    assert_eq!(app.state.metrics.snapshot_malformed_rows.get(), 1);

    for _ in 0..3 {
        let response = app.server.get("/api/series/forecasts").add_query_param("period", "daily").await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.json::<Value>()["skipped_rows"], 1);
    }
    assert_eq!(app.state.metrics.snapshot_malformed_rows.get(), 1);

    let _ = app.server.post("/api/admin/refresh").await;
    assert_eq!(app.state.metrics.snapshot_malformed_rows.get(), 1);
}

#[tokio::test]
async fn forecast_periods_respect_product_filter() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .get("/api/forecasts/quarterly")
        .add_query_param("PRODUCT_CARD_ID", "P1")
        .await;
    assert_eq!(response.status_code(), 200);

    assert_eq!(
        response.json::<Value>(),
        json!([{ "period": "2024-Q1", "total_demand": 18.0, "average_demand": 6.0 }])
    );
}

#[tokio::test]
async fn forecast_weekly_uses_iso_weeks() {
    let app = TestApiServer::new().await;
    let rows: Vec<Value> = app.server.get("/api/forecasts/weekly").await.json();

    let periods: Vec<&str> = rows.iter().map(|r| r["period"].as_str().unwrap()).collect();
    assert_eq!(periods, vec!["2023-W52", "2024-W01", "2024-W03", "2024-W05"]);
}

#[tokio::test]
async fn unknown_period_is_a_bad_request() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/forecasts/hourly").await;
    assert_eq!(response.status_code(), 400);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("hourly"));
}

#[tokio::test]
async fn abort_policy_surfaces_malformed_rows() {
    let app = TestApiServer::with_dataset(
        crate::test_utils::fixture_dataset(),
        AggregatorOptions {
            malformed: MalformedPolicy::Abort,
            ..AggregatorOptions::default()
        },
    );
    let response = app.server.get("/api/forecasts/monthly").await;
    assert_eq!(response.status_code(), 422);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not-a-date"));
}

#[tokio::test]
async fn series_splits_buckets_by_product() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .get("/api/series/forecasts")
        .add_query_param("period", "monthly")
        .add_query_param("group_by", "true")
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["dataset"], "forecasts");
    assert_eq!(body["period"], "monthly");
    assert_eq!(body["no_data"], false);
    assert_eq!(body["skipped_rows"], 1);

    let buckets = body["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[1]["period"], "Jan '24");
    assert_eq!(buckets[1]["key"], "2024-01");
    assert_eq!(buckets[2]["series"], json!({ "Pump A": 3.0, "Pump B": 7.0 }));
}

#[tokio::test]
async fn series_decimates_after_aggregation() {
    let app = TestApiServer::new().await;
    let body: Value = app
        .server
        .get("/api/series/forecasts")
        .add_query_param("period", "monthly")
        .add_query_param("every", "2")
        .await
        .json();

    let keys: Vec<&str> = body["buckets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["2023-12", "2024-02"]);
    assert_eq!(body["buckets"][1]["total"], 10.0);
}

#[tokio::test]
async fn series_flags_empty_results() {
    let app = TestApiServer::new().await;
    let body: Value = app
        .server
        .get("/api/series/forecasts")
        .add_query_param("PRODUCT_NAME", "Nonexistent")
        .await
        .json();

    assert_eq!(body["no_data"], true);
    assert_eq!(body["buckets"], json!([]));
}

#[tokio::test]
async fn series_over_sales() {
    let app = TestApiServer::new().await;
    let body: Value = app
        .server
        .get("/api/series/sales")
        .add_query_param("period", "yearly")
        .await
        .json();

    assert_eq!(body["buckets"].as_array().unwrap().len(), 1);
    assert_eq!(body["buckets"][0]["key"], "2024");
    assert_eq!(body["buckets"][0]["total"], 350.75);
    assert_eq!(body["buckets"][0]["count"], 3);
}

#[tokio::test]
async fn series_over_sales_rejects_product_card_filter() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .get("/api/series/sales")
        .add_query_param("PRODUCT_CARD_ID", "P1")
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("PRODUCT_CARD_ID"));

    let body: Value = app
        .server
        .get("/api/series/sales")
        .add_query_param("PRODUCT_NAME", "Pump B")
        .await
        .json();
    assert_eq!(body["buckets"][0]["total"], 200.0);
}

#[tokio::test]
async fn series_rejects_unknown_dataset_and_period() {
    let app = TestApiServer::new().await;
    assert_eq!(app.server.get("/api/series/orders").await.status_code(), 404);

    let response = app
        .server
        .get("/api/series/forecasts")
        .add_query_param("period", "hourly")
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn sales_kpis_summarize_fixture() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/sales/kpis").await;
    assert_eq!(response.status_code(), 200);

    assert_eq!(
        response.json::<Value>(),
        json!({
            "total_orders": 3,
            "total_sales": 350.75,
            "avg_discount": 10.0,
            "late_deliveries": 2
        })
    );
}

#[tokio::test]
async fn sales_metrics_render_chart_payloads() {
    let app = TestApiServer::new().await;

    let monthly: Value = app.server.get("/api/sales/monthly-sales").await.json();
    assert_eq!(monthly["months"], json!(["2024-01", "2024-02"]));
    assert_eq!(monthly["sales"], json!([300.5, 50.25]));

    let regions: Value = app.server.get("/api/sales/region-sales").await.json();
    assert_eq!(regions["regions"], json!(["East", "West"]));

    let response = app.server.get("/api/sales/bogus").await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>(), json!({ "error": "Invalid metric 'bogus'" }));
}

#[tokio::test]
async fn sales_endpoints_report_missing_data() {
    let app = TestApiServer::with_dataset(Dataset::new(), AggregatorOptions::default());

    assert_eq!(app.server.get("/api/sales/kpis").await.status_code(), 404);
    assert_eq!(app.server.get("/api/sales/city-sales").await.status_code(), 404);
}

#[tokio::test]
async fn inventory_endpoints() {
    let app = TestApiServer::new().await;

    let kpis: Value = app.server.get("/api/inventory/kpis").await.json();
    assert_eq!(
        kpis,
        json!({
            "total_skus": 2,
            "total_stock_on_hand": 1300,
            "in_transit": 20,
            "below_reorder_point": 1,
            "avg_lead_time": 6.0,
            "scheduled_qty": 75
        })
    );

    let chart: Vec<Value> = app.server.get("/api/inventory/reorder_chart").await.json();
    assert_eq!(chart.len(), 2);
    assert_eq!(
        chart[0],
        json!({ "SKU_No": "SKU-1", "Available": 0, "Reorder_Point": 50, "below_reorder": true })
    );
    assert_eq!(chart[1]["SKU_No"], "SKU-2");
    assert_eq!(chart[1]["below_reorder"], false);
}

#[tokio::test]
async fn inventory_lead_times_and_supplier_alerts() {
    let app = TestApiServer::new().await;

    let response = app.server.get("/api/inventory/lead_times").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.json::<Value>(),
        json!([
            { "SKU_No": "SKU-1", "Lead_Time_Days": 5.0 },
            { "SKU_No": "SKU-2", "Lead_Time_Days": 7.0 }
        ])
    );

    let response = app.server.get("/api/inventory/suppliers").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.json::<Value>(),
        json!([{ "Supplier": "Acme Castings", "Alert_Count": 1 }])
    );
}

#[tokio::test]
async fn inventory_tables_return_raw_rows() {
    let app = TestApiServer::new().await;

    let stock: Vec<Value> = app.server.get("/api/inventory/stock_levels").await.json();
    assert_eq!(stock.len(), 2);
    assert_eq!(
        stock[1],
        json!({ "SKU_No": "SKU-2", "Stock_On_Hand": 1200, "In_Transit": 0, "Lead_Time_Days": 7.0 })
    );

    let alerts: Vec<Value> = app.server.get("/api/inventory/alerts").await.json();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["Supplier"], "Acme Castings");

    let schedule: Vec<Value> = app.server.get("/api/inventory/schedule").await.json();
    assert_eq!(schedule.len(), 3);
    assert_eq!(schedule[0]["Scheduled_Quantity"], 40);

    let response = app.server.get("/api/inventory/bom").await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>(), json!({ "error": "Invalid dataset 'bom'" }));
}

#[tokio::test]
async fn schedule_table_lists_planned_runs() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/schedule").await;
    assert_eq!(response.status_code(), 200);

    let rows: Vec<Value> = response.json();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], json!({ "Date": "2024-01-05", "Product": "Pump A", "Units": 40 }));

    let empty = TestApiServer::with_dataset(Dataset::new(), AggregatorOptions::default());
    assert_eq!(empty.server.get("/api/schedule").await.status_code(), 404);
}

#[tokio::test]
async fn admin_refresh_reloads_from_source() {
    let app = TestApiServer::new().await;
    let before = app.state.metrics.snapshot_refresh_total.get();

    let response = app.server.post("/api/admin/refresh").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "refreshed");
    assert_eq!(body["rows"], 16);
    assert_eq!(body["rejected_rows"], 1);
    assert_eq!(app.state.metrics.snapshot_refresh_total.get(), before + 1);
}
