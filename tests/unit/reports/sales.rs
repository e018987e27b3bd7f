use scm_pulse::aggregation::{Aggregator, AggregatorOptions, MissingValuePolicy};
use scm_pulse::models::records::SalesRecord;
use scm_pulse::reports::{sales_kpis, sales_metric, SalesMetric};
use serde_json::json;

fn sale(id: &str, date: &str, sales: f64, city: &str, mode: &str, region: &str, product: &str) -> SalesRecord {
    SalesRecord {
        order_item_id: id.to_string(),
        order_date: date.to_string(),
        sales,
        discount_rate: 0.1,
        late_delivery_risk: id == "1",
        customer_city: city.to_string(),
        category_name: "Pumps".to_string(),
        shipping_mode: mode.to_string(),
        order_region: region.to_string(),
        product_name: product.to_string(),
    }
}

fn rows() -> Vec<SalesRecord> {
    vec![
        sale("1", "1/31/2024 22:56", 100.0, "Caguas", "Standard Class", "West", "Pump A"),
        sale("2", "1/15/2024 10:00", 200.0, "Chicago", "First Class", "East", "Pump B"),
        sale("2", "2/02/2024 08:30", 50.125, "Caguas", "Standard Class", "West", "Pump A"),
        sale("3", "garbage", 10.0, "Austin", "Same Day", "South", "Valve C"),
    ]
}

#[test]
fn kpis_summarize_distinct_orders() {
    let kpis = sales_kpis(&rows()).unwrap();

    assert_eq!(kpis.total_orders, 3);
    assert_eq!(kpis.total_sales, 360.13);
    assert_eq!(kpis.avg_discount, 10.0);
    assert_eq!(kpis.late_deliveries, 1);
}

#[test]
fn kpis_need_rows() {
    assert!(sales_kpis(&[]).is_none());
}

#[test]
fn unknown_metric_is_rejected() {
    let err = "weekly-sales".parse::<SalesMetric>().unwrap_err();
    assert_eq!(err, "Invalid metric 'weekly-sales'");
}

#[test]
fn monthly_sales_go_through_the_aggregator() {
    let payload = sales_metric(SalesMetric::MonthlySales, &rows(), &Aggregator::default()).unwrap();

    assert_eq!(
        payload,
        json!({ "months": ["2024-01", "2024-02"], "sales": [300.0, 50.125], "skipped_rows": 1 })
    );
}

#[test]
fn blank_sales_count_as_zero_in_kpis_but_follow_policy_in_monthly_totals() {
    let mut data = rows();
    data.push(sale("4", "1/20/2024 09:00", f64::NAN, "Austin", "Same Day", "South", "Pump A"));

    let kpis = sales_kpis(&data).unwrap();
    assert_eq!(kpis.total_sales, 360.13);

    let dropping = Aggregator::new(AggregatorOptions {
        missing_value: MissingValuePolicy::DropRow,
        ..AggregatorOptions::default()
    });
    let payload = sales_metric(SalesMetric::MonthlySales, &data, &dropping).unwrap();
    assert_eq!(payload["sales"], json!([300.0, 50.125]));
    assert_eq!(payload["skipped_rows"], 2);
}

#[test]
fn city_sales_are_sorted_descending() {
    let payload = sales_metric(SalesMetric::CitySales, &rows(), &Aggregator::default()).unwrap();

    assert_eq!(payload["cities"], json!(["Chicago", "Caguas", "Austin"]));
    assert_eq!(payload["sales"], json!([200.0, 150.125, 10.0]));
}

#[test]
fn shipping_modes_are_counted_in_first_appearance_order() {
    let payload = sales_metric(SalesMetric::ShippingMode, &rows(), &Aggregator::default()).unwrap();

    assert_eq!(payload["modes"], json!(["Standard Class", "First Class", "Same Day"]));
    assert_eq!(payload["counts"], json!([2, 1, 1]));
}

#[test]
fn top_products_are_capped() {
    let mut many = rows();
    for i in 0..10 {
        many.push(sale("9", "2024-03-01", i as f64, "X", "Y", "Z", &format!("Part {}", i)));
    }

    let payload = sales_metric(SalesMetric::TopProducts, &many, &Aggregator::default()).unwrap();

    assert_eq!(payload["products"].as_array().unwrap().len(), 5);
    assert_eq!(payload["products"][0], "Pump B");
}
