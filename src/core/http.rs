//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::aggregation::{Aggregator, Period};
use crate::core::ws;
use crate::data::{DatasetSource, ForecastFilter, SnapshotStore};
use crate::error::{AggregationError, DataError};
use crate::metrics::Metrics;
use crate::models::aggregate::{AggregateResult, ForecastPeriodSummary};
use crate::models::observation::RawObservation;
use crate::models::records::{ForecastRecord, Product};
use crate::reports::{
    self, InventoryKpis, LeadTime, ReorderPoint, SalesKpis, SalesMetric, ScheduleRow, SupplierAlerts,
};
use crate::services::RiskFeed;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub store: Arc<SnapshotStore>,
    /// Where on-demand refreshes load from; `None` disables `/api/admin/refresh`
    pub source: Option<Arc<dyn DatasetSource>>,
    pub aggregator: Aggregator,
    pub risk_feed: Arc<RiskFeed>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Error returned by API handlers, rendered as `{"error": "..."}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unavailable(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Aggregation(AggregationError::UnsupportedPeriod(_)) => StatusCode::BAD_REQUEST,
            ApiError::Aggregation(AggregationError::MalformedObservation { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "API request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let dataset = state.store.current();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "service": "scm-pulse",
        "snapshot_loaded_at": dataset.loaded_at,
        "snapshot_rows": dataset.row_count(),
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Aggregate `rows`, logging how many were left out
fn run_aggregation(
    state: &AppState,
    rows: &[RawObservation],
    period: Period,
    group_by: bool,
) -> Result<AggregateResult, ApiError> {
    let result = state.aggregator.aggregate_raw(rows, period, group_by)?;
    if result.skipped_rows > 0 {
        warn!(
            period = %period,
            skipped = result.skipped_rows,
            "{} rows skipped while aggregating",
            result.skipped_rows
        );
    }
    Ok(result)
}

/// Unique products for dropdowns
async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.store.current().products())
}

/// Forecast rows, optionally filtered by product
async fn list_forecasts(
    State(state): State<AppState>,
    Query(filter): Query<ForecastFilter>,
) -> Json<Vec<ForecastRecord>> {
    let dataset = state.store.current();
    Json(dataset.forecasts_matching(&filter).cloned().collect())
}

/// Forecast demand per period in the `[{period, total_demand, average_demand}]` shape
async fn forecast_by_period(
    State(state): State<AppState>,
    Path(period): Path<String>,
    Query(filter): Query<ForecastFilter>,
) -> Result<Json<Vec<ForecastPeriodSummary>>, ApiError> {
    let period: Period = period.parse()?;
    let dataset = state.store.current();
    let rows: Vec<RawObservation> = dataset
        .forecasts_matching(&filter)
        .map(|f| f.to_observation())
        .collect();

    let result = run_aggregation(&state, &rows, period, false)?;
    Ok(Json(
        result.buckets.iter().map(ForecastPeriodSummary::from).collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    period: Option<String>,
    group_by: Option<bool>,
    /// Keep every n-th bucket after aggregation
    every: Option<usize>,
    #[serde(rename = "PRODUCT_CARD_ID")]
    product_card_id: Option<String>,
    #[serde(rename = "PRODUCT_NAME")]
    product_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct SeriesResponse {
    dataset: String,
    #[serde(flatten)]
    result: AggregateResult,
    /// True when nothing could be bucketed; the chart should show its empty state
    no_data: bool,
}

/// Chart series for a dataset at any granularity, optionally split per product
async fn series(
    State(state): State<AppState>,
    Path(dataset_name): Path<String>,
    Query(params): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse>, ApiError> {
    let period: Period = params.period.as_deref().unwrap_or("monthly").parse()?;
    let group_by = params.group_by.unwrap_or(false);
    let dataset = state.store.current();

    let rows: Vec<RawObservation> = match dataset_name.as_str() {
        "forecasts" => {
            let filter = ForecastFilter {
                product_card_id: params.product_card_id,
                product_name: params.product_name,
            };
            dataset
                .forecasts_matching(&filter)
                .map(|f| f.to_observation())
                .collect()
        }
        "sales" => {
            // Sales rows carry no product card id
            if params.product_card_id.is_some() {
                return Err(ApiError::BadRequest(
                    "PRODUCT_CARD_ID is not available for sales; filter by PRODUCT_NAME".to_string(),
                ));
            }
            dataset
                .sales
                .iter()
                .filter(|s| {
                    params
                        .product_name
                        .as_deref()
                        .map_or(true, |name| s.product_name == name)
                })
                .map(|s| s.to_observation())
                .collect()
        }
        other => return Err(ApiError::NotFound(format!("Unknown dataset '{}'", other))),
    };

    let result = run_aggregation(&state, &rows, period, group_by)?.decimate(params.every.unwrap_or(1));
    Ok(Json(SeriesResponse {
        dataset: dataset_name,
        no_data: result.is_empty(),
        result,
    }))
}

async fn sales_kpis(State(state): State<AppState>) -> Result<Json<SalesKpis>, ApiError> {
    let dataset = state.store.current();
    reports::sales_kpis(&dataset.sales)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Sales data not found".to_string()))
}

async fn sales_metric(
    State(state): State<AppState>,
    Path(metric): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let metric: SalesMetric = metric.parse().map_err(ApiError::BadRequest)?;
    let dataset = state.store.current();
    if dataset.sales.is_empty() {
        return Err(ApiError::NotFound("Data not loaded".to_string()));
    }
    Ok(Json(reports::sales_metric(metric, &dataset.sales, &state.aggregator)?))
}

async fn inventory_kpis(State(state): State<AppState>) -> Json<InventoryKpis> {
    Json(reports::inventory_kpis(&state.store.current()))
}

async fn reorder_chart(State(state): State<AppState>) -> Json<Vec<ReorderPoint>> {
    Json(reports::reorder_chart(&state.store.current()))
}

async fn lead_times(State(state): State<AppState>) -> Json<Vec<LeadTime>> {
    Json(reports::lead_times(&state.store.current()))
}

async fn supplier_alerts(State(state): State<AppState>) -> Json<Vec<SupplierAlerts>> {
    Json(reports::supplier_alerts(&state.store.current()))
}

/// Raw rows of one inventory table
async fn inventory_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Response, ApiError> {
    let dataset = state.store.current();
    let response = match table.as_str() {
        "stock_levels" => Json(&dataset.stock).into_response(),
        "alerts" => Json(&dataset.alerts).into_response(),
        "schedule" => Json(&dataset.schedule).into_response(),
        other => return Err(ApiError::BadRequest(format!("Invalid dataset '{}'", other))),
    };
    Ok(response)
}

async fn schedule_table(State(state): State<AppState>) -> Result<Json<Vec<ScheduleRow>>, ApiError> {
    let dataset = state.store.current();
    if dataset.schedule.is_empty() {
        return Err(ApiError::NotFound("Schedule data not loaded".to_string()));
    }
    Ok(Json(reports::schedule_table(&dataset)))
}

/// Reload the dataset from the configured source
async fn refresh_snapshot(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let source = state
        .source
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("No dataset source configured".to_string()))?;

    let dataset = state.store.refresh(source.as_ref()).await?;
    Ok(Json(json!({
        "status": "refreshed",
        "rows": dataset.row_count(),
        "rejected_rows": dataset.rejected_rows,
        "loaded_at": dataset.loaded_at,
    })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/products", get(list_products))
        .route("/api/forecasts", get(list_forecasts))
        .route("/api/forecasts/{period}", get(forecast_by_period))
        .route("/api/series/{dataset}", get(series))
        .route("/api/sales/kpis", get(sales_kpis))
        .route("/api/sales/{metric}", get(sales_metric))
        .route("/api/inventory/kpis", get(inventory_kpis))
        .route("/api/inventory/reorder_chart", get(reorder_chart))
        .route("/api/inventory/lead_times", get(lead_times))
        .route("/api/inventory/suppliers", get(supplier_alerts))
        .route("/api/inventory/{dataset}", get(inventory_table))
        .route("/api/schedule", get(schedule_table))
        .route("/api/admin/refresh", post(refresh_snapshot))
        .route("/ws/scheduling/date_range", get(ws::scheduling_feed))
        .route("/risk-data", get(ws::risk_feed))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!("Metrics endpoint available at http://0.0.0.0:{}/metrics", port);
    axum::serve(listener, app).await?;

    Ok(())
}
