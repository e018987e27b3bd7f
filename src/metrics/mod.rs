//! Prometheus metrics for the HTTP surface, snapshot store and feeds

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub snapshot_refresh_total: IntCounter,
    pub snapshot_rows: Gauge,
    pub snapshot_malformed_rows: IntGauge,
    pub feed_subscribers: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let snapshot_refresh_total = IntCounter::new(
            "snapshot_refresh_total",
            "Successful dataset snapshot loads",
        )?;
        let snapshot_rows = Gauge::new("snapshot_rows", "Rows held by the current dataset snapshot")?;
        let snapshot_malformed_rows = IntGauge::new(
            "snapshot_malformed_rows",
            "Forecast and sales rows in the current snapshot with an unparseable date or a missing value",
        )?;
        let feed_subscribers =
            IntGauge::new("feed_subscribers", "Connected WebSocket feed subscribers")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(snapshot_refresh_total.clone()))?;
        registry.register(Box::new(snapshot_rows.clone()))?;
        registry.register(Box::new(snapshot_malformed_rows.clone()))?;
        registry.register(Box::new(feed_subscribers.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            snapshot_refresh_total,
            snapshot_rows,
            snapshot_malformed_rows,
            feed_subscribers,
        })
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
