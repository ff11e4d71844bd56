//! # Prometheus Metrics
//!
//! Operational metrics for the node, scraped at `/metrics` on the metrics
//! port. Everything lives in a dedicated [`Registry`] prefixed with
//! `asset_ledger`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus handles for the node. Cheap to clone.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Submissions that committed.
    pub transactions_submitted_total: IntCounter,
    /// Submissions rejected by the contract or the store.
    pub transactions_failed_total: IntCounter,
    /// Read-only evaluations served.
    pub queries_evaluated_total: IntCounter,
    /// Live assets: set from a full count at startup and on
    /// `GET /assets/count`, adjusted after each committed create, seed or delete.
    pub live_assets: IntGauge,
    /// Time spent inside one invocation, submit or evaluate.
    pub invocation_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("asset_ledger".into()), None)?;

        let transactions_submitted_total = IntCounter::new(
            "transactions_submitted_total",
            "Total number of committed submissions",
        )?;
        registry.register(Box::new(transactions_submitted_total.clone()))?;

        let transactions_failed_total = IntCounter::new(
            "transactions_failed_total",
            "Total number of submissions that were rolled back",
        )?;
        registry.register(Box::new(transactions_failed_total.clone()))?;

        let queries_evaluated_total = IntCounter::new(
            "queries_evaluated_total",
            "Total number of read-only evaluations",
        )?;
        registry.register(Box::new(queries_evaluated_total.clone()))?;

        let live_assets = IntGauge::new("live_assets", "Number of live assets")?;
        registry.register(Box::new(live_assets.clone()))?;

        let invocation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "invocation_latency_seconds",
                "Contract invocation latency in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(invocation_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            transactions_submitted_total,
            transactions_failed_total,
            queries_evaluated_total,
            live_assets,
            invocation_latency_seconds,
        })
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// Renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
