//! Prometheus metrics for the back office.
//!
//! Metric names live in one enum so handlers never pass magic strings. The
//! recorder is installed once by the binary; without it every call below is a
//! no-op, which is what the tests rely on.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::fmt;
use std::time::Duration;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    HttpRequests,
    HttpRequestDuration,
    CodesGenerated,
    CodeCollisions,
    TreeAreaLinks,
    AssetHistoryRows,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::HttpRequests => "parks_http_requests_total",
            MetricName::HttpRequestDuration => "parks_http_request_duration_seconds",
            MetricName::CodesGenerated => "parks_codes_generated_total",
            MetricName::CodeCollisions => "parks_code_collisions_total",
            MetricName::TreeAreaLinks => "parks_tree_area_links_total",
            MetricName::AssetHistoryRows => "parks_asset_history_rows_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Render the current metrics in the Prometheus text format, if installed.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|h| h.render())
}

pub fn record_http_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    ::metrics::counter!(
        MetricName::HttpRequests.as_str(),
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        MetricName::HttpRequestDuration.as_str(),
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_code_generated(kind: &'static str, collisions: usize) {
    ::metrics::counter!(MetricName::CodesGenerated.as_str(), "kind" => kind).increment(1);
    if collisions > 0 {
        ::metrics::counter!(MetricName::CodeCollisions.as_str(), "kind" => kind)
            .increment(collisions as u64);
    }
}

pub fn record_tree_area_link(method: &'static str) {
    ::metrics::counter!(MetricName::TreeAreaLinks.as_str(), "method" => method).increment(1);
}

pub fn record_asset_history(change_type: &'static str) {
    ::metrics::counter!(MetricName::AssetHistoryRows.as_str(), "change_type" => change_type)
        .increment(1);
}
