// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{PrometheusMetrics, REQUEST_DURATION_BUCKETS_MS};

use crate::error::Result;

/// Body served by `/metrics` when metrics are disabled.
pub const PLACEHOLDER_METRICS: &str = "mock_metrics";

/// Outcome label shared by the upload and AI call counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Success,
    Fail,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Fail => "fail",
        }
    }
}

/// Sink for the gateway's counters and histograms.
///
/// Implementations must tolerate concurrent calls from many in-flight requests.
pub trait MetricsRecorder: Send + Sync {
    /// Increments `image_upload_total{status}`.
    fn record_upload(&self, status: CallStatus);

    /// Increments `ai_api_call_total{status}`.
    fn record_ai_call(&self, status: CallStatus);

    /// Observes `http_request_duration_ms{method,route,code}`.
    fn observe_request(&self, method: &str, route: &str, code: u16, duration_ms: f64);

    /// Text exposition of every registered metric.
    fn render(&self) -> Result<String>;

    /// `Content-Type` of [`MetricsRecorder::render`] output.
    fn content_type(&self) -> &'static str;
}

/// Discards everything; used in test mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn record_upload(&self, _status: CallStatus) {}

    fn record_ai_call(&self, _status: CallStatus) {}

    fn observe_request(&self, _method: &str, _route: &str, _code: u16, _duration_ms: f64) {}

    fn render(&self) -> Result<String> {
        Ok(PLACEHOLDER_METRICS.to_string())
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }
}
