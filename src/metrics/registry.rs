// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use super::{CallStatus, MetricsRecorder};
use crate::error::{GatewayError, Result};
use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec,
    Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

/// Millisecond buckets for `http_request_duration_ms`.
pub const REQUEST_DURATION_BUCKETS_MS: &[f64] = &[
    0.1, 5.0, 15.0, 50.0, 100.0, 200.0, 300.0, 400.0, 500.0, 1000.0, 2000.0, 5000.0,
];

/// Process-wide metrics store, created once at startup and shared through
/// the router state.
pub struct PrometheusMetrics {
    registry: Registry,

    // ============================================================================
    // UPLOAD METRICS
    // ============================================================================
    /// Total uploads by outcome
    image_uploads: CounterVec,

    // ============================================================================
    // AI METRICS
    // ============================================================================
    /// Total generateContent calls by outcome
    ai_api_calls: CounterVec,

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================
    /// Request duration histogram, in milliseconds
    request_duration: HistogramVec,
}

impl PrometheusMetrics {
    /// Registers every collector on a fresh registry.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let request_duration = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "http_request_duration_ms",
                "Duration of HTTP requests in milliseconds"
            )
            .buckets(REQUEST_DURATION_BUCKETS_MS.to_vec()),
            &["method", "route", "code"],
            registry
        )?;

        let image_uploads = register_counter_vec_with_registry!(
            Opts::new("image_upload_total", "Total number of uploaded images"),
            &["status"], // status: success, fail
            registry
        )?;

        let ai_api_calls = register_counter_vec_with_registry!(
            Opts::new("ai_api_call_total", "Total number of calls to the AI API"),
            &["status"], // status: success, fail
            registry
        )?;

        // Empty families are pruned from gather(), so every family gets its
        // known series up front and shows up on the first scrape
        for status in [CallStatus::Success, CallStatus::Fail] {
            image_uploads.with_label_values(&[status.as_str()]);
            ai_api_calls.with_label_values(&[status.as_str()]);
        }
        // The histogram has no natural zero value; this placeholder series
        // reports a zero count until the first upload is observed
        request_duration.with_label_values(&["POST", "/upload", "200"]);

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            image_uploads,
            ai_api_calls,
            request_duration,
        })
    }
}

impl MetricsRecorder for PrometheusMetrics {
    fn record_upload(&self, status: CallStatus) {
        self.image_uploads
            .with_label_values(&[status.as_str()])
            .inc();
    }

    fn record_ai_call(&self, status: CallStatus) {
        self.ai_api_calls.with_label_values(&[status.as_str()]).inc();
    }

    fn observe_request(&self, method: &str, route: &str, code: u16, duration_ms: f64) {
        self.request_duration
            .with_label_values(&[method, route, &code.to_string()])
            .observe(duration_ms);
    }

    /// Gather all metrics and return as Prometheus text format
    fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| GatewayError::Internal(format!("Metrics are not UTF-8: {}", e)))
    }

    fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let metrics = PrometheusMetrics::new().unwrap();
        let text = metrics.render().unwrap();

        for family in ["image_upload_total", "ai_api_call_total"] {
            assert!(text.contains(&format!("# HELP {}", family)));
            assert!(text.contains(&format!("# TYPE {} counter", family)));
            assert!(text.contains(&format!("{}{{status=\"success\"}} 0", family)));
            assert!(text.contains(&format!("{}{{status=\"fail\"}} 0", family)));
        }

        assert!(text.contains("# HELP http_request_duration_ms"));
        assert!(text.contains("# TYPE http_request_duration_ms histogram"));
        assert!(text.contains(
            "http_request_duration_ms_count{code=\"200\",method=\"POST\",route=\"/upload\"} 0"
        ));
    }

    #[test]
    fn test_counters_increment_per_label() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_upload(CallStatus::Success);
        metrics.record_upload(CallStatus::Success);
        metrics.record_upload(CallStatus::Fail);
        metrics.record_ai_call(CallStatus::Fail);

        let text = metrics.render().unwrap();
        assert!(text.contains("image_upload_total{status=\"success\"} 2"));
        assert!(text.contains("image_upload_total{status=\"fail\"} 1"));
        assert!(text.contains("ai_api_call_total{status=\"fail\"} 1"));
        assert!(text.contains("ai_api_call_total{status=\"success\"} 0"));
    }

    #[test]
    fn test_histogram_observation() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.observe_request("POST", "/upload", 200, 42.0);

        let text = metrics.render().unwrap();
        assert!(text.contains("# TYPE http_request_duration_ms histogram"));
        assert!(text.contains(
            "http_request_duration_ms_count{code=\"200\",method=\"POST\",route=\"/upload\"} 1"
        ));
        assert!(text.contains(
            "http_request_duration_ms_bucket{code=\"200\",method=\"POST\",route=\"/upload\",le=\"50\"} 1"
        ));
    }

    #[test]
    fn test_registries_are_isolated() {
        let first = PrometheusMetrics::new().unwrap();
        let second = PrometheusMetrics::new().unwrap();
        first.record_upload(CallStatus::Success);

        let text = second.render().unwrap();
        assert!(text.contains("image_upload_total{status=\"success\"} 0"));
    }
}
