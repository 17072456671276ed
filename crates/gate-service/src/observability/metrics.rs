//! Metrics definitions for the gate service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gate_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: the routed paths plus `/other`
//! - `outcome`: allow, deny
//! - `reason`: bounded by `AuthError::reason` plus `disabled`, `verified`, `api_token`
//! - `status`: success, error
//! - `result`: hit, miss

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle for serving
/// metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("gate_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Cache hits are sub-millisecond; misses include a JWKS round trip
        .set_buckets_for_metric(
            Matcher::Full("gate_auth_duration_seconds".to_string()),
            &[
                0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set auth duration buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("gate_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `gate_http_requests_total`, `gate_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures every response, including 401s from the gates and framework
/// errors such as 404 and 405.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("gate_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("gate_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        401 | 403 => "unauthorized",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Unknown paths collapse to `/other` so scanners cannot inflate cardinality.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/api/v1/me" => "/api/v1/me",
        "/api/v1/ping" => "/api/v1/ping",
        _ => "/other",
    }
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record a gate decision.
///
/// Metric: `gate_auth_decisions_total`, `gate_auth_duration_seconds`
/// Labels: `outcome`, `reason`
pub fn record_auth_decision(outcome: &'static str, reason: &'static str, duration: Duration) {
    histogram!("gate_auth_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("gate_auth_decisions_total",
        "outcome" => outcome,
        "reason" => reason
    )
    .increment(1);
}

/// Record a key set fetch.
///
/// Metric: `gate_jwks_fetch_total`, `gate_jwks_fetch_duration_seconds`
/// Labels: `status`
pub fn record_jwks_fetch(status: &'static str, duration: Duration) {
    histogram!("gate_jwks_fetch_duration_seconds",
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("gate_jwks_fetch_total",
        "status" => status
    )
    .increment(1);
}

/// Record a key cache lookup.
///
/// Metric: `gate_key_cache_lookups_total`
/// Labels: `result` (hit, miss)
pub fn record_key_cache_lookup(result: &'static str) {
    counter!("gate_key_cache_lookups_total",
        "result" => result
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    fn counter_value(
        snapshot: &[(
            metrics_util::CompositeKey,
            Option<metrics::Unit>,
            Option<metrics::SharedString>,
            DebugValue,
        )],
        name: &str,
        label: (&str, &str),
    ) -> u64 {
        snapshot
            .iter()
            .filter(|(key, _, _, _)| key.key().name() == name)
            .filter(|(key, _, _, _)| {
                key.key()
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1)
            })
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(n) => *n,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_record_functions_without_recorder() {
        // Falls through to the no-op recorder
        record_http_request("GET", "/health", 200, Duration::from_millis(5));
        record_auth_decision("deny", "expired", Duration::from_millis(1));
        record_jwks_fetch("error", Duration::from_millis(100));
        record_key_cache_lookup("miss");
    }

    #[test]
    fn test_recorded_values() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_auth_decision("deny", "unknown_key", Duration::from_millis(3));
            record_auth_decision("deny", "unknown_key", Duration::from_millis(3));
            record_auth_decision("allow", "verified", Duration::from_millis(1));
            record_jwks_fetch("success", Duration::from_millis(40));
            record_key_cache_lookup("hit");
            record_key_cache_lookup("miss");
            record_key_cache_lookup("hit");
        });

        let snapshot = snapshotter.snapshot().into_vec();

        assert_eq!(
            counter_value(&snapshot, "gate_auth_decisions_total", ("reason", "unknown_key")),
            2
        );
        assert_eq!(
            counter_value(&snapshot, "gate_auth_decisions_total", ("outcome", "allow")),
            1
        );
        assert_eq!(
            counter_value(&snapshot, "gate_jwks_fetch_total", ("status", "success")),
            1
        );
        assert_eq!(
            counter_value(&snapshot, "gate_key_cache_lookups_total", ("result", "hit")),
            2
        );
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(401), "unauthorized");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(503), "error");
        assert_eq!(categorize_status_code(404), "error");
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/ready"), "/ready");
        assert_eq!(normalize_endpoint("/api/v1/me"), "/api/v1/me");
        assert_eq!(normalize_endpoint("/api/v1/ping"), "/api/v1/ping");
        assert_eq!(normalize_endpoint("/api/v1/me/extra"), "/other");
        assert_eq!(normalize_endpoint("/wp-admin"), "/other");
    }
}
