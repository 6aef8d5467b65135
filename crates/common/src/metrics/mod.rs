//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all FriendRec metrics
pub const METRICS_PREFIX: &str = "friendrec";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 25ms, P99 < 250ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms - P50 target
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms - P99 target
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s, default engine deadline
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Engine metrics
    describe_counter!(
        format!("{}_recommendations_total", METRICS_PREFIX),
        Unit::Count,
        "Recommendation runs by candidate source"
    );

    describe_histogram!(
        format!("{}_recommendation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end engine latency in seconds"
    );

    describe_counter!(
        format!("{}_backfill_total", METRICS_PREFIX),
        Unit::Count,
        "Candidates appended by backfill, by kind"
    );

    describe_counter!(
        format!("{}_candidates_dropped_total", METRICS_PREFIX),
        Unit::Count,
        "Candidates removed before display, by reason"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: &'static str,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(endpoint: &'static str) -> Self {
        Self {
            start: Instant::now(),
            endpoint,
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "endpoint" => self.endpoint,
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record one finished engine run; `source` is `graph` or `interaction`
pub fn record_recommendation(duration_secs: f64, source: &'static str) {
    counter!(
        format!("{}_recommendations_total", METRICS_PREFIX),
        "source" => source
    )
    .increment(1);

    histogram!(
        format!("{}_recommendation_duration_seconds", METRICS_PREFIX),
        "source" => source
    )
    .record(duration_secs);
}

/// Record backfilled candidates; `kind` is `interaction` or `recent`
pub fn record_backfill(kind: &'static str, count: usize) {
    if count == 0 {
        return;
    }
    counter!(
        format!("{}_backfill_total", METRICS_PREFIX),
        "kind" => kind
    )
    .increment(count as u64);
}

/// Record candidates removed before display
pub fn record_dropped(reason: &'static str, count: usize) {
    if count == 0 {
        return;
    }
    counter!(
        format!("{}_candidates_dropped_total", METRICS_PREFIX),
        "reason" => reason
    )
    .increment(count as u64);
}
