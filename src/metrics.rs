// Prometheus metrics for the gateway, the handshake and the stub backend.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gateway ──────────────────────────────────────────────────────

    /// Gateway calls, by operation and outcome (`ok`, a status code, or an error kind).
    pub static ref GATEWAY_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("miniapp_gateway_requests_total", "Total gateway calls"),
        &["operation", "outcome"],
    )
    .unwrap();

    /// Retries issued by the gateway, by operation.
    pub static ref GATEWAY_RETRIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("miniapp_gateway_retries_total", "Gateway retries after transient failures"),
        &["operation"],
    )
    .unwrap();

    /// Wall time of a gateway call including retries.
    pub static ref GATEWAY_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "miniapp_gateway_request_duration_seconds",
            "Gateway call duration in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0]),
        &["operation"],
    )
    .unwrap();

    // ── Handshake ────────────────────────────────────────────────────

    /// Verification handshakes, by outcome.
    pub static ref HANDSHAKE_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("miniapp_handshake_total", "Identity verification handshakes"),
        &["outcome"],
    )
    .unwrap();

    // ── Stub backend ─────────────────────────────────────────────────

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("miniapp_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();
}

static REGISTER: Once = Once::new();

/// Register all metrics with the custom registry. Safe to call repeatedly.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(GATEWAY_REQUESTS_TOTAL.clone()),
            Box::new(GATEWAY_RETRIES_TOTAL.clone()),
            Box::new(GATEWAY_REQUEST_DURATION_SECONDS.clone()),
            Box::new(HANDSHAKE_TOTAL.clone()),
            Box::new(API_REQUESTS_TOTAL.clone()),
        ];

        for c in collectors {
            if let Err(e) = REGISTRY.register(c) {
                tracing::warn!("failed to register metric: {e}");
            }
        }
    });
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Normalize a URL path for metric labels: replace numeric path segments with `:id`
/// to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
