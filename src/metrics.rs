use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::warn;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true) // Enabled by default
    })
}

/// Initialize Prometheus metrics exporter with upkeep task
/// Returns None if observability is disabled or the recorder cannot be installed
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )
        .and_then(|builder| {
            builder.set_buckets_for_metric(
                Matcher::Full("permission_guard_wait_seconds".to_string()),
                &[0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 3.0, 6.0, 10.0],
            )
        });

    let handle = match builder.and_then(|builder| builder.install_recorder()) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
            return None;
        }
    };

    // Spawn upkeep task to clean stale metrics
    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router serving the Prometheus scrape endpoint
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Permission store metrics

pub fn track_permission_fetch_attempt() {
    if !is_observability_enabled() {
        return;
    }
    counter!("permission_fetch_attempts_total").increment(1);
}

pub fn track_permission_fetch_retry() {
    if !is_observability_enabled() {
        return;
    }
    counter!("permission_fetch_retries_total").increment(1);
}

/// Retries ran out and the store fell back to empty permissions
pub fn track_permission_fetch_failure() {
    if !is_observability_enabled() {
        return;
    }
    counter!("permission_fetch_failures_total").increment(1);
}

pub fn set_open_sessions(count: usize) {
    if !is_observability_enabled() {
        return;
    }
    gauge!("permission_sessions_open").set(count as f64);
}

// Route guard metrics

pub fn track_guard_outcome(outcome: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("route_guard_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn track_guard_wait(duration: Duration) {
    if !is_observability_enabled() {
        return;
    }
    histogram!("permission_guard_wait_seconds").record(duration.as_secs_f64());
}
