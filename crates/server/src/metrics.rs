// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros, a route
//! middleware recording request counts and durations labeled by route name, and an
//! Axum-compatible metrics handler.

use std::{sync::LazyLock, time::Instant};

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};
use tracing::error;

/// Total number of HTTP requests served, labeled by route name, method and status.
pub static HTTP_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests, labeled by route, method and status",
        &["route", "method", "status"]
    )
    .expect("Failed to create http_requests_total counter vec")
});

/// Histogram for request handling durations in seconds.
pub static HTTP_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request handling durations in seconds",
        &["route", "method"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to create http request duration histogram")
});

/// Server shutdowns, labeled by outcome (`graceful`, `deadline_exceeded` or `failed`).
pub static SERVER_SHUTDOWNS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "server_shutdowns_total",
        "Total number of server shutdowns, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create server_shutdowns_total counter vec")
});

/// Name of the route a request was matched to, used as the `route` label
#[derive(Debug, Clone)]
pub struct RouteLabel(pub String);

/// Record a finished request
///
/// # Arguments
/// * `route` - The name of the matched route
/// * `method` - The HTTP method
/// * `status` - The response status code
/// * `duration_secs` - Handling time in seconds
pub fn observe_request(route: &str, method: &str, status: StatusCode, duration_secs: f64) {
    HTTP_REQUESTS
        .with_label_values(&[route, method, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[route, method])
        .observe(duration_secs);
}

/// Record the outcome of a server shutdown
///
/// # Arguments
/// * `outcome` - `graceful` when connections drained in time, `deadline_exceeded` when
///   they did not, `failed` when the engine died on its own
pub fn record_shutdown(outcome: &str) {
    SERVER_SHUTDOWNS.with_label_values(&[outcome]).inc();
}

/// Route middleware timing the handler and recording the result under the route name
pub async fn track_route(
    State(RouteLabel(route)): State<RouteLabel>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    observe_request(
        &route,
        method.as_str(),
        response.status(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
