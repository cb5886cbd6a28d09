//! In-process request counters with a Prometheus text scrape endpoint.

use std::{fmt::Write as _, sync::RwLock};

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use demo_core::{route::normalize_path, Resolution, RouteTable};
use indexmap::IndexMap;

use crate::state::SharedState;

pub const REQUESTS_METRIC: &str = "http_requests_received_total";
pub const HEALTH_PATH: &str = "/health";
pub const METRICS_PATH: &str = "/metrics";
/// Route label for requests no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";
/// Method label for extension methods.
pub const OTHER_METHOD: &str = "OTHER";

const STANDARD_METHODS: [&str; 9] = ["GET", "HEAD", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "TRACE", "CONNECT"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetricKey {
    method: &'static str,
    route: String,
    code: u16,
}

/// Request counts keyed by method, route label, and status code.
///
/// Keys render in first-seen order.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    counters: RwLock<IndexMap<MetricKey, u64>>,
}

impl RequestMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed request.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn record(&self, method: &Method, route: &str, status: StatusCode) {
        let key = MetricKey { method: method_label(method), route: route.to_owned(), code: status.as_u16() };
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut counters = self.counters.write().expect("metrics write lock poisoned");
        *counters.entry(key).or_insert(0) += 1;
    }

    /// Current count for one key, `0` if never seen.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn count(&self, method: &Method, route: &str, status: StatusCode) -> u64 {
        let key = MetricKey { method: method_label(method), route: route.to_owned(), code: status.as_u16() };
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let counters = self.counters.read().expect("metrics read lock poisoned");
        counters.get(&key).copied().unwrap_or(0)
    }

    /// Prometheus text exposition of every counter.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# HELP {REQUESTS_METRIC} Total HTTP requests processed, by method, route and status code.");
        let _ = writeln!(out, "# TYPE {REQUESTS_METRIC} counter");
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let counters = self.counters.read().expect("metrics read lock poisoned");
        for (key, count) in counters.iter() {
            let _ = writeln!(
                out,
                "{REQUESTS_METRIC}{{code=\"{}\",method=\"{}\",route=\"{}\"}} {count}",
                key.code,
                key.method,
                escape_label(&key.route)
            );
        }
        out
    }
}

/// Label for `method`. Anything outside the standard methods collapses to
/// [`OTHER_METHOD`].
#[must_use]
pub fn method_label(method: &Method) -> &'static str {
    STANDARD_METHODS.into_iter().find(|m| *m == method.as_str()).unwrap_or(OTHER_METHOD)
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Label for `path`: the canonical route, or [`UNMATCHED_ROUTE`].
///
/// Labels come from a closed set so arbitrary request paths never become
/// label values.
#[must_use]
pub fn route_label(routes: &RouteTable, method: &Method, path: &str) -> String {
    if let Some(builtin) = builtin_path(path) {
        return builtin.to_owned();
    }
    match routes.resolve(method, path) {
        Resolution::Matched(entry) => entry.label(),
        Resolution::MethodNotAllowed { path, .. } => format!("/{path}"),
        Resolution::Unmatched => UNMATCHED_ROUTE.to_owned(),
    }
}

/// [`HEALTH_PATH`] or [`METRICS_PATH`] when `path` names one of them,
/// ignoring case and a trailing `/`.
#[must_use]
pub fn builtin_path(path: &str) -> Option<&'static str> {
    let wanted = normalize_path(path);
    [HEALTH_PATH, METRICS_PATH].into_iter().find(|p| normalize_path(p).eq_ignore_ascii_case(wanted))
}

/// Middleware counting every request once its response is ready.
pub async fn track_requests(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let route = route_label(&state.routes, &method, req.uri().path());
    let response = next.run(req).await;
    state.metrics.record(&method, &route, response.status());
    response
}

/// `GET /metrics` — Prometheus scrape endpoint.
pub async fn scrape(State(state): State<SharedState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"))],
        state.metrics.render(),
    )
}
