//! Axum router and request dispatch for the demo API.

use axum::{
    extract::State,
    http::{header::STRICT_TRANSPORT_SECURITY, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use demo_core::{authorize, AuthRequirement, Credential, Resolution};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::debug;

use crate::{
    auth,
    error::ApiError,
    metrics::{self, HEALTH_PATH, METRICS_PATH},
    report::report_faults,
    state::SharedState,
};

/// Body returned by the liveness probe.
pub const HEALTHY_BODY: &str = "Healthy";

/// HSTS value sent outside Development (30 days).
pub const HSTS_VALUE: &str = "max-age=2592000";

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router.
///
/// `/health` and `/metrics` are plain axum routes. Everything else falls
/// through to [`dispatch`], which consults the state's route table.
pub fn create_router(state: SharedState) -> Router {
    let router = Router::new()
        .route(HEALTH_PATH, get(health))
        .route(METRICS_PATH, get(metrics::scrape))
        .fallback(dispatch)
        .layer(middleware::from_fn_with_state(state.clone(), report_faults))
        .layer(middleware::from_fn_with_state(state.clone(), metrics::track_requests))
        .with_state(state.clone());

    let router = if state.environment.is_development() {
        router
    } else {
        router.layer(SetResponseHeaderLayer::overriding(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        ))
    };

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health` — liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, HEALTHY_BODY)
}

/// Route-table dispatch for `/`, `/color`, and `/error`.
///
/// Case variants of `/health` and `/metrics` miss the axum routes and land
/// here too; they are served without consulting the table.
///
/// # Errors
/// Returns [`ApiError::NotFound`] or [`ApiError::MethodNotAllowed`] when the
/// table has no entry, [`ApiError::Unauthorized`] or [`ApiError::Forbidden`]
/// when the gate rejects the request, and [`ApiError::Operation`] when the
/// handler raises a fault.
pub async fn dispatch(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(builtin) = metrics::builtin_path(uri.path()) {
        if method != Method::GET && method != Method::HEAD {
            return Err(ApiError::MethodNotAllowed { allowed: vec![Method::GET, Method::HEAD] });
        }
        return Ok(if builtin == HEALTH_PATH {
            health().await.into_response()
        } else {
            metrics::scrape(State(state)).await.into_response()
        });
    }

    let entry = match state.routes.resolve(&method, uri.path()) {
        Resolution::Matched(entry) => entry,
        Resolution::MethodNotAllowed { allowed, .. } => return Err(ApiError::MethodNotAllowed { allowed }),
        Resolution::Unmatched => return Err(ApiError::NotFound(uri.path().to_owned())),
    };

    let credential = match entry.auth {
        AuthRequirement::Anonymous => Credential::Missing,
        AuthRequirement::Policy => auth::credential(&headers, state.validator.as_ref()),
    };
    let principal = authorize(entry.auth, &state.policy, credential)?;
    debug!(
        endpoint = %entry.endpoint,
        subject = principal.as_ref().and_then(|p| p.subject()).unwrap_or("anonymous"),
        "invoking endpoint"
    );

    let body = entry.endpoint.invoke(state.rng.as_ref())?;
    Ok((StatusCode::OK, body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Environment, state::AppState};
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request},
    };
    use demo_core::random::FixedRandom;
    use tower::ServiceExt;

    async fn get_path(app: Router, path: &str) -> Response {
        let req = match Request::builder().uri(path).body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        }
    }

    async fn body_text(resp: Response) -> String {
        let bytes = match axum::body::to_bytes(resp.into_body(), 4096).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn health_returns_healthy() {
        let app = create_router(AppState::new(Environment::Production).shared());
        let resp = get_path(app, "/health").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "Healthy");
    }

    #[tokio::test]
    async fn root_returns_ok_as_plain_text() {
        let app = create_router(AppState::new(Environment::Production).shared());
        let resp = get_path(app, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_owned);
        assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
        assert_eq!(body_text(resp).await, "Ok");
    }

    #[tokio::test]
    async fn color_uses_injected_random_source() {
        let state = AppState::new(Environment::Production).with_rng(FixedRandom(3)).shared();
        let resp = get_path(create_router(state), "/color").await;
        assert_eq!(body_text(resp).await, "yellow");
    }

    #[tokio::test]
    async fn production_sets_hsts_and_development_does_not() {
        let prod = get_path(create_router(AppState::new(Environment::Production).shared()), "/").await;
        assert_eq!(
            prod.headers().get(STRICT_TRANSPORT_SECURITY).and_then(|v| v.to_str().ok()),
            Some(HSTS_VALUE)
        );
        let dev = get_path(create_router(AppState::new(Environment::Development).shared()), "/").await;
        assert!(dev.headers().get(STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[tokio::test]
    async fn builtin_paths_ignore_case() {
        let app = create_router(AppState::new(Environment::Production).shared());
        let resp = get_path(app.clone(), "/HEALTH").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "Healthy");
        let resp = get_path(app, "/Metrics/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("# TYPE http_requests_received_total counter"));
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let app = create_router(AppState::new(Environment::Production).shared());
        let resp = get_path(app, "/color").await;
        assert!(resp.headers().get("x-request-id").is_some(), "request id must be propagated");
    }

    #[tokio::test]
    async fn error_in_development_shows_the_chain() {
        let state = AppState::new(Environment::Development).with_rng(FixedRandom(2)).shared();
        let resp = get_path(create_router(state), "/error").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(resp).await, "Outer error\nInner error\nError error error!");
    }
}
