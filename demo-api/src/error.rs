//! Error types for the API crate.

use axum::{
    http::{
        header::{ALLOW, WWW_AUTHENTICATE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use demo_core::{OperationFailure, Rejection};
use serde_json::json;

use crate::report::ReportedFault;

/// Errors that can occur during request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// A handler raised a fault. Rendered by the fault reporter.
    #[error(transparent)]
    Operation(#[from] OperationFailure),

    /// No usable bearer credential on a route that requires one.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the policy's claim requirement is not met.
    #[error("forbidden: missing claim {key}={value}")]
    Forbidden { key: String, value: String },

    /// No route declares this path.
    #[error("no route for {0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("method not allowed")]
    MethodNotAllowed { allowed: Vec<Method> },
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unauthenticated { reason } => Self::Unauthorized(reason),
            Rejection::Forbidden { missing } => Self::Forbidden { key: missing.key, value: missing.value },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Operation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        };
        match self {
            // Left for the fault reporter to log and render.
            ApiError::Operation(fault) => {
                let mut resp = status.into_response();
                resp.extensions_mut().insert(ReportedFault(fault));
                resp
            }
            ApiError::Unauthorized(_) => {
                let mut resp = (status, Json(json!({"error": "unauthorized"}))).into_response();
                resp.headers_mut().insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                resp
            }
            ApiError::MethodNotAllowed { allowed } => {
                let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                let mut resp = (status, Json(json!({"error": "method not allowed"}))).into_response();
                if let Ok(v) = HeaderValue::from_str(&allow) {
                    resp.headers_mut().insert(ALLOW, v);
                }
                resp
            }
            other => (status, Json(json!({"error": other.to_string()}))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demo_core::{ClaimRequirement, ErrorScenario};

    #[test]
    fn api_error_status_codes_map_correctly() {
        let resp = ApiError::NotFound("/nope".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError::Forbidden { key: "scope".to_owned(), value: "x".to_owned() }.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let resp = ApiError::Unauthorized("missing bearer credential".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(WWW_AUTHENTICATE).and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
    }

    #[test]
    fn method_not_allowed_lists_allowed_methods() {
        let resp = ApiError::MethodNotAllowed { allowed: vec![Method::GET] }.into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(ALLOW).and_then(|v| v.to_str().ok()), Some("GET"));
    }

    #[test]
    fn operation_failure_is_attached_for_the_reporter() {
        let fault = ErrorScenario::TripleNested.failure();
        let resp = ApiError::Operation(fault.clone()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "faults must map to 500");
        let attached = resp.extensions().get::<ReportedFault>().map(|r| &r.0);
        assert_eq!(attached, Some(&fault));
    }

    #[test]
    fn forbidden_rejection_names_missing_claim() {
        let err = ApiError::from(Rejection::Forbidden { missing: ClaimRequirement::new("scope", "core.demo-api-machineaccess") });
        assert!(err.to_string().contains("scope=core.demo-api-machineaccess"));
    }
}
