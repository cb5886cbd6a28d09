//! Unhandled-fault reporting.
//!
//! Handlers never log or transform the faults they raise. [`ApiError`]
//! attaches the fault to the 500 response and [`report_faults`] picks it up
//! here: it logs the full cause chain and replaces the body according to the
//! hosting environment.
//!
//! [`ApiError`]: crate::error::ApiError

use std::error::Error;

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use demo_core::OperationFailure;
use tracing::error;

use crate::{config::Environment, state::SharedState};

/// Header set by the request-id layer.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Separator between causes in the logged chain.
pub const CHAIN_SEPARATOR: &str = " ---> ";

/// Body sent for unhandled faults outside Development.
pub const GENERIC_FAULT_BODY: &str = "Internal Server Error";

/// Response extension carrying a fault raised by a handler.
#[derive(Debug, Clone)]
pub struct ReportedFault(pub OperationFailure);

/// Messages of `err` and every `source()` below it, outermost first.
#[must_use]
pub fn cause_chain(err: &(dyn Error + 'static)) -> Vec<String> {
    std::iter::successors(Some(err), |&e| e.source()).map(ToString::to_string).collect()
}

/// Log and render any fault attached to the response.
pub async fn report_faults(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    let mut response = next.run(req).await;
    let Some(ReportedFault(fault)) = response.extensions_mut().remove::<ReportedFault>() else {
        return response;
    };

    let chain = cause_chain(&fault);
    error!(
        request_id = %request_id,
        method = %method,
        path = %path,
        depth = chain.len(),
        chain = %chain.join(CHAIN_SEPARATOR),
        "unhandled fault"
    );
    render_fault(&chain, &state.environment)
}

/// The 500 response for a fault chain.
///
/// Development shows one message per line, outermost first; every other
/// environment gets a generic body.
#[must_use]
pub fn render_fault(chain: &[String], environment: &Environment) -> Response {
    let body = if environment.is_development() {
        chain.join("\n")
    } else {
        GENERIC_FAULT_BODY.to_owned()
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use demo_core::ErrorScenario;

    use super::*;

    async fn body_text(resp: Response) -> String {
        let bytes = match axum::body::to_bytes(resp.into_body(), 4096).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn cause_chain_walks_every_source() {
        let fault = ErrorScenario::TripleNested.failure();
        assert_eq!(cause_chain(&fault), vec!["Outer error", "Inner error", "Error error error!"]);
    }

    #[tokio::test]
    async fn development_renders_the_chain() {
        let chain = cause_chain(&ErrorScenario::DoubleNested.failure());
        let resp = render_fault(&chain, &Environment::Development);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(resp).await, "Outer error\nError error error!");
    }

    #[tokio::test]
    async fn production_hides_the_chain() {
        let chain = cause_chain(&ErrorScenario::Single.failure());
        let resp = render_fault(&chain, &Environment::Production);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(resp).await, "Internal Server Error");
    }
}
