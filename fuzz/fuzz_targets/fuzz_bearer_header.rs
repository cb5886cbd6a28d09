//! Fuzz target: `Authorization` header parsing.
//!
//! Verifies that arbitrary header bytes never panic the bearer extractor
//! and that any extracted token is non-empty and trimmed.

#![no_main]

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use demo_api::auth::bearer_token;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = HeaderValue::from_bytes(data) else {
        return;
    };
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    if let Some(token) = bearer_token(&headers) {
        assert!(!token.is_empty());
        assert_eq!(token, token.trim());
    }
});
