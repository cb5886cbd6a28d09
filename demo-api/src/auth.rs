//! Bearer credential extraction and JWT validation.
//!
//! Only routes marked [`AuthRequirement::Policy`](demo_core::AuthRequirement)
//! ever look at the `Authorization` header.

use std::collections::HashMap;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use demo_core::{Credential, Principal};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::config::SigningKey;

/// Errors produced while validating a bearer token.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No signing key is configured, so no token can be trusted.
    #[error("token validation is not configured")]
    NotConfigured,

    /// The configured key material could not be loaded.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// Signature, expiry, or structure check failed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Turns a raw bearer token into a [`Principal`].
pub trait TokenValidator: Send + Sync {
    /// # Errors
    /// Returns [`AuthError`] if the token cannot be trusted.
    fn validate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Validator used when no signing key is configured. Rejects everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl TokenValidator for RejectAll {
    fn validate(&self, _token: &str) -> Result<Principal, AuthError> {
        Err(AuthError::NotConfigured)
    }
}

/// JWT validator with a fixed key.
///
/// Audience and issuer are not checked; expiry is.
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
    authority: Option<String>,
}

impl JwtValidator {
    /// HS256 validator with a shared secret.
    #[must_use]
    pub fn hs256(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// RS256 validator with a PEM-encoded public key.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidKey`] if the PEM cannot be parsed.
    pub fn rs256_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        Self { key, validation, authority: None }
    }

    /// Record the authority that issues tokens. Informational only.
    #[must_use]
    pub fn with_authority(mut self, authority: Option<String>) -> Self {
        self.authority = authority;
        self
    }

    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }
}

impl TokenValidator for JwtValidator {
    fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<HashMap<String, Value>>(token, &self.key, &self.validation)?;
        Ok(Principal::new(data.claims))
    }
}

/// Build the validator for the configured key, or [`RejectAll`] when none is set.
///
/// # Errors
/// Returns [`AuthError::InvalidKey`] if an RSA key is configured but malformed.
pub fn validator_for(
    key: Option<&SigningKey>,
    authority: Option<String>,
) -> Result<Box<dyn TokenValidator>, AuthError> {
    let validator: Box<dyn TokenValidator> = match key {
        Some(SigningKey::Secret(secret)) => Box::new(JwtValidator::hs256(secret.as_bytes()).with_authority(authority)),
        Some(SigningKey::RsaPem(pem)) => Box::new(JwtValidator::rs256_pem(pem.as_bytes())?.with_authority(authority)),
        None => Box::new(RejectAll),
    };
    Ok(validator)
}

/// The raw token from `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Classify the request's credential for the authorization gate.
pub fn credential(headers: &HeaderMap, validator: &dyn TokenValidator) -> Credential {
    match bearer_token(headers) {
        None => Credential::Missing,
        Some(token) => match validator.validate(token) {
            Ok(principal) => Credential::Valid(principal),
            Err(e) => Credential::Invalid(e.to_string()),
        },
    }
}
