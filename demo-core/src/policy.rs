//! Claim-based authorization policy.
//!
//! The policy is built once at startup and shared read-only with the gate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claim key checked by the default policy.
pub const SCOPE_CLAIM: &str = "scope";
/// Scope value machine clients must present.
pub const MACHINE_ACCESS_SCOPE: &str = "core.demo-api-machineaccess";

/// A single `key = value` claim the principal must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequirement {
    pub key: String,
    pub value: String,
}

impl ClaimRequirement {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// Whether `principal` carries this claim.
    ///
    /// A claim matches when it is the exact string, a space-separated list
    /// containing it (the OAuth `scope` form), or an array containing it.
    #[must_use]
    pub fn is_satisfied_by(&self, principal: &Principal) -> bool {
        match principal.claim(&self.key) {
            Some(Value::String(s)) => s.split_whitespace().any(|v| v == self.value),
            Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(self.value.as_str())),
            _ => false,
        }
    }
}

/// Requirements a principal must meet on routes that are not anonymous-exempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationPolicy {
    required_claims: Vec<ClaimRequirement>,
}

impl AuthorizationPolicy {
    /// Policy with an explicit claim list. An empty list admits any
    /// authenticated principal.
    #[must_use]
    pub fn new(required_claims: Vec<ClaimRequirement>) -> Self {
        Self { required_claims }
    }

    #[must_use]
    pub fn required_claims(&self) -> &[ClaimRequirement] {
        &self.required_claims
    }

    /// The first requirement `principal` fails, if any.
    #[must_use]
    pub fn unmet_requirement(&self, principal: &Principal) -> Option<&ClaimRequirement> {
        self.required_claims.iter().find(|r| !r.is_satisfied_by(principal))
    }

    #[must_use]
    pub fn permits(&self, principal: &Principal) -> bool {
        self.unmet_requirement(principal).is_none()
    }
}

impl Default for AuthorizationPolicy {
    /// Requires `scope = core.demo-api-machineaccess`.
    fn default() -> Self {
        Self::new(vec![ClaimRequirement::new(SCOPE_CLAIM, MACHINE_ACCESS_SCOPE)])
    }
}

/// The claim set of an authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal {
    claims: HashMap<String, Value>,
}

impl Principal {
    #[must_use]
    pub fn new(claims: HashMap<String, Value>) -> Self {
        Self { claims }
    }

    #[must_use]
    pub fn claim(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }

    /// The `sub` claim, when present as a string.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claim("sub").and_then(Value::as_str)
    }
}

impl FromIterator<(String, Value)> for Principal {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { claims: iter.into_iter().collect() }
    }
}

/// Whether a route bypasses the default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthRequirement {
    /// Invoked without looking at credentials.
    Anonymous,
    /// Requires an authenticated principal that satisfies the policy.
    Policy,
}

/// Outcome of presenting a credential on an [`AuthRequirement::Policy`] route.
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    /// No `Authorization` header, or not a bearer credential.
    Missing,
    /// A bearer token that failed validation.
    Invalid(String),
    /// A validated principal.
    Valid(Principal),
}

/// Why the gate refused to invoke a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No usable credential (401).
    Unauthenticated { reason: String },
    /// Authenticated but missing a required claim (403).
    Forbidden { missing: ClaimRequirement },
}

/// Gate decision for a matched route.
///
/// Anonymous routes pass without inspecting `credential`, so callers may
/// pass [`Credential::Missing`] without doing any work to extract one.
///
/// # Errors
/// Returns [`Rejection`] when the route requires the policy and the
/// credential is absent, invalid, or lacks a required claim.
pub fn authorize(
    requirement: AuthRequirement,
    policy: &AuthorizationPolicy,
    credential: Credential,
) -> Result<Option<Principal>, Rejection> {
    match requirement {
        AuthRequirement::Anonymous => Ok(None),
        AuthRequirement::Policy => match credential {
            Credential::Missing => Err(Rejection::Unauthenticated {
                reason: "missing bearer credential".to_owned(),
            }),
            Credential::Invalid(reason) => Err(Rejection::Unauthenticated { reason }),
            Credential::Valid(principal) => match policy.unmet_requirement(&principal) {
                Some(missing) => Err(Rejection::Forbidden { missing: missing.clone() }),
                None => Ok(Some(principal)),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn principal(claims: Value) -> Principal {
        match serde_json::from_value(claims) {
            Ok(p) => p,
            Err(e) => panic!("invalid principal fixture: {e}"),
        }
    }

    #[test]
    fn default_policy_requires_machine_access_scope() {
        let policy = AuthorizationPolicy::default();
        assert_eq!(
            policy.required_claims(),
            &[ClaimRequirement::new("scope", "core.demo-api-machineaccess")]
        );
    }

    #[test]
    fn scope_claim_matches_exact_list_and_array_forms() {
        let policy = AuthorizationPolicy::default();
        assert!(policy.permits(&principal(json!({"scope": "core.demo-api-machineaccess"}))));
        assert!(policy.permits(&principal(json!({"scope": "openid core.demo-api-machineaccess"}))));
        assert!(policy.permits(&principal(json!({"scope": ["a", "core.demo-api-machineaccess"]}))));
    }

    #[test]
    fn scope_claim_rejects_prefixes_and_wrong_types() {
        let policy = AuthorizationPolicy::default();
        assert!(!policy.permits(&principal(json!({"scope": "core.demo-api"}))));
        assert!(!policy.permits(&principal(json!({"scope": 42}))));
        assert!(!policy.permits(&principal(json!({"sub": "client"}))));
    }

    #[test]
    fn anonymous_route_ignores_credentials() {
        let policy = AuthorizationPolicy::default();
        let decision = authorize(AuthRequirement::Anonymous, &policy, Credential::Invalid("bad".into()));
        assert_eq!(decision, Ok(None));
    }

    #[test]
    fn policy_route_without_credential_is_unauthenticated() {
        let policy = AuthorizationPolicy::default();
        let decision = authorize(AuthRequirement::Policy, &policy, Credential::Missing);
        assert!(matches!(decision, Err(Rejection::Unauthenticated { .. })));
    }

    #[test]
    fn policy_route_without_scope_is_forbidden() {
        let policy = AuthorizationPolicy::default();
        let cred = Credential::Valid(principal(json!({"sub": "client", "scope": "other"})));
        match authorize(AuthRequirement::Policy, &policy, cred) {
            Err(Rejection::Forbidden { missing }) => assert_eq!(missing.key, "scope"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn policy_route_with_scope_yields_principal() {
        let policy = AuthorizationPolicy::default();
        let p = principal(json!({"sub": "client", "scope": "core.demo-api-machineaccess"}));
        match authorize(AuthRequirement::Policy, &policy, Credential::Valid(p)) {
            Ok(Some(p)) => assert_eq!(p.subject(), Some("client")),
            other => panic!("expected principal, got {other:?}"),
        }
    }
}
