//! Shared, immutable request-handling state.

use std::sync::Arc;

use demo_core::{AuthorizationPolicy, RandomSource, RouteTable, ThreadRandom};
use tracing::info;

use crate::{
    auth::{validator_for, AuthError, RejectAll, TokenValidator},
    config::{ApiConfig, Environment},
    metrics::RequestMetrics,
};

/// Everything a request needs, built once at startup.
///
/// Only the metrics counters change after construction.
pub struct AppState {
    pub routes: RouteTable,
    pub policy: AuthorizationPolicy,
    pub rng: Box<dyn RandomSource>,
    pub validator: Box<dyn TokenValidator>,
    pub metrics: RequestMetrics,
    pub environment: Environment,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Standard routes and policy, thread-local randomness, and no token
    /// validation.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            routes: RouteTable::standard(),
            policy: AuthorizationPolicy::default(),
            rng: Box::new(ThreadRandom::new()),
            validator: Box::new(RejectAll),
            metrics: RequestMetrics::new(),
            environment,
        }
    }

    /// Build state from loaded configuration.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidKey`] if the configured signing key is malformed.
    pub fn from_config(config: &ApiConfig) -> Result<Self, AuthError> {
        let validator = validator_for(config.signing_key.as_ref(), config.authority.clone())?;
        info!(
            environment = %config.environment,
            authority = config.authority.as_deref().unwrap_or("-"),
            token_validation = config.signing_key.is_some(),
            instrumentation_key_present = !config.instrumentation_key.is_empty(),
            "application state initialised"
        );
        Ok(Self { validator, ..Self::new(config.environment.clone()) })
    }

    #[must_use]
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_rng(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: impl TokenValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    #[must_use]
    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
