//! Startup configuration read from the process environment.

use std::fmt;
use std::net::SocketAddr;

/// Bind address used when `DEMO_API_LISTEN_ADDR` is unset.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

pub const ENV_LISTEN_ADDR: &str = "DEMO_API_LISTEN_ADDR";
pub const ENV_ENVIRONMENT: &str = "DEMO_API_ENVIRONMENT";
pub const ENV_AUTHORITY: &str = "DEMO_API_AUTHORITY";
pub const ENV_JWT_SECRET: &str = "DEMO_API_JWT_SECRET";
pub const ENV_JWT_PUBLIC_KEY_PEM: &str = "DEMO_API_JWT_PUBLIC_KEY_PEM";
pub const ENV_INSTRUMENTATION_KEY: &str = "DEMO_API_INSTRUMENTATION_KEY";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("required configuration value {var} is missing")]
    Missing { var: &'static str },

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Hosting environment. Controls how unhandled faults are rendered and
/// whether HSTS is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Named(String),
}

impl Environment {
    /// Parse an environment name, ASCII case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("development") {
            Self::Development
        } else if name.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Named(name.to_owned())
        }
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("Development"),
            Self::Production => f.write_str("Production"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Key material for bearer-token validation.
#[derive(Clone, PartialEq, Eq)]
pub enum SigningKey {
    /// HS256 shared secret.
    Secret(String),
    /// RS256 public key in PEM form.
    RsaPem(String),
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret(_) => f.write_str("Secret(<redacted>)"),
            Self::RsaPem(_) => f.write_str("RsaPem(<redacted>)"),
        }
    }
}

/// Settings loaded once at startup.
#[derive(Clone)]
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
    pub environment: Environment,
    /// Authentication authority URL. Recorded for diagnostics only.
    pub authority: Option<String>,
    pub signing_key: Option<SigningKey>,
    /// Telemetry instrumentation key. Must be present; never logged.
    pub instrumentation_key: String,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("listen_addr", &self.listen_addr)
            .field("environment", &self.environment)
            .field("authority", &self.authority)
            .field("signing_key", &self.signing_key)
            .field("instrumentation_key", &"<redacted>")
            .finish()
    }
}

impl ApiConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    /// See [`ApiConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variable names. Empty values count as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] if the instrumentation key is absent,
    /// or [`ConfigError::Invalid`] if the listen address does not parse or
    /// both signing key variables are set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let listen_addr = get(ENV_LISTEN_ADDR)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid { var: ENV_LISTEN_ADDR, reason: e.to_string() })?;

        let environment = get(ENV_ENVIRONMENT).map_or(Environment::Production, |n| Environment::parse(n.trim()));

        let signing_key = match (get(ENV_JWT_SECRET), get(ENV_JWT_PUBLIC_KEY_PEM)) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid {
                    var: ENV_JWT_PUBLIC_KEY_PEM,
                    reason: format!("set only one of {ENV_JWT_SECRET} and {ENV_JWT_PUBLIC_KEY_PEM}"),
                })
            }
            (Some(secret), None) => Some(SigningKey::Secret(secret)),
            (None, Some(pem)) => Some(SigningKey::RsaPem(pem)),
            (None, None) => None,
        };

        let instrumentation_key =
            get(ENV_INSTRUMENTATION_KEY).ok_or(ConfigError::Missing { var: ENV_INSTRUMENTATION_KEY })?;

        Ok(Self {
            listen_addr,
            environment,
            authority: get(ENV_AUTHORITY),
            signing_key,
            instrumentation_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        ApiConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = match load(&[(ENV_INSTRUMENTATION_KEY, "ikey")]) {
            Ok(c) => c,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.signing_key.is_none());
        assert!(config.authority.is_none());
    }

    #[test]
    fn missing_instrumentation_key_is_fatal() {
        let err = load(&[]).err();
        assert!(matches!(err, Some(ConfigError::Missing { var: ENV_INSTRUMENTATION_KEY })));
        let blank = load(&[(ENV_INSTRUMENTATION_KEY, "  ")]).err();
        assert!(matches!(blank, Some(ConfigError::Missing { .. })), "blank must count as missing");
    }

    #[test]
    fn invalid_listen_addr_is_rejected() {
        let err = load(&[(ENV_INSTRUMENTATION_KEY, "k"), (ENV_LISTEN_ADDR, "not-an-addr")]).err();
        assert!(matches!(err, Some(ConfigError::Invalid { var: ENV_LISTEN_ADDR, .. })));
    }

    #[test]
    fn both_signing_keys_conflict() {
        let err = load(&[
            (ENV_INSTRUMENTATION_KEY, "k"),
            (ENV_JWT_SECRET, "s"),
            (ENV_JWT_PUBLIC_KEY_PEM, "pem"),
        ])
        .err();
        assert!(matches!(err, Some(ConfigError::Invalid { .. })));
    }

    #[test]
    fn environment_parses_case_insensitively() {
        assert!(Environment::parse("DEVELOPMENT").is_development());
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("Staging"), Environment::Named("Staging".to_owned()));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = match load(&[(ENV_INSTRUMENTATION_KEY, "ikey-123"), (ENV_JWT_SECRET, "hunter2")]) {
            Ok(c) => c,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("ikey-123"), "instrumentation key leaked: {dbg}");
        assert!(!dbg.contains("hunter2"), "secret leaked: {dbg}");
    }
}
