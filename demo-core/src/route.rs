//! Explicit routing table.
//!
//! Built once at startup and consulted per request. Paths are declared
//! without a leading slash and matched ASCII case-insensitively.

use http::Method;

use crate::endpoint::Endpoint;
use crate::error::CoreError;
use crate::policy::AuthRequirement;

/// One declared route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub method: Method,
    /// Declared path without leading slash; `""` is the root.
    pub path: &'static str,
    pub endpoint: Endpoint,
    pub auth: AuthRequirement,
}

impl RouteEntry {
    #[must_use]
    pub fn new(method: Method, path: &'static str, endpoint: Endpoint, auth: AuthRequirement) -> Self {
        Self { method, path, endpoint, auth }
    }

    /// Canonical path as seen on the wire, e.g. `/color`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("/{}", self.path)
    }
}

/// Result of looking a request up in a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Matched(&'a RouteEntry),
    /// The path exists but not for this method.
    MethodNotAllowed { path: &'static str, allowed: Vec<Method> },
    Unmatched,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Build a table from explicit entries.
    ///
    /// # Errors
    /// Returns [`CoreError::DuplicateRoute`] if two entries share a method and
    /// (case-insensitive) path, and [`CoreError::InvalidRoutePath`] if a path
    /// is declared with a leading or trailing slash.
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self, CoreError> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.path.starts_with('/') || entry.path.ends_with('/') {
                return Err(CoreError::InvalidRoutePath { path: entry.path.to_owned() });
            }
            let duplicate = entries[..i]
                .iter()
                .any(|e| e.method == entry.method && e.path.eq_ignore_ascii_case(entry.path));
            if duplicate {
                return Err(CoreError::DuplicateRoute {
                    method: entry.method.to_string(),
                    path: entry.path.to_owned(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// The service's routes: `GET /`, `GET /color`, `GET /error`, all
    /// anonymous-exempt.
    ///
    /// Anonymous access to `/error` bypasses the machine-access policy. That
    /// is how the service has always been deployed and is kept as-is.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            entries: vec![
                RouteEntry::new(Method::GET, "", Endpoint::Root, AuthRequirement::Anonymous),
                RouteEntry::new(Method::GET, "color", Endpoint::Color, AuthRequirement::Anonymous),
                RouteEntry::new(Method::GET, "error", Endpoint::Error, AuthRequirement::Anonymous),
            ],
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Look up `(method, path)`.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        let wanted = normalize_path(path);
        let mut allowed = Vec::new();
        let mut matched_path = None;
        for entry in self.entries.iter().filter(|e| e.path.eq_ignore_ascii_case(wanted)) {
            if entry.method == *method {
                return Resolution::Matched(entry);
            }
            matched_path = Some(entry.path);
            allowed.push(entry.method.clone());
        }
        match matched_path {
            Some(path) => Resolution::MethodNotAllowed { path, allowed },
            None => Resolution::Unmatched,
        }
    }
}

/// Strip one leading `/`, then one trailing `/` if a segment precedes it.
///
/// `//` normalizes to `/`, which no route uses.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    }
}
