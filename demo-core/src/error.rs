/// Errors produced by the `demo-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// Two route entries share a method and path.
    #[error("duplicate route {method} /{path}")]
    DuplicateRoute { method: String, path: String },

    /// A route path was declared with a leading or trailing slash.
    #[error("invalid route path '{path}': declare paths without surrounding slashes")]
    InvalidRoutePath { path: String },
}
