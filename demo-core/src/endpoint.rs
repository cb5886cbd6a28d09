use std::convert::Infallible;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::ColorName;
use crate::fault::{ErrorScenario, OperationFailure};
use crate::random::RandomSource;

/// Body returned by the root endpoint.
pub const ROOT_BODY: &str = "Ok";

/// `GET /` — always `Ok`.
#[must_use]
pub fn root() -> &'static str {
    ROOT_BODY
}

/// `GET /color` — a uniformly drawn color.
#[must_use]
pub fn color(rng: &dyn RandomSource) -> ColorName {
    ColorName::pick(rng)
}

/// `GET /error` — raises one of the three [`ErrorScenario`] chains.
///
/// # Errors
/// Always. The fault is left for the host's error reporter.
pub fn error(rng: &dyn RandomSource) -> Result<Infallible, OperationFailure> {
    Err(ErrorScenario::pick(rng).failure())
}

/// The handlers a route can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Root,
    Color,
    Error,
}

impl Endpoint {
    /// Run the handler and produce the response body.
    ///
    /// # Errors
    /// Returns the raised [`OperationFailure`] for [`Endpoint::Error`].
    pub fn invoke(self, rng: &dyn RandomSource) -> Result<String, OperationFailure> {
        match self {
            Self::Root => Ok(root().to_owned()),
            Self::Color => Ok(color(rng).as_str().to_owned()),
            Self::Error => match error(rng) {
                Ok(never) => match never {},
                Err(fault) => Err(fault),
            },
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Root => "root",
            Self::Color => "color",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
