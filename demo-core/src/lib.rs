//! Core types for the demo API.
//!
//! Defines the endpoint logic (root, color, error), the bounded random
//! selector those endpoints draw from, the nested fault chains raised by the
//! error endpoint, and the routing/authorization gate that decides whether a
//! request reaches a handler. Nothing here performs I/O.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod color;
pub mod endpoint;
pub mod error;
pub mod fault;
pub mod policy;
pub mod random;
pub mod route;

pub use color::ColorName;
pub use endpoint::Endpoint;
pub use error::CoreError;
pub use fault::{ErrorScenario, OperationFailure};
pub use policy::{authorize, AuthRequirement, AuthorizationPolicy, ClaimRequirement, Credential, Principal, Rejection};
pub use random::{RandomSource, ThreadRandom};
pub use route::{Resolution, RouteEntry, RouteTable};
