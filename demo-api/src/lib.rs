//! HTTP surface of the demo API.
//!
//! Serves `/`, `/color`, and `/error` through the core route table and
//! authorization gate, plus the `/health` liveness probe and `/metrics`.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod routes;
pub mod state;
