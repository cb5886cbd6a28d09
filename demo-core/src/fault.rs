//! Nested faults raised by `GET /error`.
//!
//! Each [`ErrorScenario`] builds an [`OperationFailure`] chain of depth 1 to 3.
//! The chain is exposed through [`std::error::Error::source`], so any generic
//! reporter that walks sources sees every level.

use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::random::{bound, RandomSource};

/// Message of the innermost fault in every scenario.
pub const ROOT_CAUSE_MESSAGE: &str = "Error error error!";
/// Message of the outermost wrapper in the nested scenarios.
pub const OUTER_MESSAGE: &str = "Outer error";
/// Message of the middle wrapper in the triple-nested scenario.
pub const INNER_MESSAGE: &str = "Inner error";

/// A failed operation with a literal message and an optional inner cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct OperationFailure {
    message: String,
    #[source]
    inner: Option<Box<OperationFailure>>,
}

impl OperationFailure {
    /// A fault with no inner cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), inner: None }
    }

    /// A fault wrapping `inner` as its cause.
    pub fn wrapping(message: impl Into<String>, inner: OperationFailure) -> Self {
        Self { message: message.into(), inner: Some(Box::new(inner)) }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The directly wrapped cause, if any.
    #[must_use]
    pub fn inner(&self) -> Option<&OperationFailure> {
        self.inner.as_deref()
    }

    /// Iterate the chain outermost first, starting with `self`.
    pub fn chain(&self) -> impl Iterator<Item = &OperationFailure> {
        std::iter::successors(Some(self), |f| f.inner())
    }

    /// Messages of the whole chain, outermost first.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.chain().map(OperationFailure::message).collect()
    }

    /// Number of faults in the chain (at least 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.chain().count()
    }
}

/// The three fault shapes `GET /error` can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorScenario {
    /// `"Error error error!"`
    Single,
    /// `"Outer error"` wrapping `"Error error error!"`.
    DoubleNested,
    /// `"Outer error"` wrapping `"Inner error"` wrapping `"Error error error!"`.
    TripleNested,
}

impl ErrorScenario {
    /// All scenarios in index order.
    pub const ALL: [ErrorScenario; 3] = [Self::Single, Self::DoubleNested, Self::TripleNested];

    const BOUND: NonZeroUsize = bound(Self::ALL.len());

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Draw a scenario uniformly from [`ErrorScenario::ALL`].
    #[must_use]
    pub fn pick(rng: &dyn RandomSource) -> Self {
        let i = rng.next_in_range(Self::BOUND);
        Self::ALL[i % Self::ALL.len()]
    }

    /// Build the fault chain for this scenario.
    #[must_use]
    pub fn failure(self) -> OperationFailure {
        let root = OperationFailure::new(ROOT_CAUSE_MESSAGE);
        match self {
            Self::Single => root,
            Self::DoubleNested => OperationFailure::wrapping(OUTER_MESSAGE, root),
            Self::TripleNested => OperationFailure::wrapping(
                OUTER_MESSAGE,
                OperationFailure::wrapping(INNER_MESSAGE, root),
            ),
        }
    }

    /// Expected chain messages, outermost first.
    #[must_use]
    pub fn messages(self) -> &'static [&'static str] {
        match self {
            Self::Single => &[ROOT_CAUSE_MESSAGE],
            Self::DoubleNested => &[OUTER_MESSAGE, ROOT_CAUSE_MESSAGE],
            Self::TripleNested => &[OUTER_MESSAGE, INNER_MESSAGE, ROOT_CAUSE_MESSAGE],
        }
    }

    /// Identify the scenario a fault chain was built from, if any.
    #[must_use]
    pub fn classify(failure: &OperationFailure) -> Option<Self> {
        let messages = failure.messages();
        Self::ALL.into_iter().find(|s| s.messages() == messages.as_slice())
    }
}

impl fmt::Display for ErrorScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "single",
            Self::DoubleNested => "double-nested",
            Self::TripleNested => "triple-nested",
        };
        f.write_str(name)
    }
}
