//! Bounded random selection.
//!
//! Endpoints that pick from a fixed set receive a [`RandomSource`] instead of
//! reaching for a process-wide generator, so tests can script the choice.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

/// A source of uniformly distributed indices.
///
/// Implementations must be `Send + Sync`; a single instance is shared by
/// every request task.
pub trait RandomSource: Send + Sync {
    /// Returns an integer in `[0, bound)`.
    ///
    /// Never returns a value outside the range. `bound == 1` always yields `0`.
    fn next_in_range(&self, bound: NonZeroUsize) -> usize;
}

/// Production source backed by `rand`'s thread-local generator.
///
/// Not cryptographically secure, and does not need to be.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl ThreadRandom {
    /// Create a new thread-local random source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for ThreadRandom {
    fn next_in_range(&self, bound: NonZeroUsize) -> usize {
        rand::rng().random_range(0..bound.get())
    }
}

/// Deterministic source that always yields the same value, reduced into range.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub usize);

impl RandomSource for FixedRandom {
    fn next_in_range(&self, bound: NonZeroUsize) -> usize {
        self.0 % bound.get()
    }
}

/// Deterministic source that cycles through a scripted sequence.
///
/// Each value is reduced modulo the requested bound. An empty sequence
/// behaves like `FixedRandom(0)`.
#[derive(Debug, Default)]
pub struct SequenceRandom {
    values: Vec<usize>,
    cursor: AtomicUsize,
}

impl SequenceRandom {
    /// Create a source that replays `values` in order, wrapping around.
    #[must_use]
    pub fn new(values: Vec<usize>) -> Self {
        Self { values, cursor: AtomicUsize::new(0) }
    }
}

impl RandomSource for SequenceRandom {
    fn next_in_range(&self, bound: NonZeroUsize) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[i] % bound.get()
    }
}

/// Build a [`NonZeroUsize`] in const context.
///
/// # Panics
/// Panics when `n` is zero; in a `const` item that is a compile error.
#[must_use]
pub const fn bound(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(b) => b,
        None => panic!("bound must be positive"),
    }
}
