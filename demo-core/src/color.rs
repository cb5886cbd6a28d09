use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::random::{bound, RandomSource};

/// One of the four colors served by `GET /color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    Red,
    Green,
    Blue,
    Yellow,
}

impl ColorName {
    /// All colors in index order: `0 = red` through `3 = yellow`.
    pub const ALL: [ColorName; 4] = [Self::Red, Self::Green, Self::Blue, Self::Yellow];

    const BOUND: NonZeroUsize = bound(Self::ALL.len());

    /// Lower-case name as written to the response body.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }

    /// Color at `index`, or `None` past the end of [`ColorName::ALL`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Draw a color uniformly from [`ColorName::ALL`].
    #[must_use]
    pub fn pick(rng: &dyn RandomSource) -> Self {
        let i = rng.next_in_range(Self::BOUND);
        // A source that ignores its bound must not escape the set.
        Self::ALL[i % Self::ALL.len()]
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
