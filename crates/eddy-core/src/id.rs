//! Strongly-typed identifiers.

use std::fmt;

/// Zero-based position of a Runge–Kutta stage within the stage table.
///
/// Displayed one-based (`stage 1` is the first stage) so that log lines
/// and error messages match the usual numbering of multi-stage schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageIndex(pub usize);

impl StageIndex {
    /// Whether this is the first stage of the step.
    pub fn is_first(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

impl From<usize> for StageIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}
