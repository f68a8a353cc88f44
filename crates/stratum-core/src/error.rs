//! Error types for Stratum core.

use std::fmt;

/// Errors arising from invalid range construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// An interval was constructed with its upper bound below its lower bound.
    ///
    /// Ranges are never silently clamped; an inverted interval is always a
    /// caller bug and is reported at construction time.
    InvertedInterval {
        /// The requested lower bound (inclusive).
        from: u64,
        /// The requested upper bound (inclusive).
        to_inclusive: u64,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedInterval { from, to_inclusive } => {
                write!(
                    f,
                    "Inverted interval: upper bound {to_inclusive} is below lower bound {from}"
                )
            }
        }
    }
}

impl std::error::Error for RangeError {}

/// A specialized Result type for Stratum core operations.
pub type Result<T> = std::result::Result<T, RangeError>;
