//! Numeric ranges of tree indices.

use std::fmt;

use crate::error::{RangeError, Result};

/// A closed-open interval `[from, from + count)` of tree indices.
///
/// `NumericRange` is the unit of storage inside [`crate::IndexSet`]: large
/// models produce long contiguous runs of tree indices (a subtree occupies
/// `[tree_index, tree_index + subtree_size)`), so sets of indices are
/// represented as collections of these ranges rather than individual values.
///
/// A range with `count == 0` is a valid empty range and contains nothing.
/// Both fields are unsigned, so a negative count is unrepresentable; the one
/// remaining invalid construction, an inverted inclusive interval, is rejected
/// by [`NumericRange::from_interval`].
///
/// # Example
///
/// ```
/// use stratum_core::NumericRange;
///
/// let range = NumericRange::new(11, 5);
/// assert!(range.contains(15));
/// assert!(!range.contains(16));
/// assert_eq!(range.last(), Some(15));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericRange {
    /// The first index in the range.
    pub from: u64,
    /// The number of indices in the range.
    pub count: u64,
}

impl NumericRange {
    /// Create a range starting at `from` containing `count` indices.
    pub const fn new(from: u64, count: u64) -> Self {
        Self { from, count }
    }

    /// Create an empty range.
    pub const fn empty() -> Self {
        Self { from: 0, count: 0 }
    }

    /// Create a range from an inclusive interval `[from, to_inclusive]`.
    ///
    /// Returns [`RangeError::InvertedInterval`] if `to_inclusive < from`.
    pub const fn from_interval(from: u64, to_inclusive: u64) -> Result<Self> {
        if to_inclusive < from {
            return Err(RangeError::InvertedInterval { from, to_inclusive });
        }
        Ok(Self {
            from,
            count: to_inclusive - from + 1,
        })
    }

    /// Whether this range contains no indices.
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The first index past the end of the range.
    pub const fn end(&self) -> u64 {
        self.from + self.count
    }

    /// The last index in the range, or `None` if the range is empty.
    pub const fn last(&self) -> Option<u64> {
        if self.count == 0 {
            None
        } else {
            Some(self.from + self.count - 1)
        }
    }

    /// Whether `index` lies within the range.
    pub const fn contains(&self, index: u64) -> bool {
        index >= self.from && index < self.end()
    }

    /// Whether the two ranges share at least one index.
    ///
    /// Empty ranges intersect nothing.
    pub const fn intersects(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.from < other.end() && other.from < self.end()
    }

    /// Whether the two ranges intersect or are directly adjacent.
    ///
    /// Adjacent ranges (`[1, 4)` and `[4, 7)`) merge into a single range when
    /// stored in an [`crate::IndexSet`], so "touching" is the predicate the
    /// set uses to decide whether an insertion must absorb an existing range.
    pub const fn touches(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.intersects(other) || self.end() == other.from || other.end() == self.from
    }

    /// The intersection of the two ranges, or `None` if they do not intersect.
    pub fn intersection_with(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        let from = self.from.max(other.from);
        let end = self.end().min(other.end());
        Some(Self::new(from, end - from))
    }

    /// The smallest range covering both inputs.
    ///
    /// For touching or overlapping inputs this is the exact set union; for
    /// disjoint inputs it also covers the gap between them, so callers merging
    /// set contents must only apply it to touching ranges.
    pub fn union_hull(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let from = self.from.min(other.from);
        let end = self.end().max(other.end());
        Self::new(from, end - from)
    }

    /// Iterate over the indices contained in the range, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u64> + use<> {
        self.from..self.end()
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last() {
            Some(last) => write!(f, "[{}..{}]", self.from, last),
            None => write!(f, "[empty]"),
        }
    }
}

impl IntoIterator for NumericRange {
    type Item = u64;
    type IntoIter = std::ops::Range<u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.from..self.end()
    }
}
