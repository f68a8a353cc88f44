//! A set of tree indices stored as a balanced tree of disjoint ranges.

use std::fmt;

use crate::range::NumericRange;

/// A set of `u64` tree indices.
///
/// The set is represented internally as a balanced binary tree whose nodes
/// hold disjoint, non-adjacent [`NumericRange`]s ordered by their `from`
/// value. Adjacent ranges are always merged, so `[1..3]` followed by `[4..6]`
/// collapses into a single `[1..6]` node. This makes the structure cheap for
/// the workloads the styling engine sees: a subtree of half a million
/// contiguous nodes is one leaf, and `add`/`remove`/`contains` cost
/// `O(log R)` where `R` is the number of disjoint ranges.
///
/// Every node is annotated with the smallest and largest index covered by its
/// subtree and with the subtree depth. The span annotations prune searches;
/// the depth annotation drives AVL-style rebalancing (rotate toward the
/// shallower side whenever sibling depths differ by two) after every
/// structural mutation.
///
/// Inserting a range that overlaps or touches existing ranges first *soaks*
/// them: every stored range the insertion touches is removed from the tree
/// and folded into the inserted range, and the single merged result is
/// re-inserted. This keeps the no-adjacent-ranges invariant without a
/// separate compaction pass. Removal is the structural dual: a removed span
/// may split a stored range into a left and a right remainder, which are
/// re-inserted as two ranges.
///
/// # Example
///
/// ```
/// use stratum_core::{IndexSet, NumericRange};
///
/// let mut set = IndexSet::new();
/// set.add_range(NumericRange::new(1, 3));
/// set.add_range(NumericRange::new(4, 3));
///
/// // Adjacent ranges merged into one.
/// assert_eq!(set.ranges().collect::<Vec<_>>(), vec![NumericRange::new(1, 6)]);
/// ```
#[derive(Clone, Default)]
pub struct IndexSet {
    root: Link,
    count: u64,
}

type Link = Option<Box<Node>>;

#[derive(Clone)]
struct Node {
    /// The stored range. Never empty.
    range: NumericRange,
    left: Link,
    right: Link,
    /// Depth of the subtree rooted here (leaf = 1).
    depth: u8,
    /// Smallest index covered anywhere in this subtree.
    min: u64,
    /// Largest index covered anywhere in this subtree (inclusive).
    max: u64,
}

impl Node {
    fn leaf(range: NumericRange) -> Box<Self> {
        debug_assert!(!range.is_empty(), "IndexSet never stores empty ranges");
        Box::new(Self {
            range,
            left: None,
            right: None,
            depth: 1,
            min: range.from,
            max: range.end() - 1,
        })
    }
}

fn depth(link: &Link) -> u8 {
    link.as_ref().map_or(0, |n| n.depth)
}

/// Recompute the annotations of `n` from its children.
fn update(n: &mut Node) {
    n.depth = 1 + depth(&n.left).max(depth(&n.right));
    n.min = n.left.as_ref().map_or(n.range.from, |l| l.min);
    n.max = n.right.as_ref().map_or(n.range.end() - 1, |r| r.max);
}

fn rotate_right(mut n: Box<Node>) -> Box<Node> {
    let Some(mut l) = n.left.take() else {
        unreachable!("rotate_right requires a left child")
    };
    n.left = l.right.take();
    update(&mut n);
    l.right = Some(n);
    update(&mut l);
    l
}

fn rotate_left(mut n: Box<Node>) -> Box<Node> {
    let Some(mut r) = n.right.take() else {
        unreachable!("rotate_left requires a right child")
    };
    n.right = r.left.take();
    update(&mut n);
    r.left = Some(n);
    update(&mut r);
    r
}

/// Refresh annotations and rotate toward the shallower side if the subtree
/// depths differ by two.
fn rebalance(mut n: Box<Node>) -> Box<Node> {
    update(&mut n);
    let dl = i16::from(depth(&n.left));
    let dr = i16::from(depth(&n.right));
    if dl - dr > 1 {
        // Left-heavy. A right-heavy left child needs the double rotation.
        if let Some(l) = n.left.take() {
            n.left = if depth(&l.right) > depth(&l.left) {
                Some(rotate_left(l))
            } else {
                Some(l)
            };
            update(&mut n);
        }
        rotate_right(n)
    } else if dr - dl > 1 {
        if let Some(r) = n.right.take() {
            n.right = if depth(&r.left) > depth(&r.right) {
                Some(rotate_right(r))
            } else {
                Some(r)
            };
            update(&mut n);
        }
        rotate_left(n)
    } else {
        n
    }
}

/// Insert a range known to be disjoint from (and not adjacent to) every
/// stored range. Soaking in [`IndexSet::add_range`] establishes that
/// precondition; violating it means the set algebra itself is broken, which
/// is fatal.
fn insert(link: Link, range: NumericRange) -> Box<Node> {
    match link {
        None => Node::leaf(range),
        Some(mut n) => {
            assert!(
                !n.range.touches(&range),
                "IndexSet invariant violated: inserting {range} next to stored {}",
                n.range
            );
            if range.from < n.range.from {
                n.left = Some(insert(n.left.take(), range));
            } else {
                n.right = Some(insert(n.right.take(), range));
            }
            rebalance(n)
        }
    }
}

/// Remove and return one stored range matching `probe`, or `None`.
///
/// With `allow_touch` the match includes directly adjacent ranges (used by
/// insertion soaking); without it only true intersections match (used by
/// removal).
fn take_matching(link: Link, probe: NumericRange, allow_touch: bool) -> (Link, Option<NumericRange>) {
    let Some(mut n) = link else {
        return (None, None);
    };

    let slack = u64::from(allow_touch);
    let probe_last = probe.end() - 1;
    if n.max.saturating_add(slack) < probe.from || probe_last.saturating_add(slack) < n.min {
        return (Some(n), None);
    }

    let (left, taken) = take_matching(n.left.take(), probe, allow_touch);
    n.left = left;
    if taken.is_some() {
        return (Some(rebalance(n)), taken);
    }

    let hit = if allow_touch {
        n.range.touches(&probe)
    } else {
        n.range.intersects(&probe)
    };
    if hit {
        let found = n.range;
        return (remove_node(n), Some(found));
    }

    let (right, taken) = take_matching(n.right.take(), probe, allow_touch);
    n.right = right;
    (Some(rebalance(n)), taken)
}

/// Unlink `n` from the tree, promoting its in-order successor if it has two
/// children.
fn remove_node(mut n: Box<Node>) -> Link {
    match (n.left.take(), n.right.take()) {
        (None, None) => None,
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (Some(l), Some(r)) => {
            let (rest, successor) = take_leftmost(r);
            n.range = successor;
            n.left = Some(l);
            n.right = rest;
            Some(rebalance(n))
        }
    }
}

fn take_leftmost(mut n: Box<Node>) -> (Link, NumericRange) {
    match n.left.take() {
        None => (n.right.take(), n.range),
        Some(l) => {
            let (rest, range) = take_leftmost(l);
            n.left = rest;
            (Some(rebalance(n)), range)
        }
    }
}

impl IndexSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of indices contained in the set.
    ///
    /// This counts individual integers, not stored ranges, and is maintained
    /// incrementally so the call is O(1).
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether the set contains no indices.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of disjoint ranges backing the set.
    pub fn range_count(&self) -> usize {
        self.ranges().count()
    }

    /// Add a single index.
    pub fn add(&mut self, index: u64) {
        self.add_range(NumericRange::new(index, 1));
    }

    /// Add a range of indices, merging with any stored range it overlaps or
    /// touches. Adding indices already present is a no-op beyond the merge
    /// bookkeeping.
    pub fn add_range(&mut self, range: NumericRange) {
        if range.is_empty() {
            return;
        }
        let mut merged = range;
        let mut root = self.root.take();
        // Soak every stored range the insertion touches, then re-insert the
        // single merged result.
        loop {
            let (rest, taken) = take_matching(root, merged, true);
            root = rest;
            match taken {
                Some(existing) => {
                    self.count -= existing.count;
                    merged = merged.union_hull(&existing);
                }
                None => break,
            }
        }
        self.root = Some(insert(root, merged));
        self.count += merged.count;
    }

    /// Remove a single index. Removing an absent index is a no-op.
    pub fn remove(&mut self, index: u64) {
        self.remove_range(NumericRange::new(index, 1));
    }

    /// Remove a range of indices.
    ///
    /// A removal that lands inside a stored range splits it in two; a removal
    /// covering a stored range deletes it; removing absent indices is a
    /// no-op.
    pub fn remove_range(&mut self, range: NumericRange) {
        if range.is_empty() {
            return;
        }
        let mut root = self.root.take();
        let mut remainders: Vec<NumericRange> = Vec::new();
        loop {
            let (rest, taken) = take_matching(root, range, false);
            root = rest;
            let Some(existing) = taken else { break };
            self.count -= existing.count;
            if existing.from < range.from {
                remainders.push(NumericRange::new(existing.from, range.from - existing.from));
            }
            if existing.end() > range.end() {
                remainders.push(NumericRange::new(range.end(), existing.end() - range.end()));
            }
        }
        for remainder in remainders {
            self.count += remainder.count;
            root = Some(insert(root, remainder));
        }
        self.root = root;
    }

    /// Whether `index` is contained in the set.
    pub fn contains(&self, index: u64) -> bool {
        let mut link = &self.root;
        while let Some(n) = link {
            if index < n.min || index > n.max {
                return false;
            }
            if n.range.contains(index) {
                return true;
            }
            link = if index < n.range.from { &n.left } else { &n.right };
        }
        false
    }

    /// Remove all indices.
    pub fn clear(&mut self) {
        self.root = None;
        self.count = 0;
    }

    /// Iterate over the backing ranges in ascending order.
    ///
    /// The ranges are disjoint and non-adjacent; this is the canonical
    /// enumeration of the set. The iterator borrows the set and is
    /// restartable by calling `ranges()` again.
    pub fn ranges(&self) -> Ranges<'_> {
        Ranges::new(&self.root)
    }

    /// Iterate over the individual indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.ranges().flat_map(|r| r.iter())
    }

    /// Collect the individual indices into a vector, ascending.
    pub fn to_vec(&self) -> Vec<u64> {
        self.iter().collect()
    }

    /// Add every index of `other` to this set.
    pub fn union_with(&mut self, other: &Self) {
        for range in other.ranges() {
            self.add_range(range);
        }
    }

    /// Remove every index of `other` from this set.
    pub fn difference_with(&mut self, other: &Self) {
        for range in other.ranges() {
            self.remove_range(range);
        }
    }

    /// Keep only the indices present in both sets.
    ///
    /// Implemented as a merge-join over the two ascending range sequences,
    /// O(R1 + R2) regardless of overlap pattern.
    pub fn intersect_with(&mut self, other: &Self) {
        let mut result = Self::new();
        {
            let mut a = self.ranges();
            let mut b = other.ranges();
            let mut ra = a.next();
            let mut rb = b.next();
            while let (Some(x), Some(y)) = (ra, rb) {
                if let Some(common) = x.intersection_with(&y) {
                    result.add_range(common);
                }
                // Advance whichever range ends first.
                if x.end() <= y.end() {
                    ra = a.next();
                } else {
                    rb = b.next();
                }
            }
        }
        *self = result;
    }

    /// Whether the two sets share at least one index.
    ///
    /// Short-circuits on the first overlapping range pair without
    /// materializing the intersection.
    pub fn has_intersection_with(&self, other: &Self) -> bool {
        let mut a = self.ranges();
        let mut b = other.ranges();
        let mut ra = a.next();
        let mut rb = b.next();
        while let (Some(x), Some(y)) = (ra, rb) {
            if x.intersects(&y) {
                return true;
            }
            if x.end() <= y.end() {
                ra = a.next();
            } else {
                rb = b.next();
            }
        }
        false
    }

    /// Verify every structural invariant of the tree. Test support.
    #[cfg(test)]
    fn assert_invariants(&self) {
        fn walk(link: &Link, out: &mut Vec<NumericRange>) -> u8 {
            let Some(n) = link else { return 0 };
            let dl = walk(&n.left, out);
            out.push(n.range);
            let dr = walk(&n.right, out);
            assert!(!n.range.is_empty(), "stored range is empty");
            assert_eq!(n.depth, 1 + dl.max(dr), "stale depth annotation");
            assert!(
                (i16::from(dl) - i16::from(dr)).abs() <= 1,
                "unbalanced subtree: left depth {dl}, right depth {dr}"
            );
            let min = n.left.as_ref().map_or(n.range.from, |l| l.min);
            let max = n.right.as_ref().map_or(n.range.end() - 1, |r| r.max);
            assert_eq!(n.min, min, "stale min annotation");
            assert_eq!(n.max, max, "stale max annotation");
            n.depth
        }

        let mut ranges = Vec::new();
        walk(&self.root, &mut ranges);
        for pair in ranges.windows(2) {
            assert!(
                pair[0].end() < pair[1].from,
                "ranges {} and {} are out of order, overlapping, or adjacent",
                pair[0],
                pair[1]
            );
        }
        let total: u64 = ranges.iter().map(|r| r.count).sum();
        assert_eq!(total, self.count, "stale cached count");
    }
}

impl PartialEq for IndexSet {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.ranges().eq(other.ranges())
    }
}

impl Eq for IndexSet {}

impl fmt::Debug for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexSet")?;
        f.debug_list().entries(self.ranges()).finish()
    }
}

impl From<NumericRange> for IndexSet {
    fn from(range: NumericRange) -> Self {
        let mut set = Self::new();
        set.add_range(range);
        set
    }
}

impl FromIterator<u64> for IndexSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut set = Self::new();
        for index in iter {
            set.add(index);
        }
        set
    }
}

impl Extend<NumericRange> for IndexSet {
    fn extend<I: IntoIterator<Item = NumericRange>>(&mut self, iter: I) {
        for range in iter {
            self.add_range(range);
        }
    }
}

/// In-order iterator over the backing ranges of an [`IndexSet`].
pub struct Ranges<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Ranges<'a> {
    fn new(root: &'a Link) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left(root);
        iter
    }

    fn push_left(&mut self, mut link: &'a Link) {
        while let Some(n) = link {
            self.stack.push(n);
            link = &n.left;
        }
    }
}

impl Iterator for Ranges<'_> {
    type Item = NumericRange;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        self.push_left(&n.right);
        Some(n.range)
    }
}

impl fmt::Debug for Ranges<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranges").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    fn set_of(ranges: &[(u64, u64)]) -> IndexSet {
        let mut set = IndexSet::new();
        for &(from, count) in ranges {
            set.add_range(NumericRange::new(from, count));
        }
        set
    }

    fn ranges_of(set: &IndexSet) -> Vec<(u64, u64)> {
        set.ranges().map(|r| (r.from, r.count)).collect()
    }

    #[test]
    fn test_empty_set() {
        let set = IndexSet::new();
        assert_eq!(set.count(), 0);
        assert!(set.is_empty());
        assert_eq!(set.range_count(), 0);
        assert!(!set.contains(0));
        set.assert_invariants();
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut set = IndexSet::new();
        set.add_range(NumericRange::new(11, 5));
        assert_eq!(set.count(), 5);
        assert!(!set.contains(10));
        assert!(set.contains(15));
        assert!(!set.contains(16));

        set.remove(13);
        assert_eq!(set.count(), 4);
        assert!(!set.contains(13));

        let mut clone = set.clone();
        clone.add(20);
        assert!(!set.contains(20));
        assert!(clone.contains(20));
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        let set = set_of(&[(1, 3), (4, 3)]);
        assert_eq!(ranges_of(&set), vec![(1, 6)]);
        set.assert_invariants();
    }

    #[test]
    fn test_add_range_topologies() {
        // Base range [10..14]; every topological relationship of an added
        // range against it.
        let cases: &[(&str, (u64, u64), Vec<(u64, u64)>)] = &[
            ("disjoint before", (2, 3), vec![(2, 3), (10, 5)]),
            ("disjoint after", (20, 3), vec![(10, 5), (20, 3)]),
            ("touching left", (5, 5), vec![(5, 10)]),
            ("touching right", (15, 3), vec![(10, 8)]),
            ("overlapping left", (8, 4), vec![(8, 7)]),
            ("overlapping right", (13, 5), vec![(10, 8)]),
            ("fully containing", (8, 10), vec![(8, 10)]),
            ("fully contained", (11, 2), vec![(10, 5)]),
            ("identical", (10, 5), vec![(10, 5)]),
        ];
        for (name, added, expected) in cases {
            let mut set = set_of(&[(10, 5)]);
            set.add_range(NumericRange::new(added.0, added.1));
            assert_eq!(&ranges_of(&set), expected, "add case: {name}");
            set.assert_invariants();
        }
    }

    #[test]
    fn test_remove_range_topologies() {
        let cases: &[(&str, (u64, u64), Vec<(u64, u64)>)] = &[
            ("disjoint before", (2, 3), vec![(10, 5)]),
            ("disjoint after", (20, 3), vec![(10, 5)]),
            ("adjacent left is noop", (5, 5), vec![(10, 5)]),
            ("adjacent right is noop", (15, 3), vec![(10, 5)]),
            ("overlapping left", (8, 4), vec![(12, 3)]),
            ("overlapping right", (13, 5), vec![(10, 3)]),
            ("fully covering", (8, 10), vec![]),
            ("splitting", (11, 2), vec![(10, 1), (13, 2)]),
            ("identical", (10, 5), vec![]),
        ];
        for (name, removed, expected) in cases {
            let mut set = set_of(&[(10, 5)]);
            set.remove_range(NumericRange::new(removed.0, removed.1));
            assert_eq!(&ranges_of(&set), expected, "remove case: {name}");
            set.assert_invariants();
        }
    }

    #[test]
    fn test_add_soaks_multiple_ranges() {
        let mut set = set_of(&[(0, 2), (5, 2), (10, 2), (20, 2)]);
        // Covers the first three stored ranges and the gaps between them.
        set.add_range(NumericRange::new(1, 10));
        assert_eq!(ranges_of(&set), vec![(0, 12), (20, 2)]);
        assert_eq!(set.count(), 14);
        set.assert_invariants();
    }

    #[test]
    fn test_remove_spanning_multiple_ranges() {
        let mut set = set_of(&[(0, 4), (10, 4), (20, 4)]);
        set.remove_range(NumericRange::new(2, 20));
        assert_eq!(ranges_of(&set), vec![(0, 2), (22, 2)]);
        set.assert_invariants();
    }

    #[test]
    fn test_empty_range_operations_are_noops() {
        let mut set = set_of(&[(10, 5)]);
        set.add_range(NumericRange::empty());
        set.remove_range(NumericRange::empty());
        assert_eq!(ranges_of(&set), vec![(10, 5)]);
    }

    #[test]
    fn test_count_counts_indices_not_ranges() {
        let set = set_of(&[(0, 100), (200, 50)]);
        assert_eq!(set.count(), 150);
        assert_eq!(set.range_count(), 2);
    }

    #[test]
    fn test_iter_and_to_vec() {
        let set = set_of(&[(1, 2), (5, 2)]);
        assert_eq!(set.to_vec(), vec![1, 2, 5, 6]);
        // Restartable: a second enumeration yields the same values.
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 2, 5, 6]);
    }

    #[test]
    fn test_clone_isolation_bidirectional() {
        let mut original = set_of(&[(10, 5)]);
        let mut clone = original.clone();

        clone.add(100);
        original.remove(12);

        assert!(clone.contains(12));
        assert!(!clone.contains(101));
        assert!(!original.contains(100));
        assert_eq!(original.count(), 4);
        assert_eq!(clone.count(), 6);
    }

    #[test]
    fn test_union_with() {
        let mut a = set_of(&[(0, 5), (20, 5)]);
        let b = set_of(&[(3, 10), (40, 2)]);
        a.union_with(&b);
        assert_eq!(ranges_of(&a), vec![(0, 13), (20, 5), (40, 2)]);
        a.assert_invariants();
    }

    #[test]
    fn test_union_commutative_on_membership() {
        let a = set_of(&[(0, 10), (30, 5), (100, 1)]);
        let b = set_of(&[(5, 10), (29, 1), (50, 3)]);

        let mut ab = a.clone();
        ab.union_with(&b);
        let mut ba = b.clone();
        ba.union_with(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_union_associative_on_membership() {
        let a = set_of(&[(0, 10), (30, 5)]);
        let b = set_of(&[(5, 10), (50, 3)]);
        let c = set_of(&[(29, 2), (100, 1)]);

        // (a ∪ b) ∪ c
        let mut left_first = a.clone();
        left_first.union_with(&b);
        left_first.union_with(&c);

        // a ∪ (b ∪ c)
        let mut right_first = b.clone();
        right_first.union_with(&c);
        let mut a_then_rest = a.clone();
        a_then_rest.union_with(&right_first);

        assert_eq!(left_first, a_then_rest);
        left_first.assert_invariants();
    }

    #[test]
    fn test_intersect_with() {
        let mut a = set_of(&[(0, 10), (20, 10)]);
        let b = set_of(&[(5, 20)]);
        a.intersect_with(&b);
        assert_eq!(ranges_of(&a), vec![(5, 5), (20, 5)]);
        a.assert_invariants();
    }

    #[test]
    fn test_intersect_with_self_is_identity() {
        let mut a = set_of(&[(0, 10), (20, 10), (50, 1)]);
        let same = a.clone();
        a.intersect_with(&same);
        assert_eq!(a, same);
    }

    #[test]
    fn test_intersect_does_not_mutate_other() {
        let mut a = set_of(&[(0, 10)]);
        let b = set_of(&[(5, 10)]);
        let b_before = b.clone();
        a.clone().intersect_with(&b);
        a.intersect_with(&b);
        assert_eq!(b, b_before);
    }

    #[test]
    fn test_difference_with_removes_exactly_intersection() {
        let mut a = set_of(&[(0, 10), (20, 10)]);
        let b = set_of(&[(5, 20), (100, 5)]);

        let mut expected = a.clone();
        let mut overlap = a.clone();
        overlap.intersect_with(&b);
        for range in overlap.ranges().collect::<Vec<_>>() {
            expected.remove_range(range);
        }

        a.difference_with(&b);
        assert_eq!(a, expected);
        assert_eq!(ranges_of(&a), vec![(0, 5), (25, 5)]);
    }

    #[test]
    fn test_has_intersection_with() {
        let a = set_of(&[(0, 10), (100, 10)]);
        assert!(a.has_intersection_with(&set_of(&[(9, 1)])));
        assert!(a.has_intersection_with(&set_of(&[(50, 100)])));
        assert!(!a.has_intersection_with(&set_of(&[(10, 90)])));
        assert!(!a.has_intersection_with(&IndexSet::new()));
        assert!(!IndexSet::new().has_intersection_with(&a));
    }

    #[test]
    fn test_from_iterator() {
        let set: IndexSet = [5_u64, 1, 2, 3, 9].into_iter().collect();
        assert_eq!(ranges_of(&set), vec![(1, 3), (5, 1), (9, 1)]);
    }

    #[test]
    fn test_balances_under_sequential_insertion() {
        let mut set = IndexSet::new();
        // Strictly ascending, never-touching ranges: worst case for an
        // unbalanced BST.
        for i in 0..1000_u64 {
            set.add_range(NumericRange::new(i * 10, 2));
        }
        assert_eq!(set.range_count(), 1000);
        assert_eq!(set.count(), 2000);
        set.assert_invariants();
        assert!(set.contains(9990));
        assert!(!set.contains(9992));
    }

    #[test]
    fn test_fuzz_against_reference_set() {
        let mut rng = StdRng::seed_from_u64(0x5742_A71A);
        let mut set = IndexSet::new();
        let mut reference: BTreeSet<u64> = BTreeSet::new();

        for step in 0..3000 {
            let from = rng.gen_range(0..500_u64);
            let count = rng.gen_range(0..20_u64);
            let range = NumericRange::new(from, count);
            if rng.gen_bool(0.6) {
                set.add_range(range);
                reference.extend(range.iter());
            } else {
                set.remove_range(range);
                for i in range.iter() {
                    reference.remove(&i);
                }
            }

            if step % 100 == 0 {
                set.assert_invariants();
                assert_eq!(set.to_vec(), reference.iter().copied().collect::<Vec<_>>());
                assert_eq!(set.count(), reference.len() as u64);
            }
        }
        set.assert_invariants();
        assert_eq!(set.to_vec(), reference.iter().copied().collect::<Vec<_>>());
    }

    #[test]
    fn test_fuzz_set_algebra_against_reference() {
        let mut rng = StdRng::seed_from_u64(0xD1FF_5E7);
        for _ in 0..200 {
            let mut a_ref: BTreeSet<u64> = BTreeSet::new();
            let mut b_ref: BTreeSet<u64> = BTreeSet::new();
            let mut a = IndexSet::new();
            let mut b = IndexSet::new();
            for _ in 0..rng.gen_range(0..20) {
                let r = NumericRange::new(rng.gen_range(0..200), rng.gen_range(1..15));
                a.add_range(r);
                a_ref.extend(r.iter());
            }
            for _ in 0..rng.gen_range(0..20) {
                let r = NumericRange::new(rng.gen_range(0..200), rng.gen_range(1..15));
                b.add_range(r);
                b_ref.extend(r.iter());
            }

            let mut union = a.clone();
            union.union_with(&b);
            assert_eq!(
                union.to_vec(),
                a_ref.union(&b_ref).copied().collect::<Vec<_>>()
            );

            let mut intersection = a.clone();
            intersection.intersect_with(&b);
            assert_eq!(
                intersection.to_vec(),
                a_ref.intersection(&b_ref).copied().collect::<Vec<_>>()
            );

            let mut difference = a.clone();
            difference.difference_with(&b);
            assert_eq!(
                difference.to_vec(),
                a_ref.difference(&b_ref).copied().collect::<Vec<_>>()
            );

            assert_eq!(
                a.has_intersection_with(&b),
                a_ref.intersection(&b_ref).next().is_some()
            );
        }
    }
}
