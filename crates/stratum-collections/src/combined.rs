//! Combinator collections: union, intersection, and inversion.
//!
//! Combinators never mutate a set of their own. They cache a derived result
//! (`Option<IndexSet>`) that is invalidated whenever a child's `changed`
//! signal fires and recomputed lazily on the next read, the same
//! dirty-cache pattern the reactive property system uses for computed
//! bindings.

use std::sync::Arc;

use parking_lot::Mutex;

use stratum_core::{ConnectionId, IndexSet, NumericRange, Signal};

use crate::collection::{CollectionKind, NodeCollection, same_collection};
use crate::error::{CollectionError, Result};

/// How a [`CombinedNodeCollection`] folds its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombineOperator {
    /// Membership in any child.
    Union,
    /// Membership in every child.
    ///
    /// The intersection of *zero* children is defined as the empty set, not
    /// "everything"; an accidental empty combinator must never style every
    /// node in the model.
    Intersection,
}

/// Cache and notification state shared with child subscriptions.
#[derive(Debug)]
struct DerivedState {
    cache: Mutex<Option<IndexSet>>,
    changed: Signal<()>,
}

impl DerivedState {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            cache: Mutex::new(None),
            changed: Signal::new(),
        })
    }

    /// Drop the cached result and notify observers.
    fn invalidate(&self) {
        *self.cache.lock() = None;
        self.changed.emit(());
    }
}

struct ChildEntry {
    collection: Arc<dyn NodeCollection>,
    subscription: ConnectionId,
}

/// A union or intersection over an ordered list of child collections.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stratum_collections::{CombinedNodeCollection, NodeCollection, SimpleNodeCollection};
/// use stratum_core::{IndexSet, NumericRange};
///
/// let a = Arc::new(SimpleNodeCollection::from_set(IndexSet::from(NumericRange::new(0, 10))));
/// let b = Arc::new(SimpleNodeCollection::from_set(IndexSet::from(NumericRange::new(5, 10))));
///
/// let both = CombinedNodeCollection::intersection(vec![
///     a as Arc<dyn NodeCollection>,
///     b as Arc<dyn NodeCollection>,
/// ]);
/// assert_eq!(both.index_set().to_vec(), vec![5, 6, 7, 8, 9]);
/// ```
pub struct CombinedNodeCollection {
    operator: CombineOperator,
    children: Mutex<Vec<ChildEntry>>,
    state: Arc<DerivedState>,
}

impl CombinedNodeCollection {
    /// Create an empty combinator with the given operator.
    pub fn new(operator: CombineOperator) -> Self {
        Self {
            operator,
            children: Mutex::new(Vec::new()),
            state: DerivedState::new(),
        }
    }

    /// Create a union over `children`.
    pub fn union(children: Vec<Arc<dyn NodeCollection>>) -> Self {
        Self::with_children(CombineOperator::Union, children)
    }

    /// Create an intersection over `children`.
    pub fn intersection(children: Vec<Arc<dyn NodeCollection>>) -> Self {
        Self::with_children(CombineOperator::Intersection, children)
    }

    fn with_children(operator: CombineOperator, children: Vec<Arc<dyn NodeCollection>>) -> Self {
        let combinator = Self::new(operator);
        for child in children {
            combinator.add_child(child);
        }
        combinator
    }

    /// The fold operator.
    pub fn operator(&self) -> CombineOperator {
        self.operator
    }

    /// Number of child collections.
    pub fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    /// Append a child collection.
    ///
    /// The combinator subscribes to the child's `changed` signal; it does not
    /// own the child.
    pub fn add_child(&self, child: Arc<dyn NodeCollection>) {
        let state = Arc::clone(&self.state);
        let subscription = child.changed().connect(move |_| state.invalidate());
        self.children.lock().push(ChildEntry {
            collection: child,
            subscription,
        });
        self.state.invalidate();
    }

    /// Remove a child collection, cancelling the subscription.
    ///
    /// Returns [`CollectionError::ChildNotFound`] if `child` was never added.
    pub fn remove_child(&self, child: &Arc<dyn NodeCollection>) -> Result<()> {
        let entry = {
            let mut children = self.children.lock();
            let position = children
                .iter()
                .position(|entry| same_collection(&entry.collection, child))
                .ok_or(CollectionError::ChildNotFound)?;
            children.remove(position)
        };
        entry.collection.changed().disconnect(entry.subscription);
        self.state.invalidate();
        Ok(())
    }

    fn compute(&self) -> IndexSet {
        let children = self.children.lock();
        let mut iter = children.iter();
        let Some(first) = iter.next() else {
            // Zero children yield the empty set for both operators.
            return IndexSet::new();
        };
        let mut result = first.collection.index_set();
        for entry in iter {
            let child_set = entry.collection.index_set();
            match self.operator {
                CombineOperator::Union => result.union_with(&child_set),
                CombineOperator::Intersection => result.intersect_with(&child_set),
            }
        }
        result
    }
}

impl NodeCollection for CombinedNodeCollection {
    fn kind(&self) -> CollectionKind {
        match self.operator {
            CombineOperator::Union => CollectionKind::Union,
            CombineOperator::Intersection => CollectionKind::Intersection,
        }
    }

    fn index_set(&self) -> IndexSet {
        let mut cache = self.state.cache.lock();
        match cache.as_ref() {
            Some(set) => set.clone(),
            None => {
                tracing::trace!(
                    target: "stratum_collections::combined",
                    operator = ?self.operator,
                    "recomputing combinator result"
                );
                let set = self.compute();
                *cache = Some(set.clone());
                set
            }
        }
    }

    fn is_loading(&self) -> bool {
        self.children
            .lock()
            .iter()
            .any(|entry| entry.collection.is_loading())
    }

    fn changed(&self) -> &Signal<()> {
        &self.state.changed
    }

    /// Clear every child collection.
    ///
    /// Fails with the first child's error if any child does not support
    /// clearing (for example an inverted child).
    fn clear(&self) -> Result<()> {
        let children: Vec<_> = self
            .children
            .lock()
            .iter()
            .map(|entry| Arc::clone(&entry.collection))
            .collect();
        for child in children {
            child.clear()?;
        }
        Ok(())
    }
}

impl Drop for CombinedNodeCollection {
    fn drop(&mut self) {
        for entry in self.children.lock().drain(..) {
            entry.collection.changed().disconnect(entry.subscription);
        }
    }
}

impl std::fmt::Debug for CombinedNodeCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedNodeCollection")
            .field("operator", &self.operator)
            .field("children", &self.child_count())
            .finish_non_exhaustive()
    }
}

/// The complement of a child collection against a fixed universe `[0, n)`.
///
/// The result is cached and invalidated on child changes, like the other
/// combinators. `clear()` is rejected: clearing the child would make the
/// inversion cover the whole model, which is never what a caller wants from
/// "clear".
pub struct InvertedNodeCollection {
    child: Arc<dyn NodeCollection>,
    subscription: ConnectionId,
    universe_size: u64,
    state: Arc<DerivedState>,
}

impl InvertedNodeCollection {
    /// Invert `child` against the universe `[0, universe_size)`.
    pub fn new(child: Arc<dyn NodeCollection>, universe_size: u64) -> Self {
        let state = DerivedState::new();
        let state_clone = Arc::clone(&state);
        let subscription = child.changed().connect(move |_| state_clone.invalidate());
        Self {
            child,
            subscription,
            universe_size,
            state,
        }
    }

    /// The fixed universe size the child is complemented against.
    pub fn universe_size(&self) -> u64 {
        self.universe_size
    }
}

impl NodeCollection for InvertedNodeCollection {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Inverted
    }

    fn index_set(&self) -> IndexSet {
        let mut cache = self.state.cache.lock();
        match cache.as_ref() {
            Some(set) => set.clone(),
            None => {
                let mut set = IndexSet::from(NumericRange::new(0, self.universe_size));
                set.difference_with(&self.child.index_set());
                *cache = Some(set.clone());
                set
            }
        }
    }

    fn is_loading(&self) -> bool {
        self.child.is_loading()
    }

    fn changed(&self) -> &Signal<()> {
        &self.state.changed
    }

    fn clear(&self) -> Result<()> {
        Err(CollectionError::ClearUnsupported)
    }
}

impl Drop for InvertedNodeCollection {
    fn drop(&mut self) {
        self.child.changed().disconnect(self.subscription);
    }
}

impl std::fmt::Debug for InvertedNodeCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvertedNodeCollection")
            .field("universe_size", &self.universe_size)
            .finish_non_exhaustive()
    }
}
