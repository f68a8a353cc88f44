//! The `NodeCollection` capability and the simple in-memory variant.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use stratum_core::{IndexSet, NumericRange, Signal};

use crate::error::Result;

/// Discriminates the concrete collection variants for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    /// A fixed or externally mutated set.
    Simple,
    /// A union over child collections.
    Union,
    /// An intersection over child collections.
    Intersection,
    /// The complement of a child collection against a fixed universe.
    Inverted,
    /// A set populated asynchronously from a paged source.
    Paged,
}

/// A named, observable wrapper around one evolving [`IndexSet`].
///
/// A collection owns its current result set and a loading flag, and emits its
/// [`changed`](Self::changed) signal whenever the result evolves. Collections
/// are shared as `Arc<dyn NodeCollection>`; combinators hold non-owning
/// subscriptions to their children's `changed` signals, never the children's
/// lifetimes.
pub trait NodeCollection: Send + Sync {
    /// Which variant this collection is.
    fn kind(&self) -> CollectionKind;

    /// A clone of the current result set.
    ///
    /// For combinator collections this lazily recomputes a cached result if a
    /// child changed since the last call.
    fn index_set(&self) -> IndexSet;

    /// Whether the collection is still being populated.
    ///
    /// Always `false` for collections with no asynchronous population of
    /// their own; combinators report `true` while any child is loading.
    fn is_loading(&self) -> bool;

    /// The change notification signal.
    ///
    /// Emitted whenever the result of [`index_set`](Self::index_set) may have
    /// changed: a page arrived, a child was invalidated, the set was cleared.
    fn changed(&self) -> &Signal<()>;

    /// Reset the collection to the empty set.
    ///
    /// Not every variant supports this; see
    /// [`CollectionError::ClearUnsupported`](crate::CollectionError::ClearUnsupported).
    fn clear(&self) -> Result<()>;
}

impl fmt::Debug for dyn NodeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCollection")
            .field("kind", &self.kind())
            .field("is_loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

/// Compare two collection handles by identity.
pub(crate) fn same_collection(a: &Arc<dyn NodeCollection>, b: &Arc<dyn NodeCollection>) -> bool {
    Arc::ptr_eq(a, b)
}

/// A collection holding a fixed or externally mutated set.
///
/// `SimpleNodeCollection` never loads anything itself; application code
/// assigns or mutates its set and the collection notifies observers.
///
/// # Example
///
/// ```
/// use stratum_collections::{NodeCollection, SimpleNodeCollection};
/// use stratum_core::NumericRange;
///
/// let collection = SimpleNodeCollection::new();
/// collection.add_range(NumericRange::new(0, 100));
/// assert_eq!(collection.index_set().count(), 100);
/// ```
#[derive(Debug, Default)]
pub struct SimpleNodeCollection {
    set: RwLock<IndexSet>,
    changed: Signal<()>,
}

impl SimpleNodeCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection seeded with `set`.
    pub fn from_set(set: IndexSet) -> Self {
        Self {
            set: RwLock::new(set),
            changed: Signal::new(),
        }
    }

    /// Replace the entire set and notify observers.
    pub fn update_set(&self, set: IndexSet) {
        *self.set.write() = set;
        self.changed.emit(());
    }

    /// Add a range of indices and notify observers.
    pub fn add_range(&self, range: NumericRange) {
        self.set.write().add_range(range);
        self.changed.emit(());
    }

    /// Remove a range of indices and notify observers.
    pub fn remove_range(&self, range: NumericRange) {
        self.set.write().remove_range(range);
        self.changed.emit(());
    }
}

impl NodeCollection for SimpleNodeCollection {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Simple
    }

    fn index_set(&self) -> IndexSet {
        self.set.read().clone()
    }

    fn is_loading(&self) -> bool {
        false
    }

    fn changed(&self) -> &Signal<()> {
        &self.changed
    }

    fn clear(&self) -> Result<()> {
        self.set.write().clear();
        self.changed.emit(());
        Ok(())
    }
}
