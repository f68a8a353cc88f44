//! The ordered registry of styled node collections.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;

use stratum_collections::NodeCollection;
use stratum_core::{ConnectionId, IndexSet, Signal};

use crate::appearance::NodeAppearance;
use crate::error::{Result, StyleError};

/// Stable identifier of one provider binding.
///
/// Ids are never reused within a provider; the texture builder keys its
/// "last applied" baseline on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(u32);

struct Binding {
    id: BindingId,
    revision: u32,
    collection: Arc<dyn NodeCollection>,
    appearance: NodeAppearance,
    subscription: ConnectionId,
}

/// State shared with the per-binding change subscriptions.
struct ProviderInner {
    bindings: Mutex<Vec<Binding>>,
    changed: Signal<()>,
    loading_state_changed: Signal<bool>,
    last_loading: AtomicBool,
}

impl ProviderInner {
    fn is_loading(&self) -> bool {
        self.bindings
            .lock()
            .iter()
            .any(|binding| binding.collection.is_loading())
    }

    /// Emit `changed`, and `loading_state_changed` if the aggregate loading
    /// flag flipped. Must be called with the bindings lock released.
    fn notify(&self) {
        self.changed.emit(());
        let loading = self.is_loading();
        if self.last_loading.swap(loading, Ordering::SeqCst) != loading {
            self.loading_state_changed.emit(loading);
        }
    }

    /// Bump the revision of the binding watching `id`, then notify.
    fn on_collection_changed(&self, id: BindingId) {
        {
            let mut bindings = self.bindings.lock();
            if let Some(binding) = bindings.iter_mut().find(|binding| binding.id == id) {
                binding.revision += 1;
            } else {
                // The binding was unassigned between emission and delivery.
                return;
            }
        }
        self.notify();
    }
}

/// An ordered registry of `(NodeCollection, NodeAppearance)` bindings.
///
/// Each binding carries a stable [`BindingId`] and a revision counter that
/// starts at 0 and increments every time the bound collection signals a
/// change. Consumers replay the bindings with
/// [`visit_bindings`](Self::visit_bindings) in assignment order; on
/// overlapping indices, later bindings take precedence.
///
/// The provider aggregates its collections' loading flags into
/// [`is_loading`](Self::is_loading) and fires
/// [`loading_state_changed`](Self::loading_state_changed) on every
/// transition of that aggregate.
pub struct NodeStyleProvider {
    inner: Arc<ProviderInner>,
    next_id: AtomicU32,
}

impl Default for NodeStyleProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStyleProvider {
    /// Create a provider with no bindings.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                bindings: Mutex::new(Vec::new()),
                changed: Signal::new(),
                loading_state_changed: Signal::new(),
                last_loading: AtomicBool::new(false),
            }),
            next_id: AtomicU32::new(0),
        }
    }

    /// Bind `appearance` to `collection`, appending a new binding.
    ///
    /// If `collection` is already bound, its appearance is replaced in place
    /// (keeping the binding's id, revision and position) and the replacement
    /// counts as a change.
    pub fn assign(&self, collection: Arc<dyn NodeCollection>, appearance: NodeAppearance) {
        {
            let mut bindings = self.inner.bindings.lock();
            if let Some(binding) = bindings
                .iter_mut()
                .find(|binding| Arc::ptr_eq(&binding.collection, &collection))
            {
                binding.appearance = appearance;
                drop(bindings);
                self.inner.notify();
                return;
            }

            let id = BindingId(self.next_id.fetch_add(1, Ordering::SeqCst));
            let inner = Arc::clone(&self.inner);
            let subscription = collection
                .changed()
                .connect(move |_| inner.on_collection_changed(id));
            tracing::debug!(
                target: "stratum_style::provider",
                binding = id.0,
                "collection bound"
            );
            bindings.push(Binding {
                id,
                revision: 0,
                collection,
                appearance,
                subscription,
            });
        }
        self.inner.notify();
    }

    /// Remove the binding for `collection` and cancel its subscription.
    ///
    /// Returns [`StyleError::BindingNotFound`] if `collection` was never
    /// assigned.
    pub fn unassign(&self, collection: &Arc<dyn NodeCollection>) -> Result<()> {
        let binding = {
            let mut bindings = self.inner.bindings.lock();
            let position = bindings
                .iter()
                .position(|binding| Arc::ptr_eq(&binding.collection, collection))
                .ok_or(StyleError::BindingNotFound)?;
            bindings.remove(position)
        };
        binding.collection.changed().disconnect(binding.subscription);
        tracing::debug!(
            target: "stratum_style::provider",
            binding = binding.id.0,
            "collection unbound"
        );
        self.inner.notify();
        Ok(())
    }

    /// Replay all current bindings in assignment order.
    ///
    /// The visitor receives each binding's id, revision, a clone of the
    /// collection's current set, and the bound appearance. Later bindings
    /// take precedence on overlapping indices.
    pub fn visit_bindings(&self, mut visitor: impl FnMut(BindingId, u32, IndexSet, NodeAppearance)) {
        // Snapshot outside the lock; index_set() may take collection locks.
        let snapshot: Vec<(BindingId, u32, Arc<dyn NodeCollection>, NodeAppearance)> = self
            .inner
            .bindings
            .lock()
            .iter()
            .map(|binding| {
                (
                    binding.id,
                    binding.revision,
                    Arc::clone(&binding.collection),
                    binding.appearance,
                )
            })
            .collect();
        for (id, revision, collection, appearance) in snapshot {
            visitor(id, revision, collection.index_set(), appearance);
        }
    }

    /// Number of current bindings.
    pub fn binding_count(&self) -> usize {
        self.inner.bindings.lock().len()
    }

    /// Whether any bound collection is still being populated.
    pub fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    /// Emitted whenever the styling result may have changed: a binding was
    /// assigned, replaced or unassigned, or a bound collection changed.
    pub fn changed(&self) -> &Signal<()> {
        &self.inner.changed
    }

    /// Emitted with the new aggregate flag whenever
    /// [`is_loading`](Self::is_loading) flips.
    pub fn loading_state_changed(&self) -> &Signal<bool> {
        &self.inner.loading_state_changed
    }
}

impl Drop for NodeStyleProvider {
    fn drop(&mut self) {
        for binding in self.inner.bindings.lock().drain(..) {
            binding.collection.changed().disconnect(binding.subscription);
        }
    }
}

impl fmt::Debug for NodeStyleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeStyleProvider")
            .field("bindings", &self.binding_count())
            .field("is_loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_collections::{CollectionKind, SimpleNodeCollection};
    use stratum_core::NumericRange;

    fn simple(from: u64, count: u64) -> Arc<SimpleNodeCollection> {
        let collection = SimpleNodeCollection::new();
        collection.add_range(NumericRange::new(from, count));
        Arc::new(collection)
    }

    fn visit_all(provider: &NodeStyleProvider) -> Vec<(BindingId, u32, IndexSet, NodeAppearance)> {
        let mut seen = Vec::new();
        provider.visit_bindings(|id, revision, set, appearance| {
            seen.push((id, revision, set, appearance));
        });
        seen
    }

    #[test]
    fn test_assign_and_visit_in_order() {
        let provider = NodeStyleProvider::new();
        let a = simple(0, 5);
        let b = simple(10, 5);

        provider.assign(a as Arc<dyn NodeCollection>, NodeAppearance::HIGHLIGHTED);
        provider.assign(b as Arc<dyn NodeCollection>, NodeAppearance::GHOSTED);

        let seen = visit_all(&provider);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].3, NodeAppearance::HIGHLIGHTED);
        assert_eq!(seen[1].3, NodeAppearance::GHOSTED);
        assert!(seen[0].0 < seen[1].0);
        assert_eq!(seen[0].1, 0);
        assert_eq!(seen[0].2.count(), 5);
    }

    #[test]
    fn test_collection_change_bumps_revision_and_notifies() {
        let provider = NodeStyleProvider::new();
        let collection = simple(0, 5);
        provider.assign(
            collection.clone() as Arc<dyn NodeCollection>,
            NodeAppearance::HIGHLIGHTED,
        );

        let changes = Arc::new(AtomicU32::new(0));
        let changes_clone = changes.clone();
        provider.changed().connect(move |_| {
            changes_clone.fetch_add(1, Ordering::SeqCst);
        });

        collection.add_range(NumericRange::new(100, 1));
        collection.add_range(NumericRange::new(200, 1));

        let seen = visit_all(&provider);
        assert_eq!(seen[0].1, 2);
        assert_eq!(changes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reassign_replaces_appearance_in_place() {
        let provider = NodeStyleProvider::new();
        let collection = simple(0, 5) as Arc<dyn NodeCollection>;
        provider.assign(Arc::clone(&collection), NodeAppearance::HIGHLIGHTED);
        let original_id = visit_all(&provider)[0].0;

        let notified = Arc::new(AtomicBool::new(false));
        let notified_clone = notified.clone();
        provider.changed().connect(move |_| {
            notified_clone.store(true, Ordering::SeqCst);
        });

        provider.assign(Arc::clone(&collection), NodeAppearance::HIDDEN);

        let seen = visit_all(&provider);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, original_id);
        assert_eq!(seen[0].3, NodeAppearance::HIDDEN);
        assert!(notified.load(Ordering::SeqCst));
        // Only one subscription on the collection.
        assert_eq!(collection.changed().connection_count(), 1);
    }

    #[test]
    fn test_unassign() {
        let provider = NodeStyleProvider::new();
        let collection = simple(0, 5) as Arc<dyn NodeCollection>;
        provider.assign(Arc::clone(&collection), NodeAppearance::GHOSTED);
        assert_eq!(provider.binding_count(), 1);

        provider.unassign(&collection).unwrap();
        assert_eq!(provider.binding_count(), 0);
        assert_eq!(collection.changed().connection_count(), 0);

        assert!(matches!(
            provider.unassign(&collection),
            Err(StyleError::BindingNotFound)
        ));
    }

    #[test]
    fn test_loading_state_transitions() {
        use std::sync::atomic::AtomicBool;

        struct LoadingStub {
            loading: AtomicBool,
            changed: Signal<()>,
        }
        impl NodeCollection for LoadingStub {
            fn kind(&self) -> CollectionKind {
                CollectionKind::Paged
            }
            fn index_set(&self) -> IndexSet {
                IndexSet::new()
            }
            fn is_loading(&self) -> bool {
                self.loading.load(Ordering::SeqCst)
            }
            fn changed(&self) -> &Signal<()> {
                &self.changed
            }
            fn clear(&self) -> stratum_collections::Result<()> {
                Ok(())
            }
        }

        let provider = NodeStyleProvider::new();
        let stub = Arc::new(LoadingStub {
            loading: AtomicBool::new(false),
            changed: Signal::new(),
        });
        provider.assign(
            stub.clone() as Arc<dyn NodeCollection>,
            NodeAppearance::DEFAULT,
        );

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let transitions_clone = transitions.clone();
        provider.loading_state_changed().connect(move |&loading| {
            transitions_clone.lock().push(loading);
        });

        stub.loading.store(true, Ordering::SeqCst);
        stub.changed.emit(());
        assert!(provider.is_loading());

        // A change without a loading flip does not re-fire the transition.
        stub.changed.emit(());

        stub.loading.store(false, Ordering::SeqCst);
        stub.changed.emit(());
        assert!(!provider.is_loading());

        assert_eq!(*transitions.lock(), vec![true, false]);
    }

    #[test]
    fn test_drop_disconnects_all_subscriptions() {
        let collection = simple(0, 5);
        {
            let provider = NodeStyleProvider::new();
            provider.assign(
                collection.clone() as Arc<dyn NodeCollection>,
                NodeAppearance::DEFAULT,
            );
            assert_eq!(collection.changed().connection_count(), 1);
        }
        assert_eq!(collection.changed().connection_count(), 0);
    }
}
