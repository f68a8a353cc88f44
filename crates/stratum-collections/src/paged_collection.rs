//! A node collection populated asynchronously from a paged source.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, try_join_all};
use parking_lot::{Mutex, RwLock};

use stratum_core::{IndexSet, Signal};

use crate::collection::{CollectionKind, NodeCollection};
use crate::error::{Result, SourceResult};
use crate::paged::PagedPopulationHelper;
use crate::source::{NodeFilter, NodeSpan, PartitionSlice, TreeIndexSource, VALUE_BATCH_SIZE};

/// The target set and helper of the population currently considered live.
///
/// `execute_filter` replaces both atomically (under the state lock), so a
/// superseded operation keeps writing into its own, now-detached target and
/// can never corrupt the set observers see.
struct PopulationState {
    target: Arc<RwLock<IndexSet>>,
    helper: Arc<PagedPopulationHelper>,
}

impl PopulationState {
    fn fresh() -> Self {
        Self {
            target: Arc::new(RwLock::new(IndexSet::new())),
            helper: Arc::new(PagedPopulationHelper::new()),
        }
    }
}

/// A collection whose set is populated by walking a paged query.
///
/// Calling [`execute_filter`](Self::execute_filter) while a previous call is
/// still in flight *interrupts* the previous call: its remaining pages are
/// discarded and the collection starts over into a brand-new empty set. The
/// old set is never partially overwritten; supersession is
/// interrupt-then-restart, not merge.
///
/// Partitioned queries and overlong value lists fan out into concurrent
/// walks ([`VALUE_BATCH_SIZE`] values per request) that all feed the same
/// target set; the collection reports `is_loading` until the last walk of
/// the most recent operation settles.
pub struct PagedNodeCollection {
    source: Arc<dyn TreeIndexSource>,
    state: Mutex<PopulationState>,
    changed: Signal<()>,
}

impl PagedNodeCollection {
    /// Create an empty collection populated through `source`.
    pub fn new(source: Arc<dyn TreeIndexSource>) -> Self {
        Self {
            source,
            state: Mutex::new(PopulationState::fresh()),
            changed: Signal::new(),
        }
    }

    /// Interrupt any in-flight population and install a fresh empty target.
    fn begin_population(&self) -> (Arc<RwLock<IndexSet>>, Arc<PagedPopulationHelper>) {
        let (target, helper) = {
            let mut state = self.state.lock();
            state.helper.interrupt();
            *state = PopulationState::fresh();
            (Arc::clone(&state.target), Arc::clone(&state.helper))
        };
        // The visible set just became empty; tell observers.
        self.changed.emit(());
        (target, helper)
    }

    /// Populate the collection from `filter`, superseding any population
    /// still in flight.
    ///
    /// Returns `Ok(true)` if every page of every partition/batch walk was
    /// merged, `Ok(false)` if this operation was itself superseded before
    /// finishing. A source failure propagates as an error; pages merged
    /// before the failure remain in the set (call
    /// [`clear`](NodeCollection::clear) for all-or-nothing semantics).
    pub async fn execute_filter(&self, filter: NodeFilter) -> Result<bool> {
        let (target, helper) = self.begin_population();

        let mut walks: Vec<BoxFuture<'_, SourceResult<bool>>> = Vec::new();
        let mut push_walk = |first: crate::source::PageFuture<NodeSpan>| {
            let target = Arc::clone(&target);
            let helper = Arc::clone(&helper);
            let changed = &self.changed;
            walks.push(
                async move {
                    helper
                        .populate(first, |span: &NodeSpan| span.to_range(), &target, || {
                            changed.emit(());
                        })
                        .await
                }
                .boxed(),
            );
        };

        match filter {
            NodeFilter::ByProperty { filter, partitions } => {
                let count = partitions.max(1);
                for index in 0..count {
                    let partition = (count > 1).then_some(PartitionSlice { index, count });
                    push_walk(self.source.nodes_by_property(&filter, partition));
                }
            }
            NodeFilter::ByPropertyValues {
                category,
                property,
                values,
            } => {
                for batch in values.chunks(VALUE_BATCH_SIZE) {
                    push_walk(
                        self.source
                            .nodes_by_property_values(&category, &property, batch),
                    );
                }
            }
            NodeFilter::ByAssets { asset_ids } => {
                for batch in asset_ids.chunks(VALUE_BATCH_SIZE) {
                    push_walk(self.source.nodes_by_assets(batch));
                }
            }
        }

        let walk_count = walks.len();
        let results = try_join_all(walks).await?;
        let completed = results.into_iter().all(|walk_completed| walk_completed);
        tracing::debug!(
            target: "stratum_collections::paged",
            walk_count,
            completed,
            "filter execution settled"
        );
        Ok(completed)
    }
}

impl NodeCollection for PagedNodeCollection {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Paged
    }

    fn index_set(&self) -> IndexSet {
        self.state.lock().target.read().clone()
    }

    /// Whether the *most recently started* population is still running.
    ///
    /// A superseded operation that has not yet observed its interruption does
    /// not count.
    fn is_loading(&self) -> bool {
        self.state.lock().helper.is_loading()
    }

    fn changed(&self) -> &Signal<()> {
        &self.changed
    }

    fn clear(&self) -> Result<()> {
        self.begin_population();
        Ok(())
    }
}

impl std::fmt::Debug for PagedNodeCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedNodeCollection")
            .field("is_loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}
