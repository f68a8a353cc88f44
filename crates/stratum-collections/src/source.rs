//! The paged-source collaborator interface.
//!
//! The network/query layer that actually talks to the host API lives outside
//! this crate. Collections only depend on the small capability defined here:
//! a filter goes in, pages of tree-index spans come back, and each page
//! optionally carries a continuation for the next one.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use stratum_core::NumericRange;

use crate::error::SourceResult;

/// Maximum number of values sent in a single property-value-list or asset
/// request. Longer lists are split into batches of this size and fetched
/// concurrently.
pub const VALUE_BATCH_SIZE: usize = 1000;

/// A boxed future resolving to one page of results.
pub type PageFuture<T> = BoxFuture<'static, SourceResult<PagedResponse<T>>>;

/// Continuation producing the next page of a paged response.
pub type NextPage<T> = Box<dyn FnOnce() -> PageFuture<T> + Send>;

/// One page of a cursor-based paged response.
pub struct PagedResponse<T> {
    /// The items of this page.
    pub items: Vec<T>,
    /// Continuation for the next page, or `None` on the last page.
    pub next: Option<NextPage<T>>,
}

impl<T> PagedResponse<T> {
    /// A terminal page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    /// A page followed by more results.
    pub fn with_next<F>(items: Vec<T>, next: F) -> Self
    where
        F: FnOnce() -> PageFuture<T> + Send + 'static,
    {
        Self {
            items,
            next: Some(Box::new(next)),
        }
    }
}

impl<T> std::fmt::Debug for PagedResponse<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedResponse")
            .field("items", &self.items.len())
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

/// One matched node, as reported by the source.
///
/// A node owns the contiguous tree-index span
/// `[tree_index, tree_index + subtree_size)` covering itself and its
/// descendants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpan {
    /// Tree index of the matched node.
    pub tree_index: u64,
    /// Number of nodes in the subtree rooted at the match, itself included.
    pub subtree_size: u64,
}

impl NodeSpan {
    /// The tree-index range covered by this node's subtree.
    pub fn to_range(self) -> NumericRange {
        NumericRange::new(self.tree_index, self.subtree_size)
    }
}

/// A single node-property predicate: `category.property == value`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// Property category, e.g. `"PDMS"`.
    pub category: String,
    /// Property name within the category, e.g. `":capStatus"`.
    pub property: String,
    /// Required value.
    pub value: String,
}

/// One of `count` parallel slices of a partitioned query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSlice {
    /// Zero-based partition index.
    pub index: u32,
    /// Total number of partitions.
    pub count: u32,
}

/// The filter criteria a [`PagedNodeCollection`](crate::PagedNodeCollection)
/// can be populated from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeFilter {
    /// Nodes whose property matches a single value.
    ///
    /// `partitions > 1` splits the query into that many parallel partition
    /// walks, all feeding the same result set.
    ByProperty {
        /// The predicate to match.
        filter: PropertyFilter,
        /// Number of parallel partitions; `0` and `1` both mean unpartitioned.
        partitions: u32,
    },
    /// Nodes whose property matches any value in a list.
    ///
    /// The list is split into batches of [`VALUE_BATCH_SIZE`] values, fetched
    /// concurrently.
    ByPropertyValues {
        /// Property category.
        category: String,
        /// Property name within the category.
        property: String,
        /// Accepted values.
        values: Vec<String>,
    },
    /// Nodes mapped to any of the given assets.
    ///
    /// Asset id lists are batched like property-value lists.
    ByAssets {
        /// Asset identifiers in the host system.
        asset_ids: Vec<u64>,
    },
}

/// The query capability a paged collection is populated through.
///
/// Implementations wrap the host API client (or a test double). Each method
/// returns the *first* page; subsequent pages come from the response's
/// continuation.
pub trait TreeIndexSource: Send + Sync {
    /// Nodes matching a property predicate, optionally one partition of a
    /// partitioned query.
    fn nodes_by_property(
        &self,
        filter: &PropertyFilter,
        partition: Option<PartitionSlice>,
    ) -> PageFuture<NodeSpan>;

    /// Nodes whose `category.property` matches any of `values`.
    ///
    /// `values` is at most [`VALUE_BATCH_SIZE`] entries; batching is the
    /// caller's concern.
    fn nodes_by_property_values(
        &self,
        category: &str,
        property: &str,
        values: &[String],
    ) -> PageFuture<NodeSpan>;

    /// Nodes mapped to any of `asset_ids` (at most [`VALUE_BATCH_SIZE`]).
    fn nodes_by_assets(&self, asset_ids: &[u64]) -> PageFuture<NodeSpan>;
}
