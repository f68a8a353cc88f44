//! Observable node collections over tree-index sets.
//!
//! A *node collection* wraps one evolving [`IndexSet`](stratum_core::IndexSet)
//! of tree indices, notifies observers through a change signal, and reports
//! whether it is still being populated. Collections compose:
//!
//! - [`SimpleNodeCollection`] holds a set mutated directly by application code.
//! - [`CombinedNodeCollection`] is the lazy union or intersection of child
//!   collections, recomputed on demand when a child changes.
//! - [`InvertedNodeCollection`] is the complement of a child against a fixed
//!   universe of tree indices.
//! - [`PagedNodeCollection`] is populated asynchronously by walking a paged
//!   query against a [`TreeIndexSource`], with interrupt-then-restart
//!   supersession when a new query starts while one is in flight.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stratum_collections::{CombinedNodeCollection, NodeCollection, SimpleNodeCollection};
//! use stratum_core::NumericRange;
//!
//! let walls = Arc::new(SimpleNodeCollection::new());
//! walls.add_range(NumericRange::new(0, 10));
//! let doors = Arc::new(SimpleNodeCollection::new());
//! doors.add_range(NumericRange::new(5, 10));
//!
//! let either = CombinedNodeCollection::union(vec![
//!     walls as Arc<dyn NodeCollection>,
//!     doors as Arc<dyn NodeCollection>,
//! ]);
//! assert_eq!(either.index_set().count(), 15);
//! ```

mod collection;
mod combined;
mod error;
mod paged;
mod paged_collection;
mod source;

pub use collection::{CollectionKind, NodeCollection, SimpleNodeCollection};
pub use combined::{CombineOperator, CombinedNodeCollection, InvertedNodeCollection};
pub use error::{CollectionError, Result, SourceError, SourceResult};
pub use paged::PagedPopulationHelper;
pub use paged_collection::PagedNodeCollection;
pub use source::{
    NextPage, NodeFilter, NodeSpan, PageFuture, PagedResponse, PartitionSlice, PropertyFilter,
    TreeIndexSource, VALUE_BATCH_SIZE,
};
