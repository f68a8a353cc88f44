//! Prelude module for Stratum.
//!
//! Re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use stratum::prelude::*;
//! ```
//!
//! This provides access to:
//! - Set algebra (`NumericRange`, `IndexSet`)
//! - Change notification (`Signal`, `ConnectionId`)
//! - Node collections (`NodeCollection`, `SimpleNodeCollection`,
//!   `CombinedNodeCollection`, `InvertedNodeCollection`, `PagedNodeCollection`)
//! - Styling (`NodeAppearance`, `NodeStyleProvider`, `AppearanceTextureBuilder`)

// ============================================================================
// Set Algebra
// ============================================================================

pub use stratum_core::{IndexSet, NumericRange, RangeError};

// ============================================================================
// Change Notification
// ============================================================================

pub use stratum_core::{ConnectionGuard, ConnectionId, Signal};

// ============================================================================
// Node Collections
// ============================================================================

pub use stratum_collections::{
    CollectionError, CollectionKind, CombineOperator, CombinedNodeCollection,
    InvertedNodeCollection, NodeCollection, PagedNodeCollection, SimpleNodeCollection,
};

// ============================================================================
// Paged Population
// ============================================================================

pub use stratum_collections::{
    NodeFilter, NodeSpan, PagedPopulationHelper, PagedResponse, PartitionSlice, PropertyFilter,
    SourceError, TreeIndexSource, VALUE_BATCH_SIZE,
};

// ============================================================================
// Styling
// ============================================================================

pub use stratum_style::{
    AppearanceTextureBuilder, BindingId, NodeAppearance, NodeStyleProvider, OutlineColor,
    ResolvedAppearance, StyleError, Texel,
};
