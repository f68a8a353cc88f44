//! Stratum - tree-index set algebra and incremental node styling for large
//! 3D CAD models.
//!
//! This is the main umbrella crate that re-exports all public APIs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stratum::prelude::*;
//!
//! let selected = Arc::new(SimpleNodeCollection::new());
//! selected.add_range(NumericRange::new(100, 25));
//!
//! let provider = Arc::new(NodeStyleProvider::new());
//! provider.assign(
//!     selected as Arc<dyn NodeCollection>,
//!     NodeAppearance::HIGHLIGHTED,
//! );
//!
//! let mut builder = AppearanceTextureBuilder::new(1_000, Arc::clone(&provider));
//! builder.build();
//! assert_eq!(builder.in_front_indices().count(), 25);
//! ```

pub use stratum_core::*;

/// Node collections and the paged population layer.
pub mod collections {
    pub use stratum_collections::*;
}

/// Appearance records, the style provider, and the texture builder.
pub mod style {
    pub use stratum_style::*;
}

pub mod prelude;
