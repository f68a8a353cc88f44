//! Node styling for Stratum: appearance layering and incremental texture
//! building.
//!
//! Application code binds [`NodeAppearance`]s to node collections through a
//! [`NodeStyleProvider`]; an [`AppearanceTextureBuilder`] reconciles the
//! provider's bindings into a flat per-node override buffer plus three
//! classification sets (regular / ghosted / in-front) for the rendering
//! collaborator, touching only the indices whose effective style changed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stratum_collections::{NodeCollection, SimpleNodeCollection};
//! use stratum_core::NumericRange;
//! use stratum_style::{AppearanceTextureBuilder, NodeAppearance, NodeStyleProvider};
//!
//! let provider = Arc::new(NodeStyleProvider::new());
//! let selected = Arc::new(SimpleNodeCollection::new());
//! selected.add_range(NumericRange::new(10, 5));
//! provider.assign(
//!     selected as Arc<dyn NodeCollection>,
//!     NodeAppearance::HIGHLIGHTED,
//! );
//!
//! let mut builder = AppearanceTextureBuilder::new(100, Arc::clone(&provider));
//! builder.build();
//! assert_eq!(builder.in_front_indices().count(), 5);
//! ```

mod appearance;
mod error;
mod provider;
mod texture;

pub use appearance::{NodeAppearance, OutlineColor, ResolvedAppearance};
pub use error::{Result, StyleError};
pub use provider::{BindingId, NodeStyleProvider};
pub use texture::{AppearanceTextureBuilder, Texel};
