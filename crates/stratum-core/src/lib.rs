//! Core systems for Stratum.
//!
//! This crate provides the foundational components of the Stratum node-styling
//! engine:
//!
//! - **NumericRange**: A closed-open interval of tree indices
//! - **IndexSet**: A set of tree indices stored as a balanced tree of disjoint
//!   ranges, with full set algebra
//! - **Signal/Slot System**: Change notification for observable collections
//!
//! Tree indices identify renderable nodes of a large CAD or point-cloud model.
//! The sets handled here routinely span hundreds of thousands of contiguous
//! indices, which is why [`IndexSet`] stores *ranges* rather than individual
//! integers: a span of a million contiguous nodes costs one tree leaf, and
//! membership tests stay logarithmic in the number of disjoint ranges.
//!
//! # Example
//!
//! ```
//! use stratum_core::{IndexSet, NumericRange};
//!
//! let mut set = IndexSet::new();
//! set.add_range(NumericRange::new(0, 1000));
//! set.remove(500);
//!
//! assert_eq!(set.count(), 999);
//! assert!(set.contains(499));
//! assert!(!set.contains(500));
//! assert_eq!(set.range_count(), 2);
//! ```
//!
//! # Signal Example
//!
//! ```
//! use stratum_core::Signal;
//!
//! let changed = Signal::<()>::new();
//! let conn_id = changed.connect(|_| println!("set changed"));
//! changed.emit(());
//! changed.disconnect(conn_id);
//! ```

mod error;
mod index_set;
mod range;
pub mod signal;

pub use error::{RangeError, Result};
pub use index_set::{IndexSet, Ranges};
pub use range::NumericRange;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
