//! Error types for the styling system.

/// Result type alias for style operations.
pub type Result<T> = std::result::Result<T, StyleError>;

/// Errors that can occur in the styling system.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    /// A collection was unassigned from a provider it was never assigned to.
    #[error("collection is not bound to this style provider")]
    BindingNotFound,
}
