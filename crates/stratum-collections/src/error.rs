//! Error types for node collections.

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Result type alias for paged-source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Errors reported by the paged-source collaborator.
///
/// The source itself (HTTP client, test double, ...) lives outside this
/// crate; its failures cross the boundary as one of these variants.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// A page request failed.
    #[error("page request failed: {0}")]
    Request(String),

    /// The source returned a continuation it can no longer honor.
    #[error("invalid page cursor: {0}")]
    InvalidCursor(String),
}

/// Errors that can occur when operating on node collections.
///
/// Note that *interruption* of a paged population is not an error: a
/// superseded operation reports `Ok(false)` from its walk instead.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// `clear()` was called on an inverted collection.
    ///
    /// Clearing the child of an inversion would make the inverted result
    /// "everything", which is never the intended semantic, so the operation
    /// is rejected as a precondition violation.
    #[error("clear() is not supported on an inverted collection")]
    ClearUnsupported,

    /// A collection was removed from a combiner it was never added to.
    #[error("collection is not a child of this combiner")]
    ChildNotFound,

    /// The paged source failed while populating the collection.
    ///
    /// Pages merged before the failure remain in the collection; callers
    /// that need all-or-nothing semantics should `clear()` on failure.
    #[error(transparent)]
    Source(#[from] SourceError),
}
