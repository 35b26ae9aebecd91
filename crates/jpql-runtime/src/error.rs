//! Error types for the runtime crate.

use thiserror::Error;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during identity map and catalog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The class is known but owns no identity map entry yet.
    #[error("class is not mapped to an identity map: {0}")]
    UnmappedClass(String),

    /// The textual class name is unknown to the class catalog.
    #[error("unknown class name: {0}")]
    ClassResolution(String),

    /// The class name is already registered with the catalog.
    #[error("class is already registered: {0}")]
    DuplicateClass(String),

    /// A subclass requested a cache configuration diverging from its
    /// root's. Defensive: indicates a mapping-configuration bug upstream.
    #[error("cache type for `{class}` diverges from its root `{root}`: expected {expected}, got {actual}")]
    CacheInvariant {
        /// The class whose request diverged.
        class: String,
        /// The inheritance root owning the cache.
        root: String,
        /// The cache type already installed for the root.
        expected: String,
        /// The diverging cache type that was requested.
        actual: String,
    },
}
