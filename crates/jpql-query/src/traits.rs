//! Traits for query building collaborators.
//!
//! This module defines the [`MetadataProvider`] trait that must be
//! implemented by whatever holds the application's mapping metadata.
//!
//! # Architecture Note
//!
//! This crate intentionally does NOT depend on `jpql-runtime` to avoid
//! cyclic dependencies. The trait is defined here, but implementations for
//! concrete catalog types live in the consuming crate.
//!
//! # Example: Implementing MetadataProvider
//!
//! ```rust
//! use jpql_query::MetadataProvider;
//! use std::collections::HashMap;
//!
//! struct SimpleMetadata {
//!     classes: HashMap<String, String>,
//! }
//!
//! impl MetadataProvider for SimpleMetadata {
//!     fn class_for_entity(&self, entity_name: &str) -> Option<String> {
//!         self.classes.get(entity_name).cloned()
//!     }
//! }
//! ```

/// Resolves abstract schema (entity) names to mapped class names.
///
/// The query builder consults this when a range variable declaration names
/// an entity: the resolved class becomes the query's reference class.
pub trait MetadataProvider: Send + Sync {
    /// Resolves an entity name to its fully qualified mapped class name.
    ///
    /// Returns `None` when the name is not a mapped entity.
    fn class_for_entity(&self, entity_name: &str) -> Option<String>;
}
