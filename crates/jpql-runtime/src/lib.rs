//! # jpql-runtime
//!
//! Identity map registry and runtime services for a JPQL-backed
//! persistence session.
//!
//! This crate owns the session-side cache state:
//!
//! - **`ClassCatalog`**: mapped classes with inheritance links, the
//!   authority class names resolve against
//! - **`IdentityMap`**: one per-inheritance-root cache from primary key to
//!   live instance, with seven eviction policies
//! - **`IdentityMapRegistry`**: the thread-safe table of identity maps
//! - **`RuntimeServices`**: the administrative facade a management layer
//!   talks to (class summaries, invalidation, pool statistics)
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use jpql_runtime::{CachePolicy, ClassCatalog, IdentityMapRegistry, RuntimeServices};
//!
//! let mut catalog = ClassCatalog::new();
//! catalog.register("com.acme.Employee", None).unwrap();
//! catalog.register("com.acme.Manager", Some("com.acme.Employee")).unwrap();
//!
//! let registry: IdentityMapRegistry<String> = IdentityMapRegistry::new(Arc::new(catalog));
//! registry.get_or_create("com.acme.Employee", CachePolicy::SoftWeak { max_size: 100 }).unwrap();
//!
//! // Subclass objects land in the root's cache
//! registry.put("com.acme.Manager", "7".into(), Arc::new("Morgan".to_string())).unwrap();
//! assert_eq!(registry.size_of("com.acme.Employee", true).unwrap(), 1);
//!
//! // Administrative view
//! let services = RuntimeServices::new("example-session", &registry);
//! let rows = services.class_summary_using_filter("acme");
//! assert_eq!(rows.len(), 2);
//! ```
//!
//! ## Cache types
//!
//! | Policy | Retention |
//! |--------|-----------|
//! | `Full` | unbounded, strong |
//! | `Cache` | bounded, least recently used evicted |
//! | `Weak` | weak handles only |
//! | `SoftWeak` | weak + soft buffer of recent objects |
//! | `HardWeak` | weak + hard buffer of recent objects |
//! | `Soft` | strong until memory pressure |
//! | `None` | nothing |
//!
//! ## Concurrency
//!
//! The registry is the only structure shared across threads: a
//! registry-level read/write lock guards structural changes, and each
//! identity map has its own mutex. The query-building side
//! (`jpql-query`) needs no locking; this crate's [`ClassCatalog`]
//! implements its `MetadataProvider` seam.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod catalog;
mod error;
mod identity_map;
mod policy;
mod pool;
mod registry;
mod service;

pub use catalog::{ClassCatalog, ClassDescriptor, ClassId};
pub use error::{RuntimeError, RuntimeResult};
pub use identity_map::{CacheKey, IdentityMap};
pub use policy::CachePolicy;
pub use pool::{ConnectionPoolProvider, PoolInfo};
pub use registry::IdentityMapRegistry;
pub use service::{ClassSummaryRow, RuntimeServices, SessionKind};

// Re-export the metadata seam so catalog users need not depend on
// jpql-query directly.
pub use jpql_query::MetadataProvider;
