//! # jpql-query
//!
//! Query building for parsed JPQL modify statements.
//!
//! This crate bridges the [`jpql`] parser and an application's mapping
//! metadata: it walks a parsed expression tree and incrementally populates
//! an executable query object.
//!
//! ## Key pieces
//!
//! - [`ModifyQueryBuilder`]: shared depth-first traversal over the tree
//! - [`DeleteAllQuery`] / [`UpdateAllQuery`]: the query kinds, behind the
//!   [`ModifyAllQuery`] trait
//! - [`QueryBuilderContext`]: per-build state (base expression, metadata)
//! - [`MetadataProvider`]: the seam to the application's class metadata
//!
//! ## Quick Start
//!
//! ```rust
//! use jpql::{parse_query, GrammarRegistry, TypeCatalog};
//! use jpql_query::{build_modify_query, MetadataProvider, ModifyQuery};
//!
//! struct Identity;
//! impl MetadataProvider for Identity {
//!     fn class_for_entity(&self, entity_name: &str) -> Option<String> {
//!         Some(entity_name.to_string())
//!     }
//! }
//!
//! let grammar = GrammarRegistry::jpql();
//! let types = TypeCatalog::new();
//!
//! let built = build_modify_query(
//!     "DELETE FROM Employee e WHERE e.salary > 100000",
//!     &grammar,
//!     &types,
//!     &Identity,
//! ).unwrap();
//! assert!(matches!(built, ModifyQuery::Delete(_)));
//! ```
//!
//! ## Build semantics
//!
//! - The first range variable declaration establishes the expression
//!   builder and the reference class; later declarations never override
//!   the reference class.
//! - Each where clause visit replaces the selection criteria; the latest
//!   one wins.
//! - SET items are collected in declared order; only update queries accept
//!   them.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod builder;
mod context;
mod criteria;
mod error;
mod query;
mod traits;

pub use builder::{build_modify_query, ModifyQuery, ModifyQueryBuilder};
pub use context::QueryBuilderContext;
pub use criteria::{Expression, ExpressionBuilder, Value};
pub use error::{QueryBuildError, QueryBuildResult};
pub use query::{DeleteAllQuery, ModifyAllQuery, UpdateAllQuery, UpdateAssignment};
pub use traits::MetadataProvider;

// Re-export commonly used types from dependencies for convenience
pub use jpql::{ArithmeticOp, ComparisonOp, ExpressionNode};
