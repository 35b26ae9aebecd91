//! Error types for query building.

use thiserror::Error;

/// Errors that can occur while building a query from a parsed tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryBuildError {
    /// JPQL parse error from the jpql parser.
    #[error("JPQL parse error: {0}")]
    Parse(#[from] jpql::ParseError),

    /// The entity name of a range variable declaration is not known to the
    /// metadata provider.
    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    /// An expression was built before any range variable declaration
    /// established the base expression.
    #[error("no range variable declaration established a base expression")]
    MissingBaseExpression,

    /// A literal's text could not be converted to a runtime value.
    #[error("`{literal}` is not a valid {kind} literal")]
    InvalidLiteral {
        /// The literal text as written.
        literal: String,
        /// The value kind that failed to convert.
        kind: &'static str,
    },

    /// An expression node kind that cannot appear in selection criteria.
    #[error("expression kind `{0}` is not supported in selection criteria")]
    UnsupportedExpression(String),

    /// The target query kind does not accept update items.
    #[error("a {0} does not accept update items")]
    InvalidUpdateItem(&'static str),

    /// An update item's target is not a state field path.
    #[error("update item must assign to a state field path")]
    InvalidUpdateTarget,
}

/// Result type for query building operations.
pub type QueryBuildResult<T> = std::result::Result<T, QueryBuildError>;
