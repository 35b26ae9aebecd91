//! # jpql
//!
//! A Rust library for parsing the Java Persistence Query Language (JPQL)
//! into an expression tree.
//!
//! This crate provides:
//! - **Grammar registry**: JPQL productions as composable BNF rule records
//! - **Parser**: registry-driven recursive descent over a token stream
//! - **Expression AST**: a tagged tree with exact-text literal round-trips
//!
//! ## Usage
//!
//! ```rust
//! use jpql::{parse_query, ExpressionNode, GrammarRegistry, TypeCatalog};
//!
//! let grammar = GrammarRegistry::jpql();
//! let mut types = TypeCatalog::new();
//! types.register_entity("Employee");
//!
//! let tree = parse_query(
//!     "DELETE FROM Employee e WHERE e.salary > 100000",
//!     &grammar,
//!     &types,
//! ).unwrap();
//! assert!(matches!(tree, ExpressionNode::DeleteStatement { .. }));
//! ```
//!
//! The grammar is built once by [`GrammarRegistry::jpql`] and injected into
//! every parse; it is never global state. A custom start rule selects the
//! production to parse:
//!
//! ```rust
//! use jpql::{grammar::rules, parse, GrammarRegistry, TypeCatalog};
//!
//! let grammar = GrammarRegistry::jpql();
//! let types = TypeCatalog::new();
//! let literal = parse("'abc'", rules::LITERAL, &grammar, &types).unwrap();
//! assert_eq!(literal.to_string(), "'abc'");
//! ```
//!
//! ## Literal classification
//!
//! Literal tokens classify by lexical shape, most specific kind first:
//!
//! | Shape | Kind | Example |
//! |-------|------|---------|
//! | quoted text | string | `'abc'` |
//! | digits, optional fraction/exponent/suffix | numeric | `1.5e3`, `10L` |
//! | `TRUE` / `FALSE` (case-insensitive) | boolean | `true` |
//! | dotted path with a registered enum prefix | enum | `com.acme.Status.ACTIVE` |
//! | registered entity name | entity type | `Employee` |
//! | ISO-8601-like token | date/time | `2020-01-31T12:45:00` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod ast;
mod error;
pub mod grammar;
mod lexer;
mod parser;
mod types;

pub use ast::{
    ArithmeticOp, ComparisonOp, DateTimeLiteral, ExpressionNode, Literal, NumericKind,
    NumericLiteral,
};
pub use error::{GrammarError, GrammarResult, ParseError, ParseResult};
pub use grammar::{GrammarRegistry, GrammarRule};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse, parse_query};
pub use types::TypeCatalog;
