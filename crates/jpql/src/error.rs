//! Error types for grammar construction and JPQL parsing.

use thiserror::Error;

/// Errors raised while building or consulting a [`GrammarRegistry`].
///
/// These indicate a malformed grammar definition and are treated as
/// programmer errors: a well-formed grammar never produces them at
/// parse time.
///
/// [`GrammarRegistry`]: crate::GrammarRegistry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A rule with this identifier is already registered.
    #[error("duplicate grammar rule: {0}")]
    DuplicateRule(String),

    /// No rule with this identifier is registered.
    #[error("unknown grammar rule: {0}")]
    UnknownRule(String),

    /// The fallback chain starting at this rule revisits a rule.
    #[error("cyclic fallback chain starting at rule: {0}")]
    CyclicFallback(String),
}

/// Result type for grammar registry operations.
pub type GrammarResult<T> = std::result::Result<T, GrammarError>;

/// Errors that can occur while parsing a JPQL query string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The query text does not match the grammar.
    ///
    /// Carries the byte offset of the offending token and the identifier
    /// of the rule that was active when the parse failed.
    #[error("parse error at position {position} in rule `{rule}`: {message}")]
    Syntax {
        /// Byte offset of the token where the error occurred.
        position: usize,
        /// Identifier of the grammar rule active at the failure point.
        rule: String,
        /// Description of the error.
        message: String,
    },

    /// A string literal was opened but never closed.
    #[error("unterminated string literal at position {0}")]
    UnterminatedString(usize),

    /// A character that cannot start any token.
    #[error("unexpected character `{character}` at position {position}")]
    UnexpectedCharacter {
        /// Byte offset of the character.
        position: usize,
        /// The offending character.
        character: char,
    },

    /// Empty input provided.
    #[error("empty query string")]
    EmptyQuery,

    /// The grammar itself is malformed (unknown start rule, cyclic fallback).
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
}

impl ParseError {
    /// Returns the byte position associated with this error, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { position, .. } => Some(*position),
            ParseError::UnterminatedString(position) => Some(*position),
            ParseError::UnexpectedCharacter { position, .. } => Some(*position),
            ParseError::EmptyQuery | ParseError::Grammar(_) => None,
        }
    }

    /// Returns the identifier of the rule active at the failure point, if any.
    pub fn rule(&self) -> Option<&str> {
        match self {
            ParseError::Syntax { rule, .. } => Some(rule),
            _ => None,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_error_display() {
        let err = GrammarError::DuplicateRule("literal".to_string());
        assert_eq!(err.to_string(), "duplicate grammar rule: literal");

        let err = GrammarError::UnknownRule("no_such_rule".to_string());
        assert_eq!(err.to_string(), "unknown grammar rule: no_such_rule");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::Syntax {
            position: 12,
            rule: "where_clause".to_string(),
            message: "expected a conditional expression".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parse error at position 12 in rule `where_clause`: expected a conditional expression"
        );
    }

    #[test]
    fn test_parse_error_position() {
        let err = ParseError::UnterminatedString(4);
        assert_eq!(err.position(), Some(4));
        assert_eq!(ParseError::EmptyQuery.position(), None);
    }

    #[test]
    fn test_parse_error_from_grammar_error() {
        let err: ParseError = GrammarError::UnknownRule("statement".to_string()).into();
        assert!(matches!(err, ParseError::Grammar(_)));
        assert_eq!(err.rule(), None);
    }
}
