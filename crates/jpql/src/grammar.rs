//! BNF rule registry driving the JPQL parser.
//!
//! Grammar productions are plain data records: a unique string identifier,
//! an ordered list of child rule identifiers, and an optional fallback rule
//! tried when no child matches. The registry is built once by
//! [`GrammarRegistry::jpql`], is immutable afterwards, and is shared
//! read-only across all parses.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{GrammarError, GrammarResult};

/// Identifiers of the built-in JPQL grammar rules.
pub mod rules {
    /// Top-level production: a delete or update statement.
    pub const STATEMENT: &str = "statement";

    /// `DELETE FROM range_variable_declaration [where_clause]`
    pub const DELETE_STATEMENT: &str = "delete_statement";

    /// `UPDATE range_variable_declaration SET update_item, ... [where_clause]`
    pub const UPDATE_STATEMENT: &str = "update_statement";

    /// `abstract_schema_name [AS] identification_variable`
    pub const RANGE_VARIABLE_DECLARATION: &str = "range_variable_declaration";

    /// `state_field_path = new_value`
    pub const UPDATE_ITEM: &str = "update_item";

    /// `WHERE conditional_expression`
    pub const WHERE_CLAUSE: &str = "where_clause";

    /// `conditional_term [OR conditional_term]*`
    pub const CONDITIONAL_EXPRESSION: &str = "conditional_expression";

    /// `conditional_factor [AND conditional_factor]*`
    pub const CONDITIONAL_TERM: &str = "conditional_term";

    /// `[NOT] conditional_primary`
    pub const CONDITIONAL_FACTOR: &str = "conditional_factor";

    /// `comparison_expression | (conditional_expression)`
    pub const CONDITIONAL_PRIMARY: &str = "conditional_primary";

    /// `arithmetic_expression comparison_operator arithmetic_expression`
    pub const COMPARISON_EXPRESSION: &str = "comparison_expression";

    /// `arithmetic_term [{ + | - } arithmetic_term]*`
    pub const ARITHMETIC_EXPRESSION: &str = "arithmetic_expression";

    /// `arithmetic_factor [{ * | / } arithmetic_factor]*`
    pub const ARITHMETIC_TERM: &str = "arithmetic_term";

    /// `[{ + | - }] arithmetic_primary`
    pub const ARITHMETIC_FACTOR: &str = "arithmetic_factor";

    /// A path, literal, input parameter, or parenthesized expression.
    pub const ARITHMETIC_PRIMARY: &str = "arithmetic_primary";

    /// `identification_variable[.state_field]*`
    pub const STATE_FIELD_PATH: &str = "state_field_path";

    /// `:name` or `?position`
    pub const INPUT_PARAMETER: &str = "input_parameter";

    /// Any literal kind.
    pub const LITERAL: &str = "literal";

    /// A quoted string literal.
    pub const STRING_LITERAL: &str = "string_literal";

    /// A numeric literal.
    pub const NUMERIC_LITERAL: &str = "numeric_literal";

    /// `TRUE` or `FALSE`, case-insensitive.
    pub const BOOLEAN_LITERAL: &str = "boolean_literal";

    /// An enum constant path registered with the type catalog.
    pub const ENUM_LITERAL: &str = "enum_literal";

    /// An entity type name registered with the type catalog.
    pub const ENTITY_TYPE_LITERAL: &str = "entity_type_literal";

    /// An ISO-8601-like date, time, or timestamp literal.
    pub const DATETIME_LITERAL: &str = "datetime_literal";
}

/// One grammar production.
///
/// Immutable once registered; parses hold it through a shared [`Arc`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    id: String,
    children: Vec<String>,
    fallback: Option<String>,
}

impl GrammarRule {
    /// Creates a rule with no children and no fallback.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
            fallback: None,
        }
    }

    /// Sets the ordered child productions this rule can expand into.
    pub fn with_children<S: Into<String>>(mut self, children: impl IntoIterator<Item = S>) -> Self {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the rule tried when no child matches.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// The unique identifier of this rule.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The child rule identifiers, in declared order.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// The fallback rule identifier, if any.
    pub fn fallback_id(&self) -> Option<&str> {
        self.fallback.as_deref()
    }
}

/// Registry of grammar rules keyed by identifier.
///
/// Constructed once, injected into each parser instance, never mutated at
/// parse time.
///
/// # Example
///
/// ```rust
/// use jpql::{grammar::rules, GrammarRegistry};
///
/// let grammar = GrammarRegistry::jpql();
/// let literal = grammar.lookup(rules::LITERAL).unwrap();
/// assert_eq!(literal.children().len(), 6);
/// ```
#[derive(Debug, Default)]
pub struct GrammarRegistry {
    rules: HashMap<String, Arc<GrammarRule>>,
}

impl GrammarRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule under its identifier.
    ///
    /// Fails with [`GrammarError::DuplicateRule`] when the identifier is
    /// already taken.
    pub fn register(&mut self, rule: GrammarRule) -> GrammarResult<()> {
        if self.rules.contains_key(rule.id()) {
            return Err(GrammarError::DuplicateRule(rule.id().to_string()));
        }
        self.rules.insert(rule.id().to_string(), Arc::new(rule));
        Ok(())
    }

    /// Returns the rule registered under `id`.
    ///
    /// The same shared instance is returned on every call.
    pub fn lookup(&self, id: &str) -> GrammarResult<Arc<GrammarRule>> {
        self.rules
            .get(id)
            .cloned()
            .ok_or_else(|| GrammarError::UnknownRule(id.to_string()))
    }

    /// Follows the fallback chain from `id` to a rule with no fallback.
    ///
    /// Fails with [`GrammarError::CyclicFallback`] if the chain revisits a
    /// rule. A well-formed grammar never does.
    pub fn resolve_fallback(&self, id: &str) -> GrammarResult<Arc<GrammarRule>> {
        let mut visited = HashSet::new();
        let mut current = self.lookup(id)?;

        while let Some(fallback_id) = current.fallback_id() {
            if !visited.insert(current.id().to_string()) {
                return Err(GrammarError::CyclicFallback(id.to_string()));
            }
            if visited.contains(fallback_id) || fallback_id == id {
                return Err(GrammarError::CyclicFallback(id.to_string()));
            }
            current = self.lookup(fallback_id)?;
        }
        Ok(current)
    }

    /// Returns true if a rule is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Builds the standard JPQL grammar.
    pub fn jpql() -> Self {
        let mut registry = Self::new();
        let mut add = |rule: GrammarRule| {
            registry.register(rule).expect("fresh registry has no duplicates");
        };

        add(GrammarRule::new(rules::STATEMENT)
            .with_children([rules::DELETE_STATEMENT, rules::UPDATE_STATEMENT]));
        add(GrammarRule::new(rules::DELETE_STATEMENT)
            .with_children([rules::RANGE_VARIABLE_DECLARATION, rules::WHERE_CLAUSE]));
        add(GrammarRule::new(rules::UPDATE_STATEMENT).with_children([
            rules::RANGE_VARIABLE_DECLARATION,
            rules::UPDATE_ITEM,
            rules::WHERE_CLAUSE,
        ]));
        add(GrammarRule::new(rules::RANGE_VARIABLE_DECLARATION));
        add(GrammarRule::new(rules::UPDATE_ITEM)
            .with_children([rules::STATE_FIELD_PATH, rules::ARITHMETIC_EXPRESSION]));
        add(GrammarRule::new(rules::WHERE_CLAUSE)
            .with_children([rules::CONDITIONAL_EXPRESSION]));
        add(GrammarRule::new(rules::CONDITIONAL_EXPRESSION)
            .with_children([rules::CONDITIONAL_TERM]));
        add(GrammarRule::new(rules::CONDITIONAL_TERM)
            .with_children([rules::CONDITIONAL_FACTOR]));
        add(GrammarRule::new(rules::CONDITIONAL_FACTOR)
            .with_children([rules::CONDITIONAL_PRIMARY]));
        add(GrammarRule::new(rules::CONDITIONAL_PRIMARY)
            .with_children([rules::COMPARISON_EXPRESSION]));
        add(GrammarRule::new(rules::COMPARISON_EXPRESSION)
            .with_children([rules::ARITHMETIC_EXPRESSION]));
        add(GrammarRule::new(rules::ARITHMETIC_EXPRESSION)
            .with_children([rules::ARITHMETIC_TERM]));
        add(GrammarRule::new(rules::ARITHMETIC_TERM)
            .with_children([rules::ARITHMETIC_FACTOR]));
        add(GrammarRule::new(rules::ARITHMETIC_FACTOR)
            .with_children([rules::ARITHMETIC_PRIMARY])
            .with_fallback(rules::ARITHMETIC_PRIMARY));
        add(GrammarRule::new(rules::ARITHMETIC_PRIMARY).with_children([
            rules::LITERAL,
            rules::INPUT_PARAMETER,
            rules::STATE_FIELD_PATH,
        ]));
        add(GrammarRule::new(rules::LITERAL).with_children([
            rules::STRING_LITERAL,
            rules::NUMERIC_LITERAL,
            rules::ENUM_LITERAL,
            rules::BOOLEAN_LITERAL,
            rules::DATETIME_LITERAL,
            rules::ENTITY_TYPE_LITERAL,
        ]));
        add(GrammarRule::new(rules::STATE_FIELD_PATH));
        add(GrammarRule::new(rules::INPUT_PARAMETER));
        add(GrammarRule::new(rules::STRING_LITERAL));
        add(GrammarRule::new(rules::NUMERIC_LITERAL));
        add(GrammarRule::new(rules::BOOLEAN_LITERAL));
        add(GrammarRule::new(rules::ENUM_LITERAL));
        add(GrammarRule::new(rules::ENTITY_TYPE_LITERAL));
        add(GrammarRule::new(rules::DATETIME_LITERAL));

        registry
    }
}
