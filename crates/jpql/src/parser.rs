//! Registry-driven recursive-descent parser for JPQL query strings.
//!
//! The parser walks the token stream under the direction of a
//! [`GrammarRegistry`]: structural productions (statements, clauses,
//! operator ladders) have dedicated handlers, while choice productions try
//! their registered children in declared order. The first child that
//! consumes a non-empty prefix wins; a child that has consumed its first
//! token is committed, and its error is final; there is no backtracking
//! across siblings. When no child matches and the rule declares a fallback, the
//! resolved fallback is retried before the parse fails.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::ast::{ArithmeticOp, ComparisonOp, DateTimeLiteral, ExpressionNode, Literal, NumericLiteral};
use crate::error::{ParseError, ParseResult};
use crate::grammar::{rules, GrammarRegistry};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::types::TypeCatalog;

/// Words that cannot serve as identification variables, entity names, or
/// path segments.
const RESERVED: &[&str] = &[
    "select", "from", "where", "update", "delete", "set", "as", "and", "or", "not", "true",
    "false",
];

fn is_reserved(text: &str) -> bool {
    RESERVED.iter().any(|k| text.eq_ignore_ascii_case(k))
}

/// Parses `query_text` starting at the grammar rule `start_rule_id`.
///
/// All tokens must be consumed; trailing input is a parse error. The
/// grammar and type catalog are read-only and may be shared across
/// concurrent parses.
///
/// # Example
///
/// ```rust
/// use jpql::{grammar::rules, parse, GrammarRegistry, TypeCatalog};
///
/// let grammar = GrammarRegistry::jpql();
/// let types = TypeCatalog::new();
/// let literal = parse("42", rules::LITERAL, &grammar, &types).unwrap();
/// assert_eq!(literal.to_string(), "42");
/// ```
pub fn parse(
    query_text: &str,
    start_rule_id: &str,
    grammar: &GrammarRegistry,
    types: &TypeCatalog,
) -> ParseResult<ExpressionNode> {
    let start = grammar.lookup(start_rule_id)?;
    let tokens = tokenize(query_text)?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyQuery);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        grammar,
        types,
    };
    let node = parser.parse_rule(start.id())?;

    if let Some(trailing) = parser.tokens.get(parser.pos) {
        return Err(ParseError::Syntax {
            position: trailing.offset,
            rule: start_rule_id.to_string(),
            message: format!("unexpected trailing token `{}`", trailing.text),
        });
    }
    Ok(node)
}

/// Parses a complete JPQL modify statement (DELETE or UPDATE).
pub fn parse_query(
    query_text: &str,
    grammar: &GrammarRegistry,
    types: &TypeCatalog,
) -> ParseResult<ExpressionNode> {
    parse(query_text, rules::STATEMENT, grammar, types)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    grammar: &'a GrammarRegistry,
    types: &'a TypeCatalog,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    /// Byte offset for error reporting: the current token, or the last
    /// token when the input is exhausted.
    fn error_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.offset)
            .unwrap_or(0)
    }

    fn syntax_error(&self, rule: &str, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            position: self.error_offset(),
            rule: rule.to_string(),
            message: message.into(),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, rule: &str, keyword: &str) -> ParseResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.syntax_error(rule, format!("expected `{}`", keyword.to_ascii_uppercase())))
        }
    }

    fn expect_punct(&mut self, rule: &str, punct: &str) -> ParseResult<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.syntax_error(rule, format!("expected `{}`", punct)))
        }
    }

    fn expect_identifier(&mut self, rule: &str, what: &str) -> ParseResult<String> {
        let text = match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier && !is_reserved(&t.text) => t.text.clone(),
            _ => return Err(self.syntax_error(rule, format!("expected {}", what))),
        };
        self.pos += 1;
        Ok(text)
    }

    /// The registered child production of `id` at `index`.
    fn child_at(&self, id: &str, index: usize) -> ParseResult<String> {
        let rule = self.grammar.lookup(id)?;
        rule.children()
            .get(index)
            .cloned()
            .ok_or_else(|| self.syntax_error(id, "rule has no registered child production"))
    }

    fn parse_rule(&mut self, id: &str) -> ParseResult<ExpressionNode> {
        match id {
            rules::DELETE_STATEMENT => self.parse_delete_statement(),
            rules::UPDATE_STATEMENT => self.parse_update_statement(),
            rules::RANGE_VARIABLE_DECLARATION => self.parse_range_variable_declaration(),
            rules::UPDATE_ITEM => self.parse_update_item(),
            rules::WHERE_CLAUSE => self.parse_where_clause(),
            rules::CONDITIONAL_EXPRESSION => self.parse_conditional_expression(),
            rules::CONDITIONAL_TERM => self.parse_conditional_term(),
            rules::CONDITIONAL_FACTOR => self.parse_conditional_factor(),
            rules::CONDITIONAL_PRIMARY => self.parse_conditional_primary(),
            rules::COMPARISON_EXPRESSION => self.parse_comparison_expression(),
            rules::ARITHMETIC_EXPRESSION => self.parse_arithmetic_expression(),
            rules::ARITHMETIC_TERM => self.parse_arithmetic_term(),
            rules::ARITHMETIC_FACTOR => self.parse_arithmetic_factor(),
            rules::ARITHMETIC_PRIMARY => self.parse_arithmetic_primary(),
            rules::STATE_FIELD_PATH => self.parse_state_field_path(),
            rules::INPUT_PARAMETER => self.parse_input_parameter(),
            rules::STRING_LITERAL => self.parse_string_literal(),
            rules::NUMERIC_LITERAL => self.parse_numeric_literal(),
            rules::BOOLEAN_LITERAL => self.parse_boolean_literal(),
            rules::ENUM_LITERAL => self.parse_enum_literal(),
            rules::ENTITY_TYPE_LITERAL => self.parse_entity_type_literal(),
            rules::DATETIME_LITERAL => self.parse_datetime_literal(),
            _ => self.parse_choice(id),
        }
    }

    /// Tries each registered child of `id` in declared order, then the
    /// resolved fallback.
    fn parse_choice(&mut self, id: &str) -> ParseResult<ExpressionNode> {
        let rule = self.grammar.lookup(id)?;
        let start = self.pos;

        for child in rule.children() {
            match self.parse_rule(child) {
                Ok(node) => {
                    if self.pos > start {
                        return Ok(node);
                    }
                    self.pos = start;
                }
                Err(err @ ParseError::Grammar(_)) => return Err(err),
                Err(err) => {
                    if self.pos > start {
                        return Err(err);
                    }
                }
            }
        }

        if rule.fallback_id().is_some() {
            let fallback = self.grammar.resolve_fallback(id)?;
            if fallback.id() != id {
                return self.parse_rule(fallback.id());
            }
        }

        Err(self.syntax_error(id, "no production matched"))
    }

    // =========================================================================
    // Statements and clauses
    // =========================================================================

    fn parse_delete_statement(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::DELETE_STATEMENT;
        self.expect_keyword(RULE, "delete")?;
        self.expect_keyword(RULE, "from")?;

        let range_rule = self.child_at(RULE, 0)?;
        let range = self.parse_rule(&range_rule)?;

        let where_clause = if self.peek().is_some_and(|t| t.is_keyword("where")) {
            let where_rule = self.child_at(RULE, 1)?;
            Some(Box::new(self.parse_rule(&where_rule)?))
        } else {
            None
        };

        Ok(ExpressionNode::DeleteStatement {
            range: Box::new(range),
            where_clause,
        })
    }

    fn parse_update_statement(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::UPDATE_STATEMENT;
        self.expect_keyword(RULE, "update")?;

        let range_rule = self.child_at(RULE, 0)?;
        let range = self.parse_rule(&range_rule)?;

        self.expect_keyword(RULE, "set")?;
        let item_rule = self.child_at(RULE, 1)?;
        let mut set_items = vec![self.parse_rule(&item_rule)?];
        while self.eat_punct(",") {
            set_items.push(self.parse_rule(&item_rule)?);
        }

        let where_clause = if self.peek().is_some_and(|t| t.is_keyword("where")) {
            let where_rule = self.child_at(RULE, 2)?;
            Some(Box::new(self.parse_rule(&where_rule)?))
        } else {
            None
        };

        Ok(ExpressionNode::UpdateStatement {
            range: Box::new(range),
            set_items,
            where_clause,
        })
    }

    fn parse_range_variable_declaration(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::RANGE_VARIABLE_DECLARATION;
        let entity_name = self.expect_identifier(RULE, "an entity name")?;
        self.eat_keyword("as");
        let variable = self.expect_identifier(RULE, "an identification variable")?;
        Ok(ExpressionNode::RangeVariableDeclaration {
            entity_name,
            variable,
        })
    }

    fn parse_update_item(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::UPDATE_ITEM;
        let path_rule = self.child_at(RULE, 0)?;
        let path = self.parse_rule(&path_rule)?;
        self.expect_punct(RULE, "=")?;
        let value_rule = self.child_at(RULE, 1)?;
        let value = self.parse_rule(&value_rule)?;
        Ok(ExpressionNode::UpdateItem {
            path: Box::new(path),
            value: Box::new(value),
        })
    }

    fn parse_where_clause(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::WHERE_CLAUSE;
        self.expect_keyword(RULE, "where")?;
        let child = self.child_at(RULE, 0)?;
        let condition = self.parse_rule(&child)?;
        Ok(ExpressionNode::WhereClause(Box::new(condition)))
    }

    // =========================================================================
    // Conditional expressions
    // =========================================================================

    fn parse_conditional_expression(&mut self) -> ParseResult<ExpressionNode> {
        let term_rule = self.child_at(rules::CONDITIONAL_EXPRESSION, 0)?;
        let mut left = self.parse_rule(&term_rule)?;
        while self.eat_keyword("or") {
            let right = self.parse_rule(&term_rule)?;
            left = ExpressionNode::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_conditional_term(&mut self) -> ParseResult<ExpressionNode> {
        let factor_rule = self.child_at(rules::CONDITIONAL_TERM, 0)?;
        let mut left = self.parse_rule(&factor_rule)?;
        while self.eat_keyword("and") {
            let right = self.parse_rule(&factor_rule)?;
            left = ExpressionNode::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_conditional_factor(&mut self) -> ParseResult<ExpressionNode> {
        let primary_rule = self.child_at(rules::CONDITIONAL_FACTOR, 0)?;
        if self.eat_keyword("not") {
            let inner = self.parse_rule(&primary_rule)?;
            Ok(ExpressionNode::Not(Box::new(inner)))
        } else {
            self.parse_rule(&primary_rule)
        }
    }

    fn parse_conditional_primary(&mut self) -> ParseResult<ExpressionNode> {
        // A parenthesized conditional is tried first; on failure the
        // parenthesis is re-read as the start of an arithmetic operand.
        if self.peek().is_some_and(|t| t.is_punct("(")) {
            let checkpoint = self.pos;
            self.pos += 1;
            if let Ok(inner) = self.parse_rule(rules::CONDITIONAL_EXPRESSION) {
                if self.eat_punct(")") {
                    return Ok(ExpressionNode::Group {
                        inner: Box::new(inner),
                        negated: false,
                    });
                }
            }
            self.pos = checkpoint;
        }
        let child = self.child_at(rules::CONDITIONAL_PRIMARY, 0)?;
        self.parse_rule(&child)
    }

    fn parse_comparison_expression(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::COMPARISON_EXPRESSION;
        let operand_rule = self.child_at(RULE, 0)?;
        let left = self.parse_rule(&operand_rule)?;

        let op = match self.peek() {
            Some(t) if t.is_punct("=") => ComparisonOp::Equal,
            Some(t) if t.is_punct("<>") => ComparisonOp::NotEqual,
            Some(t) if t.is_punct("<=") => ComparisonOp::LessThanOrEqual,
            Some(t) if t.is_punct(">=") => ComparisonOp::GreaterThanOrEqual,
            Some(t) if t.is_punct("<") => ComparisonOp::LessThan,
            Some(t) if t.is_punct(">") => ComparisonOp::GreaterThan,
            _ => return Err(self.syntax_error(RULE, "expected a comparison operator")),
        };
        self.pos += 1;

        let right = self.parse_rule(&operand_rule)?;
        Ok(ExpressionNode::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    // =========================================================================
    // Arithmetic expressions
    // =========================================================================

    fn parse_arithmetic_expression(&mut self) -> ParseResult<ExpressionNode> {
        let term_rule = self.child_at(rules::ARITHMETIC_EXPRESSION, 0)?;
        let mut left = self.parse_rule(&term_rule)?;
        loop {
            let op = if self.eat_punct("+") {
                ArithmeticOp::Add
            } else if self.eat_punct("-") {
                ArithmeticOp::Subtract
            } else {
                break;
            };
            let right = self.parse_rule(&term_rule)?;
            left = ExpressionNode::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_arithmetic_term(&mut self) -> ParseResult<ExpressionNode> {
        let factor_rule = self.child_at(rules::ARITHMETIC_TERM, 0)?;
        let mut left = self.parse_rule(&factor_rule)?;
        loop {
            let op = if self.eat_punct("*") {
                ArithmeticOp::Multiply
            } else if self.eat_punct("/") {
                ArithmeticOp::Divide
            } else {
                break;
            };
            let right = self.parse_rule(&factor_rule)?;
            left = ExpressionNode::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_arithmetic_factor(&mut self) -> ParseResult<ExpressionNode> {
        let negated = if self.eat_punct("-") {
            true
        } else {
            self.eat_punct("+");
            false
        };

        let primary = self.parse_choice(rules::ARITHMETIC_FACTOR)?;
        if negated {
            self.negate_primary(primary)
        } else {
            Ok(primary)
        }
    }

    /// Folds a unary minus into the primary it precedes; the sign never
    /// becomes a tree level of its own.
    fn negate_primary(&self, node: ExpressionNode) -> ParseResult<ExpressionNode> {
        match node {
            ExpressionNode::Literal(Literal::Numeric(n)) => {
                Ok(ExpressionNode::Literal(Literal::Numeric(NumericLiteral {
                    text: format!("-{}", n.text),
                    kind: n.kind,
                })))
            }
            ExpressionNode::Path { segments, .. } => Ok(ExpressionNode::Path {
                segments,
                negated: true,
            }),
            ExpressionNode::InputParameter { name, .. } => Ok(ExpressionNode::InputParameter {
                name,
                negated: true,
            }),
            ExpressionNode::Group { inner, .. } => Ok(ExpressionNode::Group {
                inner,
                negated: true,
            }),
            other => Err(self.syntax_error(
                rules::ARITHMETIC_FACTOR,
                format!("cannot negate a {} expression", other.kind_name()),
            )),
        }
    }

    fn parse_arithmetic_primary(&mut self) -> ParseResult<ExpressionNode> {
        if self.eat_punct("(") {
            let inner = self.parse_rule(rules::ARITHMETIC_EXPRESSION)?;
            self.expect_punct(rules::ARITHMETIC_PRIMARY, ")")?;
            return Ok(ExpressionNode::Group {
                inner: Box::new(inner),
                negated: false,
            });
        }
        self.parse_choice(rules::ARITHMETIC_PRIMARY)
    }

    fn parse_state_field_path(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::STATE_FIELD_PATH;
        let first = match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier && !is_reserved(&t.text) => t.text.clone(),
            _ => return Err(self.syntax_error(RULE, "expected an identification variable")),
        };
        self.pos += 1;

        let mut segments = vec![first];
        loop {
            let next = match (self.peek(), self.peek_at(1)) {
                (Some(dot), Some(field))
                    if dot.is_punct(".")
                        && field.kind == TokenKind::Identifier
                        && !is_reserved(&field.text) =>
                {
                    field.text.clone()
                }
                _ => break,
            };
            self.pos += 2;
            segments.push(next);
        }

        Ok(ExpressionNode::Path {
            segments,
            negated: false,
        })
    }

    fn parse_input_parameter(&mut self) -> ParseResult<ExpressionNode> {
        let name = match self.peek() {
            Some(t) if t.kind == TokenKind::Parameter => t.text.clone(),
            _ => {
                return Err(
                    self.syntax_error(rules::INPUT_PARAMETER, "expected an input parameter")
                )
            }
        };
        self.pos += 1;
        Ok(ExpressionNode::InputParameter {
            name,
            negated: false,
        })
    }

    // =========================================================================
    // Literals
    // =========================================================================

    fn parse_string_literal(&mut self) -> ParseResult<ExpressionNode> {
        let value = match self.peek() {
            Some(t) if t.kind == TokenKind::String => t.string_value(),
            _ => return Err(self.syntax_error(rules::STRING_LITERAL, "expected a string literal")),
        };
        self.pos += 1;
        Ok(ExpressionNode::Literal(Literal::String(value)))
    }

    fn parse_numeric_literal(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::NUMERIC_LITERAL;
        let text = match self.peek() {
            Some(t) if t.kind == TokenKind::Number => t.text.clone(),
            _ => return Err(self.syntax_error(RULE, "expected a numeric literal")),
        };
        match NumericLiteral::classify(&text) {
            Some(numeric) => {
                self.pos += 1;
                Ok(ExpressionNode::Literal(Literal::Numeric(numeric)))
            }
            None => Err(self.syntax_error(RULE, format!("malformed numeric literal `{}`", text))),
        }
    }

    fn parse_boolean_literal(&mut self) -> ParseResult<ExpressionNode> {
        let value = match self.peek() {
            Some(t) if t.is_keyword("true") => true,
            Some(t) if t.is_keyword("false") => false,
            _ => return Err(self.syntax_error(rules::BOOLEAN_LITERAL, "expected TRUE or FALSE")),
        };
        self.pos += 1;
        Ok(ExpressionNode::Literal(Literal::Boolean(value)))
    }

    fn parse_enum_literal(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::ENUM_LITERAL;

        // Read the whole dotted path ahead before consuming anything, so a
        // path that is not a registered enum falls through to the next
        // literal kind without committing.
        let mut segments: Vec<String> = Vec::new();
        let mut consumed = 0;
        loop {
            match self.peek_at(consumed) {
                Some(t) if t.kind == TokenKind::Identifier && !is_reserved(&t.text) => {
                    segments.push(t.text.clone());
                }
                _ => break,
            }
            consumed += 1;
            match (self.peek_at(consumed), self.peek_at(consumed + 1)) {
                (Some(dot), Some(next))
                    if dot.is_punct(".")
                        && next.kind == TokenKind::Identifier
                        && !is_reserved(&next.text) =>
                {
                    consumed += 1;
                }
                _ => break,
            }
        }

        if segments.len() < 2 {
            return Err(self.syntax_error(RULE, "expected a qualified enum constant"));
        }
        let type_name = segments[..segments.len() - 1].join(".");
        if !self.types.is_enum_type(&type_name) {
            return Err(self.syntax_error(
                RULE,
                format!("`{}` is not a registered enum type", type_name),
            ));
        }

        self.pos += consumed;
        Ok(ExpressionNode::Literal(Literal::Enum {
            path: segments.join("."),
        }))
    }

    fn parse_entity_type_literal(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::ENTITY_TYPE_LITERAL;
        let name = match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier => t.text.clone(),
            _ => return Err(self.syntax_error(RULE, "expected an entity type name")),
        };
        if !self.types.is_entity(&name) {
            return Err(
                self.syntax_error(RULE, format!("`{}` is not a registered entity type", name))
            );
        }
        // An entity type literal stands alone; a dotted continuation is a path.
        if self.peek_at(1).is_some_and(|t| t.is_punct(".")) {
            return Err(self.syntax_error(RULE, "an entity type cannot start a path"));
        }
        self.pos += 1;
        Ok(ExpressionNode::Literal(Literal::EntityType { name }))
    }

    fn parse_datetime_literal(&mut self) -> ParseResult<ExpressionNode> {
        const RULE: &str = rules::DATETIME_LITERAL;
        let text = match self.peek() {
            Some(t) if t.kind == TokenKind::DateTime => t.text.clone(),
            _ => return Err(self.syntax_error(RULE, "expected a date/time literal")),
        };

        // Most specific shape first: timestamp, then date, then time.
        let literal = if text.contains('T') {
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(DateTimeLiteral::Timestamp)
        } else if text.contains('-') {
            NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .ok()
                .map(DateTimeLiteral::Date)
        } else {
            NaiveTime::parse_from_str(&text, "%H:%M:%S%.f")
                .ok()
                .map(DateTimeLiteral::Time)
        };

        match literal {
            Some(dt) => {
                self.pos += 1;
                Ok(ExpressionNode::Literal(Literal::DateTime(dt)))
            }
            None => Err(self.syntax_error(RULE, format!("invalid date/time literal `{}`", text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NumericKind;
    use crate::grammar::GrammarRule;

    fn setup() -> (GrammarRegistry, TypeCatalog) {
        let grammar = GrammarRegistry::jpql();
        let mut types = TypeCatalog::new();
        types.register_entity("Employee");
        types.register_entity("Project");
        types.register_enum_type("com.acme.Status");
        (grammar, types)
    }

    fn parse_literal(text: &str) -> ParseResult<ExpressionNode> {
        let (grammar, types) = setup();
        parse(text, rules::LITERAL, &grammar, &types)
    }

    fn literal_kind(text: &str) -> &'static str {
        match parse_literal(text).unwrap() {
            ExpressionNode::Literal(lit) => lit.kind_name(),
            other => panic!("not a literal: {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete_statement() {
        let (grammar, types) = setup();
        let tree = parse_query("DELETE FROM Employee e", &grammar, &types).unwrap();
        match tree {
            ExpressionNode::DeleteStatement {
                range,
                where_clause,
            } => {
                assert_eq!(
                    *range,
                    ExpressionNode::RangeVariableDeclaration {
                        entity_name: "Employee".to_string(),
                        variable: "e".to_string(),
                    }
                );
                assert!(where_clause.is_none());
            }
            other => panic!("expected delete statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete_with_where() {
        let (grammar, types) = setup();
        let tree = parse_query(
            "DELETE FROM Employee e WHERE e.salary > 100000",
            &grammar,
            &types,
        )
        .unwrap();
        assert_eq!(
            tree.to_string(),
            "DELETE FROM Employee e WHERE e.salary > 100000"
        );
    }

    #[test]
    fn test_parse_update_statement() {
        let (grammar, types) = setup();
        let tree = parse_query(
            "UPDATE Employee AS e SET e.salary = e.salary + 1000, e.active = TRUE WHERE e.id = :id",
            &grammar,
            &types,
        )
        .unwrap();
        match &tree {
            ExpressionNode::UpdateStatement {
                set_items,
                where_clause,
                ..
            } => {
                assert_eq!(set_items.len(), 2);
                assert!(where_clause.is_some());
            }
            other => panic!("expected update statement, got {:?}", other),
        }
        assert_eq!(
            tree.to_string(),
            "UPDATE Employee e SET e.salary = e.salary + 1000, e.active = TRUE WHERE e.id = :id"
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let (grammar, types) = setup();
        assert!(parse_query("delete from Employee e", &grammar, &types).is_ok());
        assert!(parse_query("Delete From Employee e Where e.id = 1", &grammar, &types).is_ok());
    }

    #[test]
    fn test_literal_classification_by_shape() {
        assert_eq!(literal_kind("'abc'"), "string");
        assert_eq!(literal_kind("42"), "numeric");
        assert_eq!(literal_kind("TRUE"), "boolean");
        assert_eq!(literal_kind("false"), "boolean");
        assert_eq!(literal_kind("com.acme.Status.ACTIVE"), "enum");
        assert_eq!(literal_kind("Employee"), "entity_type");
        assert_eq!(literal_kind("2020-01-31"), "datetime");
        assert_eq!(literal_kind("12:45:00"), "datetime");
        assert_eq!(literal_kind("2020-01-31T12:45:00"), "datetime");
    }

    #[test]
    fn test_numeric_literal_kinds() {
        for (text, kind) in [
            ("42", NumericKind::Integer),
            ("42L", NumericKind::Long),
            ("1.5", NumericKind::Double),
            ("1.5F", NumericKind::Float),
            ("2e3", NumericKind::Double),
        ] {
            match parse_literal(text).unwrap() {
                ExpressionNode::Literal(Literal::Numeric(n)) => assert_eq!(n.kind, kind),
                other => panic!("expected numeric for {}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_literal_display_reclassifies_identically() {
        // Re-serializing a literal yields a token that classifies to the
        // same kind.
        for text in ["'Pascal''s'", "42", "1.5e3", "10L", "TRUE", "FALSE"] {
            let node = parse_literal(text).unwrap();
            let first_kind = match &node {
                ExpressionNode::Literal(lit) => lit.kind_name(),
                other => panic!("not a literal: {:?}", other),
            };
            let reparsed = parse_literal(&node.to_string()).unwrap();
            match reparsed {
                ExpressionNode::Literal(lit) => assert_eq!(lit.kind_name(), first_kind),
                other => panic!("not a literal: {:?}", other),
            }
        }
    }

    #[test]
    fn test_unqualified_path_is_not_an_enum() {
        let (grammar, types) = setup();
        let tree = parse_query(
            "DELETE FROM Employee e WHERE e.status = com.acme.Status.ACTIVE",
            &grammar,
            &types,
        )
        .unwrap();
        let shown = tree.to_string();
        assert!(shown.contains("e.status = com.acme.Status.ACTIVE"));

        // The left side stays a path even though it is dotted.
        match &tree {
            ExpressionNode::DeleteStatement {
                where_clause: Some(w),
                ..
            } => match w.as_ref() {
                ExpressionNode::WhereClause(cond) => match cond.as_ref() {
                    ExpressionNode::Comparison { left, right, .. } => {
                        assert!(matches!(left.as_ref(), ExpressionNode::Path { .. }));
                        assert!(matches!(
                            right.as_ref(),
                            ExpressionNode::Literal(Literal::Enum { .. })
                        ));
                    }
                    other => panic!("expected comparison, got {:?}", other),
                },
                other => panic!("expected where clause, got {:?}", other),
            },
            other => panic!("expected delete statement, got {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic_sign_folds_into_primary() {
        let (grammar, types) = setup();

        let negative = parse("-5", rules::ARITHMETIC_FACTOR, &grammar, &types).unwrap();
        match negative {
            ExpressionNode::Literal(Literal::Numeric(n)) => {
                assert_eq!(n.text, "-5");
                assert_eq!(n.kind, NumericKind::Integer);
                // The folded text still classifies to the same kind.
                assert_eq!(NumericLiteral::classify(&n.text).unwrap().kind, n.kind);
            }
            other => panic!("expected folded numeric, got {:?}", other),
        }

        let plus = parse("+5", rules::ARITHMETIC_FACTOR, &grammar, &types).unwrap();
        match plus {
            ExpressionNode::Literal(Literal::Numeric(n)) => assert_eq!(n.text, "5"),
            other => panic!("expected numeric, got {:?}", other),
        }

        let path = parse("- e.balance", rules::ARITHMETIC_FACTOR, &grammar, &types).unwrap();
        assert_eq!(
            path,
            ExpressionNode::Path {
                segments: vec!["e".to_string(), "balance".to_string()],
                negated: true,
            }
        );
    }

    #[test]
    fn test_arithmetic_precedence() {
        let (grammar, types) = setup();
        let tree = parse(
            "e.a + 2 * 3",
            rules::ARITHMETIC_EXPRESSION,
            &grammar,
            &types,
        )
        .unwrap();
        match tree {
            ExpressionNode::Arithmetic {
                op: ArithmeticOp::Add,
                right,
                ..
            } => {
                assert!(matches!(
                    right.as_ref(),
                    ExpressionNode::Arithmetic {
                        op: ArithmeticOp::Multiply,
                        ..
                    }
                ));
            }
            other => panic!("expected addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_arithmetic() {
        let (grammar, types) = setup();
        let tree = parse(
            "(e.a + 1) * 2",
            rules::ARITHMETIC_EXPRESSION,
            &grammar,
            &types,
        )
        .unwrap();
        match tree {
            ExpressionNode::Arithmetic {
                op: ArithmeticOp::Multiply,
                left,
                ..
            } => assert!(matches!(left.as_ref(), ExpressionNode::Group { .. })),
            other => panic!("expected multiplication at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_conditional_precedence() {
        let (grammar, types) = setup();
        let tree = parse(
            "NOT e.a = 1 OR e.b = 2 AND e.c = 3",
            rules::CONDITIONAL_EXPRESSION,
            &grammar,
            &types,
        )
        .unwrap();
        match tree {
            ExpressionNode::Or(left, right) => {
                assert!(matches!(left.as_ref(), ExpressionNode::Not(_)));
                assert!(matches!(right.as_ref(), ExpressionNode::And(_, _)));
            }
            other => panic!("expected OR at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_conditional() {
        let (grammar, types) = setup();
        let tree = parse(
            "(e.a = 1 OR e.b = 2) AND e.c = 3",
            rules::CONDITIONAL_EXPRESSION,
            &grammar,
            &types,
        )
        .unwrap();
        match tree {
            ExpressionNode::And(left, _) => {
                assert!(matches!(left.as_ref(), ExpressionNode::Group { .. }));
            }
            other => panic!("expected AND at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_query_names_rule_and_position() {
        let (grammar, types) = setup();
        for text in [
            "DELETE FRM Employee e",
            "DELETE FROM Employee e WHERE",
            "UPDATE Employee e SET",
            "DELETE FROM Employee e WHERE e.salary >",
            "DELETE FROM Employee e WHERE e.salary 100",
        ] {
            let err = parse_query(text, &grammar, &types).unwrap_err();
            match err {
                ParseError::Syntax { position, rule, .. } => {
                    assert!(grammar.contains(&rule), "unknown rule `{}` for {:?}", rule, text);
                    assert!(position < text.len(), "position out of bounds for {:?}", text);
                }
                other => panic!("expected syntax error for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_trailing_tokens_are_an_error() {
        let (grammar, types) = setup();
        let err = parse_query("DELETE FROM Employee e extra", &grammar, &types).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_empty_query() {
        let (grammar, types) = setup();
        assert_eq!(
            parse_query("", &grammar, &types).unwrap_err(),
            ParseError::EmptyQuery
        );
        assert_eq!(
            parse_query("   ", &grammar, &types).unwrap_err(),
            ParseError::EmptyQuery
        );
    }

    #[test]
    fn test_unknown_start_rule() {
        let (grammar, types) = setup();
        let err = parse("42", "no_such_rule", &grammar, &types).unwrap_err();
        assert!(matches!(err, ParseError::Grammar(_)));
    }

    #[test]
    fn test_choice_falls_back_when_no_child_matches() {
        let mut grammar = GrammarRegistry::new();
        grammar
            .register(GrammarRule::new(rules::STRING_LITERAL))
            .unwrap();
        grammar
            .register(GrammarRule::new(rules::NUMERIC_LITERAL))
            .unwrap();
        grammar
            .register(
                GrammarRule::new("string_or_fallback")
                    .with_children([rules::STRING_LITERAL])
                    .with_fallback(rules::NUMERIC_LITERAL),
            )
            .unwrap();
        let types = TypeCatalog::new();

        let node = parse("42", "string_or_fallback", &grammar, &types).unwrap();
        assert!(matches!(
            node,
            ExpressionNode::Literal(Literal::Numeric(_))
        ));
    }

    #[test]
    fn test_invalid_calendar_date_is_rejected() {
        let err = parse_literal("2020-13-45").unwrap_err();
        match err {
            ParseError::Syntax { position, .. } => assert_eq!(position, 0),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_input_parameters() {
        let (grammar, types) = setup();
        let tree = parse_query(
            "DELETE FROM Employee e WHERE e.id = ?1",
            &grammar,
            &types,
        )
        .unwrap();
        assert!(tree.to_string().ends_with("e.id = ?1"));
    }
}
