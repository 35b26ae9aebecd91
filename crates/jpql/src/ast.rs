//! Abstract syntax tree types for parsed JPQL queries.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// =============================================================================
// Operators
// =============================================================================

/// Comparison operators usable in a conditional expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparisonOp {
    /// Exact match: `=`
    Equal,
    /// Not equal: `<>`
    NotEqual,
    /// Less than: `<`
    LessThan,
    /// Less than or equal: `<=`
    LessThanOrEqual,
    /// Greater than: `>`
    GreaterThan,
    /// Greater than or equal: `>=`
    GreaterThanOrEqual,
}

impl std::fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonOp::Equal => write!(f, "="),
            ComparisonOp::NotEqual => write!(f, "<>"),
            ComparisonOp::LessThan => write!(f, "<"),
            ComparisonOp::LessThanOrEqual => write!(f, "<="),
            ComparisonOp::GreaterThan => write!(f, ">"),
            ComparisonOp::GreaterThanOrEqual => write!(f, ">="),
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArithmeticOp {
    /// Addition: `+`
    Add,
    /// Subtraction: `-`
    Subtract,
    /// Multiplication: `*`
    Multiply,
    /// Division: `/`
    Divide,
}

impl std::fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArithmeticOp::Add => write!(f, "+"),
            ArithmeticOp::Subtract => write!(f, "-"),
            ArithmeticOp::Multiply => write!(f, "*"),
            ArithmeticOp::Divide => write!(f, "/"),
        }
    }
}

// =============================================================================
// Literals
// =============================================================================

/// The numeric flavor of a numeric literal, derived from its lexical shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumericKind {
    /// Plain integer: `42`
    Integer,
    /// Integer with an `L` suffix: `42L`
    Long,
    /// Floating point with an `F` suffix: `4.2F`
    Float,
    /// Floating point (decimal point, exponent, or `D` suffix): `4.2`, `1e3`, `4.2D`
    Double,
}

/// A numeric literal, kept as source text so it round-trips exactly.
///
/// A unary sign folded in from an enclosing arithmetic factor becomes part
/// of the text, e.g. `-5` rather than a separate negation node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumericLiteral {
    /// The literal exactly as written (sign and suffix included).
    pub text: String,
    /// The numeric flavor implied by the shape.
    pub kind: NumericKind,
}

impl NumericLiteral {
    /// Classifies a token as a numeric literal, returning `None` when the
    /// text is not a valid numeric shape.
    ///
    /// The accepted shape is: optional sign, digits, optional decimal
    /// point and fraction, optional exponent, optional `L`/`F`/`D` suffix
    /// (case-insensitive). An `L` suffix requires an integral mantissa.
    pub fn classify(text: &str) -> Option<NumericLiteral> {
        let (body, suffix) = match text.chars().last() {
            Some(c @ ('l' | 'L' | 'f' | 'F' | 'd' | 'D')) => {
                (&text[..text.len() - 1], Some(c.to_ascii_uppercase()))
            }
            _ => (text, None),
        };

        let unsigned = body.strip_prefix(['+', '-']).unwrap_or(body);
        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((m, e)) => (m, Some(e)),
            None => (unsigned, None),
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (mantissa, None),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if let Some(frac) = frac_part {
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
        }
        if let Some(exp) = exponent {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
        }

        let fractional = frac_part.is_some() || exponent.is_some();
        let kind = match suffix {
            Some('L') if !fractional => NumericKind::Long,
            Some('L') => return None,
            Some('F') => NumericKind::Float,
            Some('D') => NumericKind::Double,
            None if fractional => NumericKind::Double,
            None => NumericKind::Integer,
            Some(_) => unreachable!("suffix is restricted to L/F/D by classify"),
        };

        Some(NumericLiteral {
            text: text.to_string(),
            kind,
        })
    }

    /// The literal text with any type suffix removed.
    fn unsuffixed(&self) -> &str {
        match self.kind {
            NumericKind::Integer => &self.text,
            _ => self
                .text
                .strip_suffix(['l', 'L', 'f', 'F', 'd', 'D'])
                .unwrap_or(&self.text),
        }
    }

    /// Returns the integral value, when the literal is integral.
    pub fn as_i64(&self) -> Option<i64> {
        self.unsuffixed().parse().ok()
    }

    /// Returns the value as a double.
    pub fn as_f64(&self) -> Option<f64> {
        self.unsuffixed().parse().ok()
    }
}

impl std::fmt::Display for NumericLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A date, time, or timestamp literal in ISO-8601-like form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DateTimeLiteral {
    /// Calendar date: `2020-01-31`
    Date(NaiveDate),
    /// Time of day: `12:45:00`
    Time(NaiveTime),
    /// Date and time: `2020-01-31T12:45:00`
    Timestamp(NaiveDateTime),
}

impl std::fmt::Display for DateTimeLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateTimeLiteral::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateTimeLiteral::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            DateTimeLiteral::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// A literal value, classified by lexical shape.
///
/// Classification follows the JPQL literal listing: quoted text is a
/// string; a numeric shape is numeric; `TRUE`/`FALSE` (case-insensitive)
/// are booleans; a dotted path whose prefix names a registered enum type
/// is an enum literal; an identifier naming a registered entity type is an
/// entity-type literal; an ISO-8601-like token is a date/time literal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    /// Quoted string: `'Pascal''s'`
    String(String),
    /// Numeric literal: `42`, `-1.5e3`, `10L`
    Numeric(NumericLiteral),
    /// Boolean literal: `TRUE` or `FALSE`
    Boolean(bool),
    /// Enum constant reference: `com.acme.Status.ACTIVE`
    Enum {
        /// Fully qualified enum constant path.
        path: String,
    },
    /// Entity type reference: `Employee`
    EntityType {
        /// The entity type name.
        name: String,
    },
    /// Date, time, or timestamp literal.
    DateTime(DateTimeLiteral),
}

impl Literal {
    /// A short name for the literal kind, for diagnostics and tests.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Numeric(_) => "numeric",
            Literal::Boolean(_) => "boolean",
            Literal::Enum { .. } => "enum",
            Literal::EntityType { .. } => "entity_type",
            Literal::DateTime(_) => "datetime",
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Numeric(n) => write!(f, "{}", n),
            Literal::Boolean(true) => write!(f, "TRUE"),
            Literal::Boolean(false) => write!(f, "FALSE"),
            Literal::Enum { path } => write!(f, "{}", path),
            Literal::EntityType { name } => write!(f, "{}", name),
            Literal::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

// =============================================================================
// Expression tree
// =============================================================================

/// A node in a parsed JPQL expression tree.
///
/// Each node owns its children; the tree is produced by one parse and
/// dropped together with the query built from it.
///
/// # Examples
///
/// ```rust
/// use jpql::{parse_query, ExpressionNode, GrammarRegistry, TypeCatalog};
///
/// let grammar = GrammarRegistry::jpql();
/// let types = TypeCatalog::new();
/// let tree = parse_query("DELETE FROM Employee e WHERE e.salary > 100000", &grammar, &types).unwrap();
/// assert!(matches!(tree, ExpressionNode::DeleteStatement { .. }));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExpressionNode {
    /// `DELETE FROM range [WHERE ...]`
    DeleteStatement {
        /// The range variable declaration.
        range: Box<ExpressionNode>,
        /// Optional where clause.
        where_clause: Option<Box<ExpressionNode>>,
    },

    /// `UPDATE range SET item, ... [WHERE ...]`
    UpdateStatement {
        /// The range variable declaration.
        range: Box<ExpressionNode>,
        /// The SET items, in declared order.
        set_items: Vec<ExpressionNode>,
        /// Optional where clause.
        where_clause: Option<Box<ExpressionNode>>,
    },

    /// `Employee e` or `Employee AS e`
    RangeVariableDeclaration {
        /// The abstract schema (entity) name.
        entity_name: String,
        /// The identification variable bound to it.
        variable: String,
    },

    /// One `path = value` item of an UPDATE's SET clause.
    UpdateItem {
        /// The state field being assigned.
        path: Box<ExpressionNode>,
        /// The new value expression.
        value: Box<ExpressionNode>,
    },

    /// `WHERE condition`
    WhereClause(Box<ExpressionNode>),

    /// `left OR right`
    Or(Box<ExpressionNode>, Box<ExpressionNode>),

    /// `left AND right`
    And(Box<ExpressionNode>, Box<ExpressionNode>),

    /// `NOT condition`
    Not(Box<ExpressionNode>),

    /// `left op right` with a comparison operator.
    Comparison {
        /// The comparison operator.
        op: ComparisonOp,
        /// Left operand.
        left: Box<ExpressionNode>,
        /// Right operand.
        right: Box<ExpressionNode>,
    },

    /// `left op right` with an arithmetic operator.
    Arithmetic {
        /// The arithmetic operator.
        op: ArithmeticOp,
        /// Left operand.
        left: Box<ExpressionNode>,
        /// Right operand.
        right: Box<ExpressionNode>,
    },

    /// A state field path or identification variable: `e.salary`, `e`.
    ///
    /// `negated` records a unary `-` folded in from an arithmetic factor.
    Path {
        /// The dot-separated segments.
        segments: Vec<String>,
        /// Whether a unary minus applies to this primary.
        negated: bool,
    },

    /// A named or positional input parameter: `:id`, `?1`.
    InputParameter {
        /// The parameter token as written, prefix included.
        name: String,
        /// Whether a unary minus applies to this primary.
        negated: bool,
    },

    /// A parenthesized sub-expression.
    Group {
        /// The inner expression.
        inner: Box<ExpressionNode>,
        /// Whether a unary minus applies to this primary.
        negated: bool,
    },

    /// A literal value.
    Literal(Literal),
}

impl ExpressionNode {
    /// Creates a path node from segments.
    pub fn path<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        ExpressionNode::Path {
            segments: segments.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// Creates a string literal node.
    pub fn string(value: impl Into<String>) -> Self {
        ExpressionNode::Literal(Literal::String(value.into()))
    }

    /// Creates an integer literal node.
    pub fn integer(value: i64) -> Self {
        ExpressionNode::Literal(Literal::Numeric(NumericLiteral {
            text: value.to_string(),
            kind: NumericKind::Integer,
        }))
    }

    /// Creates a boolean literal node.
    pub fn boolean(value: bool) -> Self {
        ExpressionNode::Literal(Literal::Boolean(value))
    }

    /// Creates a comparison node.
    pub fn comparison(op: ComparisonOp, left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates an AND node.
    pub fn and(left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR node.
    pub fn or(left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::Or(Box::new(left), Box::new(right))
    }

    /// A short name for the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExpressionNode::DeleteStatement { .. } => "delete_statement",
            ExpressionNode::UpdateStatement { .. } => "update_statement",
            ExpressionNode::RangeVariableDeclaration { .. } => "range_variable_declaration",
            ExpressionNode::UpdateItem { .. } => "update_item",
            ExpressionNode::WhereClause(_) => "where_clause",
            ExpressionNode::Or(_, _) => "or",
            ExpressionNode::And(_, _) => "and",
            ExpressionNode::Not(_) => "not",
            ExpressionNode::Comparison { .. } => "comparison",
            ExpressionNode::Arithmetic { .. } => "arithmetic",
            ExpressionNode::Path { .. } => "path",
            ExpressionNode::InputParameter { .. } => "input_parameter",
            ExpressionNode::Group { .. } => "group",
            ExpressionNode::Literal(_) => "literal",
        }
    }

    /// Returns this node's children in declared order.
    ///
    /// Traversals over the tree visit children in exactly this order.
    pub fn children(&self) -> Vec<&ExpressionNode> {
        match self {
            ExpressionNode::DeleteStatement {
                range,
                where_clause,
            } => {
                let mut children = vec![range.as_ref()];
                children.extend(where_clause.iter().map(|w| w.as_ref()));
                children
            }
            ExpressionNode::UpdateStatement {
                range,
                set_items,
                where_clause,
            } => {
                let mut children = vec![range.as_ref()];
                children.extend(set_items.iter());
                children.extend(where_clause.iter().map(|w| w.as_ref()));
                children
            }
            ExpressionNode::UpdateItem { path, value } => vec![path.as_ref(), value.as_ref()],
            ExpressionNode::WhereClause(inner)
            | ExpressionNode::Not(inner)
            | ExpressionNode::Group { inner, .. } => vec![inner.as_ref()],
            ExpressionNode::Or(left, right) | ExpressionNode::And(left, right) => {
                vec![left.as_ref(), right.as_ref()]
            }
            ExpressionNode::Comparison { left, right, .. }
            | ExpressionNode::Arithmetic { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
            ExpressionNode::RangeVariableDeclaration { .. }
            | ExpressionNode::Path { .. }
            | ExpressionNode::InputParameter { .. }
            | ExpressionNode::Literal(_) => Vec::new(),
        }
    }
}

impl std::fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionNode::DeleteStatement {
                range,
                where_clause,
            } => {
                write!(f, "DELETE FROM {}", range)?;
                if let Some(w) = where_clause {
                    write!(f, " {}", w)?;
                }
                Ok(())
            }
            ExpressionNode::UpdateStatement {
                range,
                set_items,
                where_clause,
            } => {
                write!(f, "UPDATE {} SET ", range)?;
                for (i, item) in set_items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if let Some(w) = where_clause {
                    write!(f, " {}", w)?;
                }
                Ok(())
            }
            ExpressionNode::RangeVariableDeclaration {
                entity_name,
                variable,
            } => write!(f, "{} {}", entity_name, variable),
            ExpressionNode::UpdateItem { path, value } => write!(f, "{} = {}", path, value),
            ExpressionNode::WhereClause(inner) => write!(f, "WHERE {}", inner),
            ExpressionNode::Or(left, right) => write!(f, "{} OR {}", left, right),
            ExpressionNode::And(left, right) => write!(f, "{} AND {}", left, right),
            ExpressionNode::Not(inner) => write!(f, "NOT {}", inner),
            ExpressionNode::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left, op, right)
            }
            ExpressionNode::Arithmetic { op, left, right } => {
                write!(f, "{} {} {}", left, op, right)
            }
            ExpressionNode::Path { segments, negated } => {
                if *negated {
                    write!(f, "-")?;
                }
                write!(f, "{}", segments.join("."))
            }
            ExpressionNode::InputParameter { name, negated } => {
                if *negated {
                    write!(f, "-")?;
                }
                write!(f, "{}", name)
            }
            ExpressionNode::Group { inner, negated } => {
                if *negated {
                    write!(f, "-")?;
                }
                write!(f, "({})", inner)
            }
            ExpressionNode::Literal(literal) => write!(f, "{}", literal),
        }
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_expression_round_trips_through_json() {
        let node = ExpressionNode::comparison(
            ComparisonOp::GreaterThan,
            ExpressionNode::path(["e", "salary"]),
            ExpressionNode::integer(100_000),
        );
        let json = serde_json::to_string(&node).unwrap();
        let back: ExpressionNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
