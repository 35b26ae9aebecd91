//! Runtime filter expressions built from parsed where clauses.
//!
//! These are the executable counterparts of the parser's syntax tree: a
//! query's selection criteria is an [`Expression`] rooted at the
//! [`ExpressionBuilder`] of its range variable.

use jpql::{ArithmeticOp, ComparisonOp, DateTimeLiteral};

/// The root of an expression tree: the range variable of a query class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionBuilder {
    query_class: String,
}

impl ExpressionBuilder {
    /// Creates a builder for the given query class.
    pub fn new(query_class: impl Into<String>) -> Self {
        Self {
            query_class: query_class.into(),
        }
    }

    /// The fully qualified class this builder ranges over.
    pub fn query_class(&self) -> &str {
        &self.query_class
    }

    /// The base expression for this builder.
    pub fn base(&self) -> Expression {
        Expression::Base(self.clone())
    }

    /// A field expression relative to this builder's range variable.
    pub fn field<S: Into<String>>(&self, path: impl IntoIterator<Item = S>) -> Expression {
        Expression::Field {
            path: path.into_iter().map(Into::into).collect(),
        }
    }
}

/// A constant value in selection criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String value.
    String(String),
    /// Integral value.
    Integer(i64),
    /// Floating point value.
    Double(f64),
    /// Boolean value.
    Boolean(bool),
    /// Enum constant, by fully qualified path.
    Enum(String),
    /// Entity type, by name.
    Entity(String),
    /// Date, time, or timestamp value.
    DateTime(DateTimeLiteral),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{}'", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Enum(path) => write!(f, "{}", path),
            Value::Entity(name) => write!(f, "{}", name),
            Value::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

/// An executable filter expression.
///
/// Finalized selection criteria always contain exactly one [`Base`] per
/// range variable; field paths are relative to it.
///
/// [`Base`]: Expression::Base
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// The range variable itself.
    Base(ExpressionBuilder),
    /// A state field reached from the base: `salary`, `address.city`.
    Field {
        /// Dot-separated field path relative to the base.
        path: Vec<String>,
    },
    /// A constant value.
    Constant(Value),
    /// A named or positional input parameter, as written: `:id`, `?1`.
    Parameter(String),
    /// Logical negation.
    Not(Box<Expression>),
    /// Arithmetic negation folded from a unary minus.
    Negated(Box<Expression>),
    /// Logical conjunction.
    And(Box<Expression>, Box<Expression>),
    /// Logical disjunction.
    Or(Box<Expression>, Box<Expression>),
    /// A comparison between two operands.
    Compare {
        /// The comparison operator.
        op: ComparisonOp,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
    },
    /// An arithmetic computation over two operands.
    Compute {
        /// The arithmetic operator.
        op: ArithmeticOp,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
    },
}

impl Expression {
    /// Creates an equality comparison.
    pub fn equal(left: Expression, right: Expression) -> Self {
        Expression::Compare {
            op: ComparisonOp::Equal,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a conjunction.
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    /// Creates a disjunction.
    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    /// The builder this expression is rooted at, if it contains one.
    ///
    /// Composite expressions answer the leftmost builder.
    pub fn builder(&self) -> Option<&ExpressionBuilder> {
        match self {
            Expression::Base(builder) => Some(builder),
            Expression::Not(inner) | Expression::Negated(inner) => inner.builder(),
            Expression::And(left, right)
            | Expression::Or(left, right)
            | Expression::Compare { left, right, .. }
            | Expression::Compute { left, right, .. } => {
                left.builder().or_else(|| right.builder())
            }
            Expression::Field { .. } | Expression::Constant(_) | Expression::Parameter(_) => None,
        }
    }
}
