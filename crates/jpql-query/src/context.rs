//! Per-build state for query construction.

use jpql::{ExpressionNode, Literal, NumericKind};

use crate::criteria::{Expression, ExpressionBuilder, Value};
use crate::error::{QueryBuildError, QueryBuildResult};
use crate::query::ModifyAllQuery;
use crate::traits::MetadataProvider;

/// Transient state carried through one query build.
///
/// Owns the query under construction, the base expression established by
/// the first range variable declaration, and the metadata lookup service.
/// A context is exclusively owned by one build; independent builds on
/// independent contexts need no locking.
pub struct QueryBuilderContext<'a, Q: ModifyAllQuery> {
    query: Q,
    base_expression: Option<Expression>,
    range_variable: Option<String>,
    metadata: &'a dyn MetadataProvider,
}

impl<'a, Q: ModifyAllQuery> QueryBuilderContext<'a, Q> {
    /// Creates a context around the query to populate.
    pub fn new(query: Q, metadata: &'a dyn MetadataProvider) -> Self {
        Self {
            query,
            base_expression: None,
            range_variable: None,
            metadata,
        }
    }

    /// The query under construction.
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Mutable access to the query under construction.
    pub fn query_mut(&mut self) -> &mut Q {
        &mut self.query
    }

    /// Finishes the build and releases the query.
    pub fn into_query(self) -> Q {
        self.query
    }

    /// The base expression, once established.
    pub fn base_expression(&self) -> Option<&Expression> {
        self.base_expression.as_ref()
    }

    /// Establishes the base expression from a range variable declaration.
    ///
    /// The first declaration wins: later calls return the existing base
    /// untouched. The entity name is resolved through the metadata
    /// provider; an unknown name is a build error.
    pub fn establish_base(
        &mut self,
        entity_name: &str,
        variable: &str,
    ) -> QueryBuildResult<&Expression> {
        if self.base_expression.is_none() {
            let class_name = self
                .metadata
                .class_for_entity(entity_name)
                .ok_or_else(|| QueryBuildError::UnknownEntity(entity_name.to_string()))?;
            self.range_variable = Some(variable.to_string());
            self.base_expression = Some(Expression::Base(ExpressionBuilder::new(class_name)));
        }
        match &self.base_expression {
            Some(base) => Ok(base),
            None => Err(QueryBuildError::MissingBaseExpression),
        }
    }

    /// Strips the range variable from the front of a path.
    pub fn relative_path(&self, segments: &[String]) -> Vec<String> {
        match (&self.range_variable, segments.first()) {
            (Some(variable), Some(first)) if variable == first => segments[1..].to_vec(),
            _ => segments.to_vec(),
        }
    }

    /// Builds an executable filter expression from a parsed conditional.
    ///
    /// A [`ExpressionNode::WhereClause`] may be passed directly; its inner
    /// condition is built.
    pub fn build_expression(&self, node: &ExpressionNode) -> QueryBuildResult<Expression> {
        match node {
            ExpressionNode::WhereClause(inner) => self.build_expression(inner),
            ExpressionNode::Or(left, right) => Ok(Expression::Or(
                Box::new(self.build_expression(left)?),
                Box::new(self.build_expression(right)?),
            )),
            ExpressionNode::And(left, right) => Ok(Expression::And(
                Box::new(self.build_expression(left)?),
                Box::new(self.build_expression(right)?),
            )),
            ExpressionNode::Not(inner) => {
                Ok(Expression::Not(Box::new(self.build_expression(inner)?)))
            }
            ExpressionNode::Comparison { op, left, right } => Ok(Expression::Compare {
                op: *op,
                left: Box::new(self.build_expression(left)?),
                right: Box::new(self.build_expression(right)?),
            }),
            ExpressionNode::Arithmetic { op, left, right } => Ok(Expression::Compute {
                op: *op,
                left: Box::new(self.build_expression(left)?),
                right: Box::new(self.build_expression(right)?),
            }),
            ExpressionNode::Group { inner, negated } => {
                let expr = self.build_expression(inner)?;
                Ok(negate_if(expr, *negated))
            }
            ExpressionNode::Path { segments, negated } => {
                let expr = if segments.len() == 1
                    && self.range_variable.as_deref() == segments.first().map(String::as_str)
                {
                    match &self.base_expression {
                        Some(base) => base.clone(),
                        None => return Err(QueryBuildError::MissingBaseExpression),
                    }
                } else {
                    Expression::Field {
                        path: self.relative_path(segments),
                    }
                };
                Ok(negate_if(expr, *negated))
            }
            ExpressionNode::InputParameter { name, negated } => {
                Ok(negate_if(Expression::Parameter(name.clone()), *negated))
            }
            ExpressionNode::Literal(literal) => {
                Ok(Expression::Constant(self.value_from_literal(literal)?))
            }
            other => Err(QueryBuildError::UnsupportedExpression(
                other.kind_name().to_string(),
            )),
        }
    }

    fn value_from_literal(&self, literal: &Literal) -> QueryBuildResult<Value> {
        match literal {
            Literal::String(s) => Ok(Value::String(s.clone())),
            Literal::Boolean(b) => Ok(Value::Boolean(*b)),
            Literal::Numeric(n) => match n.kind {
                NumericKind::Integer | NumericKind::Long => {
                    n.as_i64()
                        .map(Value::Integer)
                        .ok_or_else(|| QueryBuildError::InvalidLiteral {
                            literal: n.text.clone(),
                            kind: "integer",
                        })
                }
                NumericKind::Float | NumericKind::Double => {
                    n.as_f64()
                        .map(Value::Double)
                        .ok_or_else(|| QueryBuildError::InvalidLiteral {
                            literal: n.text.clone(),
                            kind: "floating point",
                        })
                }
            },
            Literal::Enum { path } => Ok(Value::Enum(path.clone())),
            Literal::EntityType { name } => Ok(Value::Entity(name.clone())),
            Literal::DateTime(dt) => Ok(Value::DateTime(*dt)),
        }
    }
}

fn negate_if(expr: Expression, negated: bool) -> Expression {
    if negated {
        Expression::Negated(Box::new(expr))
    } else {
        expr
    }
}
