//! Tree-walking builder that populates a query from a parsed statement.

use jpql::{parse_query, ExpressionNode, GrammarRegistry, TypeCatalog};

use crate::context::QueryBuilderContext;
use crate::error::{QueryBuildError, QueryBuildResult};
use crate::query::{DeleteAllQuery, ModifyAllQuery, UpdateAllQuery};
use crate::traits::MetadataProvider;

/// Builds a modify-all query by walking a parsed expression tree.
///
/// Traversal is single-pass and depth-first in declared child order; no
/// node is visited twice. The builder is generic over the query kind:
/// traversal logic is shared, and kind-specific construction is supplied
/// by the concrete [`ModifyAllQuery`] implementation.
///
/// # Example
///
/// ```rust
/// use jpql::{parse_query, GrammarRegistry, TypeCatalog};
/// use jpql_query::{DeleteAllQuery, MetadataProvider, ModifyAllQuery, ModifyQueryBuilder};
///
/// struct Identity;
/// impl MetadataProvider for Identity {
///     fn class_for_entity(&self, entity_name: &str) -> Option<String> {
///         Some(entity_name.to_string())
///     }
/// }
///
/// let grammar = GrammarRegistry::jpql();
/// let types = TypeCatalog::new();
/// let tree = parse_query("DELETE FROM Employee e WHERE e.id = 1", &grammar, &types).unwrap();
///
/// let query = ModifyQueryBuilder::new(DeleteAllQuery::new(), &Identity)
///     .build(&tree)
///     .unwrap();
/// assert_eq!(query.reference_class(), Some("Employee"));
/// assert!(query.selection_criteria().is_some());
/// ```
pub struct ModifyQueryBuilder<'a, Q: ModifyAllQuery> {
    context: QueryBuilderContext<'a, Q>,
}

impl<'a, Q: ModifyAllQuery> ModifyQueryBuilder<'a, Q> {
    /// Creates a builder around the query to populate.
    pub fn new(query: Q, metadata: &'a dyn MetadataProvider) -> Self {
        Self {
            context: QueryBuilderContext::new(query, metadata),
        }
    }

    /// Walks a tree and finishes the query in one step.
    pub fn build(mut self, tree: &ExpressionNode) -> QueryBuildResult<Q> {
        self.traverse(tree)?;
        Ok(self.finish())
    }

    /// Walks a tree depth-first, applying each node to the query.
    ///
    /// May be called more than once; the query keeps accumulating state
    /// (the reference class from the first range variable declaration, the
    /// selection criteria from the most recent where clause).
    pub fn traverse(&mut self, node: &ExpressionNode) -> QueryBuildResult<()> {
        self.visit(node)?;
        for child in node.children() {
            self.traverse(child)?;
        }
        Ok(())
    }

    /// Releases the populated query.
    pub fn finish(self) -> Q {
        self.context.into_query()
    }

    fn visit(&mut self, node: &ExpressionNode) -> QueryBuildResult<()> {
        match node {
            ExpressionNode::RangeVariableDeclaration {
                entity_name,
                variable,
            } => self.visit_range_variable(entity_name, variable),
            ExpressionNode::WhereClause(condition) => self.visit_where_clause(condition),
            ExpressionNode::UpdateItem { path, value } => self.visit_update_item(path, value),
            // Remaining kinds carry no query-level state of their own;
            // they are consumed when a clause above them is built.
            ExpressionNode::DeleteStatement { .. }
            | ExpressionNode::UpdateStatement { .. }
            | ExpressionNode::Or(_, _)
            | ExpressionNode::And(_, _)
            | ExpressionNode::Not(_)
            | ExpressionNode::Comparison { .. }
            | ExpressionNode::Arithmetic { .. }
            | ExpressionNode::Path { .. }
            | ExpressionNode::InputParameter { .. }
            | ExpressionNode::Group { .. }
            | ExpressionNode::Literal(_) => Ok(()),
        }
    }

    /// Scopes the query to the declared range: sets the expression builder
    /// and, when not already present, the reference class. The first
    /// declaration wins; later ones never override the reference class.
    fn visit_range_variable(&mut self, entity_name: &str, variable: &str) -> QueryBuildResult<()> {
        let builder = self
            .context
            .establish_base(entity_name, variable)?
            .builder()
            .cloned()
            .ok_or(QueryBuildError::MissingBaseExpression)?;

        let query = self.context.query_mut();
        query.set_expression_builder(builder.clone());
        if query.reference_class().is_none() {
            query.set_reference_class(builder.query_class().to_string());
        }
        Ok(())
    }

    /// Builds the filter expression and installs it as the selection
    /// criteria, replacing any prior value.
    fn visit_where_clause(&mut self, condition: &ExpressionNode) -> QueryBuildResult<()> {
        if self.context.base_expression().is_none() {
            return Err(QueryBuildError::MissingBaseExpression);
        }
        let criteria = self.context.build_expression(condition)?;
        self.context.query_mut().set_selection_criteria(criteria);
        Ok(())
    }

    fn visit_update_item(
        &mut self,
        path: &ExpressionNode,
        value: &ExpressionNode,
    ) -> QueryBuildResult<()> {
        let field = match path {
            ExpressionNode::Path { segments, .. } => self.context.relative_path(segments),
            _ => return Err(QueryBuildError::InvalidUpdateTarget),
        };
        let value_expr = self.context.build_expression(value)?;
        self.context.query_mut().add_update_item(field, value_expr)
    }
}

/// A query built from a modify statement, by statement kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifyQuery {
    /// Built from a DELETE statement.
    Delete(DeleteAllQuery),
    /// Built from an UPDATE statement.
    Update(UpdateAllQuery),
}

/// Parses a JPQL modify statement and builds the matching query kind.
pub fn build_modify_query(
    query_text: &str,
    grammar: &GrammarRegistry,
    types: &TypeCatalog,
    metadata: &dyn MetadataProvider,
) -> QueryBuildResult<ModifyQuery> {
    let tree = parse_query(query_text, grammar, types)?;
    match &tree {
        ExpressionNode::DeleteStatement { .. } => {
            let query = ModifyQueryBuilder::new(DeleteAllQuery::new(), metadata).build(&tree)?;
            Ok(ModifyQuery::Delete(query))
        }
        ExpressionNode::UpdateStatement { .. } => {
            let query = ModifyQueryBuilder::new(UpdateAllQuery::new(), metadata).build(&tree)?;
            Ok(ModifyQuery::Update(query))
        }
        other => Err(QueryBuildError::UnsupportedExpression(
            other.kind_name().to_string(),
        )),
    }
}
