//! Executable modify-all query objects.

use crate::criteria::{Expression, ExpressionBuilder};
use crate::error::{QueryBuildError, QueryBuildResult};

/// Common surface of the modify-all query kinds.
///
/// The query builder drives construction through this trait: shared
/// traversal logic lives once, and each concrete query supplies its
/// kind-specific parts (a delete rejects update items, an update collects
/// them).
pub trait ModifyAllQuery {
    /// A short name of the query kind, for diagnostics.
    fn kind(&self) -> &'static str;

    /// The class this query modifies, once established.
    fn reference_class(&self) -> Option<&str>;

    /// Sets the class this query modifies.
    fn set_reference_class(&mut self, class_name: String);

    /// The expression builder scoping the query's criteria.
    fn expression_builder(&self) -> Option<&ExpressionBuilder>;

    /// Sets the expression builder scoping the query's criteria.
    fn set_expression_builder(&mut self, builder: ExpressionBuilder);

    /// The current selection criteria.
    fn selection_criteria(&self) -> Option<&Expression>;

    /// Sets the selection criteria, replacing any prior value.
    fn set_selection_criteria(&mut self, criteria: Expression);

    /// Records one SET item.
    ///
    /// Only meaningful for update queries; other kinds report
    /// [`QueryBuildError::InvalidUpdateItem`].
    fn add_update_item(&mut self, field: Vec<String>, value: Expression) -> QueryBuildResult<()>;
}

/// A bulk DELETE query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteAllQuery {
    reference_class: Option<String>,
    builder: Option<ExpressionBuilder>,
    criteria: Option<Expression>,
}

impl DeleteAllQuery {
    /// Creates an empty delete-all query.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModifyAllQuery for DeleteAllQuery {
    fn kind(&self) -> &'static str {
        "delete-all query"
    }

    fn reference_class(&self) -> Option<&str> {
        self.reference_class.as_deref()
    }

    fn set_reference_class(&mut self, class_name: String) {
        self.reference_class = Some(class_name);
    }

    fn expression_builder(&self) -> Option<&ExpressionBuilder> {
        self.builder.as_ref()
    }

    fn set_expression_builder(&mut self, builder: ExpressionBuilder) {
        self.builder = Some(builder);
    }

    fn selection_criteria(&self) -> Option<&Expression> {
        self.criteria.as_ref()
    }

    fn set_selection_criteria(&mut self, criteria: Expression) {
        self.criteria = Some(criteria);
    }

    fn add_update_item(&mut self, _field: Vec<String>, _value: Expression) -> QueryBuildResult<()> {
        Err(QueryBuildError::InvalidUpdateItem(self.kind()))
    }
}

/// One SET assignment of an update-all query.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAssignment {
    /// The state field being assigned, relative to the range variable.
    pub field: Vec<String>,
    /// The new value expression.
    pub value: Expression,
}

/// A bulk UPDATE query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateAllQuery {
    reference_class: Option<String>,
    builder: Option<ExpressionBuilder>,
    criteria: Option<Expression>,
    updates: Vec<UpdateAssignment>,
}

impl UpdateAllQuery {
    /// Creates an empty update-all query.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected SET assignments, in declared order.
    pub fn updates(&self) -> &[UpdateAssignment] {
        &self.updates
    }
}

impl ModifyAllQuery for UpdateAllQuery {
    fn kind(&self) -> &'static str {
        "update-all query"
    }

    fn reference_class(&self) -> Option<&str> {
        self.reference_class.as_deref()
    }

    fn set_reference_class(&mut self, class_name: String) {
        self.reference_class = Some(class_name);
    }

    fn expression_builder(&self) -> Option<&ExpressionBuilder> {
        self.builder.as_ref()
    }

    fn set_expression_builder(&mut self, builder: ExpressionBuilder) {
        self.builder = Some(builder);
    }

    fn selection_criteria(&self) -> Option<&Expression> {
        self.criteria.as_ref()
    }

    fn set_selection_criteria(&mut self, criteria: Expression) {
        self.criteria = Some(criteria);
    }

    fn add_update_item(&mut self, field: Vec<String>, value: Expression) -> QueryBuildResult<()> {
        self.updates.push(UpdateAssignment { field, value });
        Ok(())
    }
}
