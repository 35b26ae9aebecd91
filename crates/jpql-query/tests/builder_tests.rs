//! Integration tests for query building over parsed JPQL statements.

use jpql::{parse_query, ComparisonOp, ExpressionNode, GrammarRegistry, TypeCatalog};
use jpql_query::{
    DeleteAllQuery, Expression, MetadataProvider, ModifyAllQuery, ModifyQueryBuilder,
    QueryBuildError, UpdateAllQuery, Value,
};
use std::collections::HashMap;

/// Metadata for a small Employee/Project model.
struct TestMetadata {
    classes: HashMap<&'static str, &'static str>,
}

impl TestMetadata {
    fn new() -> Self {
        let mut classes = HashMap::new();
        classes.insert("Employee", "com.acme.Employee");
        classes.insert("Manager", "com.acme.Manager");
        classes.insert("Project", "com.acme.Project");
        Self { classes }
    }
}

impl MetadataProvider for TestMetadata {
    fn class_for_entity(&self, entity_name: &str) -> Option<String> {
        self.classes.get(entity_name).map(|c| c.to_string())
    }
}

fn parse(text: &str) -> ExpressionNode {
    let grammar = GrammarRegistry::jpql();
    let mut types = TypeCatalog::new();
    types.register_enum_type("com.acme.Status");
    parse_query(text, &grammar, &types).unwrap()
}

fn range(entity: &str, variable: &str) -> ExpressionNode {
    ExpressionNode::RangeVariableDeclaration {
        entity_name: entity.to_string(),
        variable: variable.to_string(),
    }
}

fn where_clause(condition: ExpressionNode) -> ExpressionNode {
    ExpressionNode::WhereClause(Box::new(condition))
}

#[test]
fn test_delete_query_end_to_end() {
    let metadata = TestMetadata::new();
    let tree = parse("DELETE FROM Employee e WHERE e.status = com.acme.Status.INACTIVE");
    let query = ModifyQueryBuilder::new(DeleteAllQuery::new(), &metadata)
        .build(&tree)
        .unwrap();

    assert_eq!(query.reference_class(), Some("com.acme.Employee"));
    match query.selection_criteria() {
        Some(Expression::Compare { op, left, right }) => {
            assert_eq!(*op, ComparisonOp::Equal);
            assert_eq!(
                left.as_ref(),
                &Expression::Field {
                    path: vec!["status".to_string()]
                }
            );
            assert_eq!(
                right.as_ref(),
                &Expression::Constant(Value::Enum("com.acme.Status.INACTIVE".to_string()))
            );
        }
        other => panic!("expected a comparison, got {:?}", other),
    }
}

#[test]
fn test_update_query_end_to_end() {
    let metadata = TestMetadata::new();
    let tree = parse(
        "UPDATE Employee e SET e.salary = e.salary * 2, e.active = FALSE WHERE e.id = :id",
    );
    let query = ModifyQueryBuilder::new(UpdateAllQuery::new(), &metadata)
        .build(&tree)
        .unwrap();

    assert_eq!(query.reference_class(), Some("com.acme.Employee"));
    assert_eq!(query.updates().len(), 2);
    assert_eq!(query.updates()[0].field, vec!["salary"]);
    assert!(matches!(
        query.updates()[0].value,
        Expression::Compute { .. }
    ));
    assert_eq!(
        query.updates()[1].value,
        Expression::Constant(Value::Boolean(false))
    );
    match query.selection_criteria() {
        Some(Expression::Compare { right, .. }) => {
            assert_eq!(right.as_ref(), &Expression::Parameter(":id".to_string()));
        }
        other => panic!("expected a comparison, got {:?}", other),
    }
}

#[test]
fn test_first_range_variable_declaration_wins() {
    let metadata = TestMetadata::new();
    let mut builder = ModifyQueryBuilder::new(DeleteAllQuery::new(), &metadata);

    builder.traverse(&range("Employee", "e")).unwrap();
    builder.traverse(&range("Project", "p")).unwrap();

    let query = builder.finish();
    assert_eq!(query.reference_class(), Some("com.acme.Employee"));
    assert_eq!(
        query.expression_builder().map(|b| b.query_class()),
        Some("com.acme.Employee")
    );
}

#[test]
fn test_second_where_clause_replaces_criteria() {
    let metadata = TestMetadata::new();
    let mut builder = ModifyQueryBuilder::new(DeleteAllQuery::new(), &metadata);
    builder.traverse(&range("Employee", "e")).unwrap();

    let first = where_clause(ExpressionNode::comparison(
        ComparisonOp::Equal,
        ExpressionNode::path(["e", "id"]),
        ExpressionNode::integer(1),
    ));
    let second = where_clause(ExpressionNode::comparison(
        ComparisonOp::Equal,
        ExpressionNode::path(["e", "id"]),
        ExpressionNode::integer(2),
    ));

    builder.traverse(&first).unwrap();
    builder.traverse(&second).unwrap();

    let query = builder.finish();
    match query.selection_criteria() {
        Some(Expression::Compare { right, .. }) => {
            assert_eq!(right.as_ref(), &Expression::Constant(Value::Integer(2)));
        }
        other => panic!("expected a comparison, got {:?}", other),
    }
}

#[test]
fn test_unknown_entity_is_a_build_error() {
    let metadata = TestMetadata::new();
    let tree = parse("DELETE FROM Racer r");
    let err = ModifyQueryBuilder::new(DeleteAllQuery::new(), &metadata)
        .build(&tree)
        .unwrap_err();
    assert_eq!(err, QueryBuildError::UnknownEntity("Racer".to_string()));
}

#[test]
fn test_where_clause_without_range_variable_fails() {
    let metadata = TestMetadata::new();
    let mut builder = ModifyQueryBuilder::new(DeleteAllQuery::new(), &metadata);

    let clause = where_clause(ExpressionNode::comparison(
        ComparisonOp::Equal,
        ExpressionNode::path(["e"]),
        ExpressionNode::integer(1),
    ));
    let err = builder.traverse(&clause).unwrap_err();
    assert_eq!(err, QueryBuildError::MissingBaseExpression);
}

#[test]
fn test_logical_operators_translate() {
    let metadata = TestMetadata::new();
    let tree = parse(
        "DELETE FROM Employee e WHERE NOT e.active = TRUE AND e.salary > 1000 OR e.id = 1",
    );
    let query = ModifyQueryBuilder::new(DeleteAllQuery::new(), &metadata)
        .build(&tree)
        .unwrap();

    match query.selection_criteria() {
        Some(Expression::Or(left, _)) => {
            assert!(matches!(left.as_ref(), Expression::And(_, _)));
        }
        other => panic!("expected OR at the root, got {:?}", other),
    }
}

#[test]
fn test_negated_primary_translates() {
    let metadata = TestMetadata::new();
    let tree = parse("UPDATE Employee e SET e.balance = -e.debt");
    let query = ModifyQueryBuilder::new(UpdateAllQuery::new(), &metadata)
        .build(&tree)
        .unwrap();

    assert_eq!(
        query.updates()[0].value,
        Expression::Negated(Box::new(Expression::Field {
            path: vec!["debt".to_string()]
        }))
    );
}
