//! Where-clause compilation
//!
//! Walks the clause in key order. Each key is a logical group (`and`/`or`),
//! a JSON path, or a plain column. Sibling conditions are combined with AND.

use serde_json::{Map, Value as JsonValue};

use super::error::{FilterError, KeyContext, Stage};
use super::expr::Predicate;
use super::json_path::{JsonPath, is_json_path};
use super::operators::{Operator, Target};
use super::types::WhereClause;
use crate::schema::ResolvedColumns;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogicalGroup {
    And,
    Or,
}

impl LogicalGroup {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// How a condition value is interpreted
enum ValueKind<'a> {
    /// Direct equality / NULL / IN semantics
    Primitive(&'a JsonValue),
    /// Every key is a registered operator
    Operators(&'a Map<String, JsonValue>),
}

fn classify(value: &JsonValue) -> ValueKind<'_> {
    match value {
        JsonValue::Object(map) if !map.is_empty() && map.keys().all(|k| Operator::is_valid(k)) => {
            ValueKind::Operators(map)
        }
        // Any other object is a literal (equality against JSON columns)
        _ => ValueKind::Primitive(value),
    }
}

/// Compile a where clause. `None` means "no predicate" (match all).
pub fn compile_where(
    columns: &ResolvedColumns,
    clause: &WhereClause,
) -> Result<Option<Predicate>, FilterError> {
    let mut predicates = Vec::new();

    for (key, value) in clause {
        if let Some(group) = LogicalGroup::from_key(key) {
            if let Some(predicate) = compile_group(columns, key, group, value)? {
                predicates.push(predicate);
            }
            continue;
        }

        let ctx = KeyContext::new(Stage::Where, columns.table(), key);
        if is_json_path(key) {
            let path = JsonPath::resolve(key, columns, Stage::Where)?;
            compile_condition(&Target::Path(&path), value, &ctx, &mut predicates)?;
        } else {
            let Some(column) = columns.get(key) else {
                return Err(ctx.column_not_found(key));
            };
            compile_condition(&Target::Column(column), value, &ctx, &mut predicates)?;
        }
    }

    Ok(Predicate::all(predicates))
}

fn compile_group(
    columns: &ResolvedColumns,
    key: &str,
    group: LogicalGroup,
    value: &JsonValue,
) -> Result<Option<Predicate>, FilterError> {
    // A single clause is accepted in place of a one-element array
    let members = match value {
        JsonValue::Array(items) => items.as_slice(),
        JsonValue::Object(_) => std::slice::from_ref(value),
        _ => {
            return Err(FilterError::InvalidWhereClause {
                table: columns.table().to_string(),
                key: key.to_string(),
                reason: "logical group expects an array of clauses".to_string(),
            });
        }
    };

    let mut clauses = Vec::with_capacity(members.len());
    for member in members {
        let JsonValue::Object(clause) = member else {
            return Err(FilterError::InvalidWhereClause {
                table: columns.table().to_string(),
                key: key.to_string(),
                reason: "logical group members must be objects".to_string(),
            });
        };
        if let Some(predicate) = compile_where(columns, clause)? {
            clauses.push(predicate);
        }
    }

    tracing::trace!(
        table = columns.table(),
        group = key,
        members = clauses.len(),
        "Compiled logical group"
    );

    Ok(match group {
        LogicalGroup::And => Predicate::all(clauses),
        LogicalGroup::Or => Predicate::any(clauses),
    })
}

fn compile_condition(
    target: &Target<'_>,
    value: &JsonValue,
    ctx: &KeyContext<'_>,
    out: &mut Vec<Predicate>,
) -> Result<(), FilterError> {
    match classify(value) {
        ValueKind::Primitive(value) => {
            // null -> IS NULL, array -> IN, anything else -> equality
            let op = if value.is_array() {
                Operator::In
            } else {
                Operator::Eq
            };
            out.push(op.build(op.canonical_name(), target, value, ctx)?);
        }
        ValueKind::Operators(ops) => {
            for (name, operand) in ops {
                let op = Operator::from_name(name).ok_or_else(|| ctx.invalid_operator(name))?;
                out.push(op.build(name, target, operand, ctx)?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::expr::{CompareOp, Expr};
    use crate::schema::{Column, ColumnResolver, DataType, TableSchema};
    use serde_json::json;
    use std::sync::Arc;

    fn columns() -> Arc<ResolvedColumns> {
        ColumnResolver::new()
            .resolve(&TableSchema::new(
                "users",
                vec![
                    Column::new("a", DataType::Integer),
                    Column::new("b", DataType::Integer),
                    Column::new("status", DataType::Text),
                    Column::new("role", DataType::Text),
                    Column::new("verified", DataType::Boolean),
                    Column::new("metadata", DataType::Jsonb),
                ],
            ))
            .unwrap()
    }

    fn compile(value: JsonValue) -> Result<Option<Predicate>, FilterError> {
        let JsonValue::Object(clause) = value else {
            panic!("test clause must be an object");
        };
        compile_where(&columns(), &clause)
    }

    fn eq(column: &str, value: JsonValue) -> Predicate {
        Predicate::Compare {
            expr: Expr::column(column),
            op: CompareOp::Eq,
            value,
        }
    }

    #[test]
    fn test_single_condition_unwrapped() {
        assert_eq!(compile(json!({"a": 1})).unwrap(), Some(eq("a", json!(1))));
    }

    #[test]
    fn test_empty_clause_is_no_predicate() {
        assert_eq!(compile(json!({})).unwrap(), None);
    }

    #[test]
    fn test_siblings_combined_with_and_in_key_order() {
        assert_eq!(
            compile(json!({"b": 2, "a": 1})).unwrap(),
            Some(Predicate::And {
                terms: vec![eq("b", json!(2)), eq("a", json!(1))]
            })
        );
    }

    #[test]
    fn test_null_value_is_null() {
        assert_eq!(
            compile(json!({"status": null})).unwrap(),
            Some(Predicate::IsNull {
                expr: Expr::column("status")
            })
        );
    }

    #[test]
    fn test_array_value_is_in() {
        assert_eq!(
            compile(json!({"a": []})).unwrap(),
            Some(Predicate::Constant { value: false })
        );
        assert!(matches!(
            compile(json!({"a": [1, 2]})).unwrap(),
            Some(Predicate::InList { negated: false, ref values, .. }) if values.len() == 2
        ));
    }

    #[test]
    fn test_unknown_column() {
        let err = compile(json!({"nope": 1})).unwrap_err();
        assert!(matches!(
            err,
            FilterError::ColumnNotFound { ref column, ref table, .. } if column == "nope" && table == "users"
        ));
    }

    #[test]
    fn test_mixed_object_is_literal() {
        // "theme" is not an operator, so the whole object is an equality literal
        assert_eq!(
            compile(json!({"metadata": {"gt": 1, "theme": "dark"}})).unwrap(),
            Some(eq("metadata", json!({"gt": 1, "theme": "dark"})))
        );
        assert_eq!(
            compile(json!({"metadata": {}})).unwrap(),
            Some(eq("metadata", json!({})))
        );
    }

    #[test]
    fn test_multiple_operators_on_one_key() {
        let p = compile(json!({"a": {"gte": 1, "lt": 10}})).unwrap().unwrap();
        let Predicate::And { terms } = p else {
            panic!("expected AND");
        };
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_and_or_groups() {
        assert!(matches!(
            compile(json!({"and": [{"a": 1}, {"b": 2}]})).unwrap(),
            Some(Predicate::And { ref terms }) if terms.len() == 2
        ));
        assert!(matches!(
            compile(json!({"or": [{"a": 1}, {"b": 2}]})).unwrap(),
            Some(Predicate::Or { ref terms }) if terms.len() == 2
        ));
    }

    #[test]
    fn test_nested_groups_two_levels() {
        let p = compile(json!({
            "status": "active",
            "or": [
                {"role": "admin"},
                {"and": [{"role": "user"}, {"verified": true}]}
            ]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(p.depth(), 3);
        let Predicate::And { terms } = &p else {
            panic!("expected top-level AND");
        };
        assert_eq!(terms[0], eq("status", json!("active")));
        assert!(matches!(&terms[1], Predicate::Or { terms } if terms.len() == 2));
    }

    #[test]
    fn test_group_singleton_object_coerced() {
        assert_eq!(
            compile(json!({"or": {"a": 1}})).unwrap(),
            Some(eq("a", json!(1)))
        );
    }

    #[test]
    fn test_empty_group_contributes_nothing() {
        assert_eq!(compile(json!({"and": []})).unwrap(), None);
        assert_eq!(
            compile(json!({"a": 1, "or": [{}]})).unwrap(),
            Some(eq("a", json!(1)))
        );
    }

    #[test]
    fn test_group_bad_members() {
        assert!(matches!(
            compile(json!({"and": 5})).unwrap_err(),
            FilterError::InvalidWhereClause { .. }
        ));
        assert!(matches!(
            compile(json!({"or": [1]})).unwrap_err(),
            FilterError::InvalidWhereClause { .. }
        ));
    }

    #[test]
    fn test_json_path_numeric() {
        let p = compile(json!({"metadata.priority": {"gt": 3}})).unwrap().unwrap();
        assert!(matches!(
            p,
            Predicate::Compare { expr: Expr::SafeNumeric { .. }, op: CompareOp::Gt, .. }
        ));
    }

    #[test]
    fn test_json_path_literal() {
        assert_eq!(
            compile(json!({"metadata.tags[0]": "important"})).unwrap(),
            Some(Predicate::Compare {
                expr: Expr::JsonText {
                    column: "metadata".to_string(),
                    path: vec!["tags".to_string(), "0".to_string()]
                },
                op: CompareOp::Eq,
                value: json!("important")
            })
        );
    }

    #[test]
    fn test_json_path_errors() {
        assert!(matches!(
            compile(json!({"metadata.field;DROP": 1})).unwrap_err(),
            FilterError::InvalidJsonPathComponent { .. }
        ));
        assert!(matches!(
            compile(json!({"status.x": 1})).unwrap_err(),
            FilterError::NonJsonColumn { .. }
        ));
    }

    #[test]
    fn test_structural_operator_under_column() {
        assert!(matches!(
            compile(json!({"a": {"or": [1]}})).unwrap_err(),
            FilterError::InvalidOperator { .. }
        ));
    }
}
