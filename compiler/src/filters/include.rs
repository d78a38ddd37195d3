//! Relation inclusion compilation
//!
//! Each inclusion is resolved against the catalog and, when it carries a
//! scope or the relation hides columns, compiled recursively against the
//! relation's target table.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::compiler::FilterCompiler;
use super::error::FilterError;
use super::types::{Filter, RelationQuery};
use crate::schema::{ResolvedColumns, TableSchema};

/// A requested relation: `"posts"` or `{"relation": "posts", "scope": {...}}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inclusion {
    pub relation: String,
    #[serde(default)]
    pub scope: Option<Filter>,
}

impl Inclusion {
    pub fn from_value(table: &str, value: &JsonValue) -> Result<Self, FilterError> {
        match value {
            JsonValue::String(relation) => Ok(Self {
                relation: relation.clone(),
                scope: None,
            }),
            JsonValue::Object(_) => {
                Self::deserialize(value).map_err(|e| FilterError::InvalidIncludeFormat {
                    table: table.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => Err(FilterError::InvalidIncludeFormat {
                table: table.to_string(),
                reason: "expected a relation name or {relation, scope} object".to_string(),
            }),
        }
    }
}

/// Compile `includes` for a filter at nesting level `depth` (0 = top level)
pub(crate) fn compile_includes(
    compiler: &FilterCompiler<'_>,
    schema: &TableSchema,
    includes: &[JsonValue],
    depth: usize,
) -> Result<BTreeMap<String, RelationQuery>, FilterError> {
    let mut with = BTreeMap::new();

    for value in includes {
        let inclusion = Inclusion::from_value(&schema.name, value)?;
        let not_found = || FilterError::RelationNotFound {
            table: schema.name.clone(),
            relation: inclusion.relation.clone(),
        };

        let relation = compiler
            .catalog()
            .relation(&schema.name, &inclusion.relation)
            .ok_or_else(not_found)?;

        if let Some(max) = compiler.config().max_inclusion_depth
            && depth >= max
        {
            return Err(FilterError::InclusionTooDeep {
                table: schema.name.clone(),
                relation: inclusion.relation.clone(),
                max,
            });
        }

        let hidden = compiler
            .hidden_properties(relation)
            .filter(|hidden| !hidden.is_empty());

        if inclusion.scope.is_none() && hidden.is_none() {
            tracing::trace!(table = %schema.name, relation = %relation.name, "Include all");
            with.insert(inclusion.relation.clone(), RelationQuery::All);
            continue;
        }

        let target = compiler.catalog().table(&relation.target).ok_or_else(not_found)?;
        let scope = inclusion.scope.clone().unwrap_or_default();
        let mut nested = compiler.compile_at_depth(&target, &scope, depth + 1)?;

        if let Some(hidden) = hidden {
            let target_columns = compiler.resolver().resolve(&target)?;
            let visible = visible_columns(&target_columns, nested.columns.take(), hidden)?;
            nested.columns = Some(visible);
        }

        tracing::trace!(
            table = %schema.name,
            relation = %relation.name,
            target = %relation.target,
            depth = depth + 1,
            "Compiled scoped inclusion"
        );
        with.insert(inclusion.relation, RelationQuery::Scoped(Box::new(nested)));
    }

    Ok(with)
}

/// All target columns minus hidden, or the requested projection minus hidden.
///
/// A projection left empty once hidden columns are removed is rejected.
fn visible_columns(
    columns: &ResolvedColumns,
    requested: Option<BTreeMap<String, bool>>,
    hidden: &[String],
) -> Result<BTreeMap<String, bool>, FilterError> {
    let is_hidden = |name: &str| hidden.iter().any(|h| h == name);
    match requested {
        Some(mut projection) => {
            projection.retain(|name, _| !is_hidden(name));
            if projection.is_empty() {
                return Err(FilterError::InvalidFields {
                    table: columns.table().to_string(),
                    reason: "no visible fields requested".to_string(),
                });
            }
            Ok(projection)
        }
        None => Ok(columns
            .iter()
            .filter(|c| !is_hidden(&c.name))
            .map(|c| (c.name.clone(), true))
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnResolver, DataType};
    use serde_json::json;
    use std::sync::Arc;

    fn users() -> Arc<ResolvedColumns> {
        ColumnResolver::new()
            .resolve(&TableSchema::new(
                "users",
                vec![
                    Column::new("id", DataType::Integer),
                    Column::new("name", DataType::Text),
                    Column::new("password", DataType::Text),
                ],
            ))
            .unwrap()
    }

    fn projection(names: &[&str]) -> BTreeMap<String, bool> {
        names.iter().map(|n| (n.to_string(), true)).collect()
    }

    #[test]
    fn test_visible_columns() {
        let hidden = vec!["password".to_string()];
        assert_eq!(
            visible_columns(&users(), None, &hidden).unwrap(),
            projection(&["id", "name"])
        );
        assert_eq!(
            visible_columns(&users(), Some(projection(&["name", "password"])), &hidden).unwrap(),
            projection(&["name"])
        );
    }

    #[test]
    fn test_visible_columns_rejects_hidden_only_request() {
        let hidden = vec!["password".to_string()];
        assert!(matches!(
            visible_columns(&users(), Some(projection(&["password"])), &hidden).unwrap_err(),
            FilterError::InvalidFields { ref table, .. } if table == "users"
        ));
    }

    #[test]
    fn test_inclusion_from_string() {
        let inclusion = Inclusion::from_value("users", &json!("posts")).unwrap();
        assert_eq!(inclusion.relation, "posts");
        assert!(inclusion.scope.is_none());
    }

    #[test]
    fn test_inclusion_from_object() {
        let inclusion = Inclusion::from_value(
            "users",
            &json!({"relation": "posts", "scope": {"limit": 3}}),
        )
        .unwrap();
        assert_eq!(inclusion.relation, "posts");
        assert_eq!(inclusion.scope.unwrap().limit, Some(3));
    }

    #[test]
    fn test_inclusion_invalid() {
        for value in [json!(1), json!({"scope": {}}), json!({"relation": "posts", "extra": 1})] {
            assert!(matches!(
                Inclusion::from_value("users", &value).unwrap_err(),
                FilterError::InvalidIncludeFormat { .. }
            ));
        }
    }
}
