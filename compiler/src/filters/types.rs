//! Filter DSL input and compiled query options

use std::collections::BTreeMap;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::expr::{OrderExpr, Predicate};

/// Key → literal | array | null | operator object, plus `and` / `or` groups.
/// Key order is preserved and drives predicate order.
pub type WhereClause = Map<String, JsonValue>;

/// Portable query description
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WhereClause>,
    /// Array of names or name → boolean map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<JsonValue>,
    /// `"field [ASC|DESC]"` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<String>>,
    /// Relation names or `{relation, scope}` objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Alias of `offset`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
}

impl Filter {
    /// Effective offset; `offset` wins over `skip`
    pub fn effective_offset(&self) -> Option<u64> {
        self.offset.or(self.skip)
    }
}

/// Compiled relation inclusion
#[derive(Debug, Clone, PartialEq)]
pub enum RelationQuery {
    /// Select-all shorthand
    All,
    Scoped(Box<QueryOptions>),
}

impl Serialize for RelationQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_bool(true),
            Self::Scoped(options) => options.serialize(serializer),
        }
    }
}

/// Compiler output consumed by the query execution layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<OrderExpr>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Predicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with: Option<BTreeMap<String, RelationQuery>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<BTreeMap<String, bool>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_parse_full() {
        let filter: Filter = serde_json::from_value(json!({
            "where": {"status": "active"},
            "fields": ["id", "name"],
            "order": ["createdAt DESC"],
            "include": ["posts", {"relation": "profile"}],
            "limit": 10,
            "skip": 20
        }))
        .unwrap();
        assert_eq!(filter.where_clause.unwrap()["status"], "active");
        assert_eq!(filter.order.unwrap(), vec!["createdAt DESC"]);
        assert_eq!(filter.include.unwrap().len(), 2);
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.offset, None);
    }

    #[test]
    fn test_filter_effective_offset() {
        let filter = Filter {
            skip: Some(5),
            ..Default::default()
        };
        assert_eq!(filter.effective_offset(), Some(5));
        let filter = Filter {
            skip: Some(5),
            offset: Some(7),
            ..Default::default()
        };
        assert_eq!(filter.effective_offset(), Some(7));
    }

    #[test]
    fn test_filter_rejects_unknown_keys() {
        let result: Result<Filter, _> = serde_json::from_value(json!({"wher": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_rejects_negative_limit() {
        let result: Result<Filter, _> = serde_json::from_value(json!({"limit": -1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_where_clause_preserves_key_order() {
        let filter: Filter =
            serde_json::from_str(r#"{"where": {"z": 1, "a": 2, "m": 3}}"#).unwrap();
        let keys: Vec<&String> = filter.where_clause.as_ref().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_query_options_serialize_relation_shorthand() {
        let mut with = BTreeMap::new();
        with.insert("posts".to_string(), RelationQuery::All);
        with.insert(
            "profile".to_string(),
            RelationQuery::Scoped(Box::new(QueryOptions {
                limit: Some(1),
                ..Default::default()
            })),
        );
        let options = QueryOptions {
            with: Some(with),
            ..Default::default()
        };
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value, json!({"with": {"posts": true, "profile": {"limit": 1}}}));
    }
}
