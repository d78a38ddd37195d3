//! Relation registry
//!
//! Relations reference their target table by name and are resolved lazily at
//! compile time, so mutually referencing tables need no initialization order.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::column::{Column, TableSchema};

/// Cardinality of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    One,
    Many,
}

/// Join columns between source and target tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMetadata {
    #[serde(default)]
    pub source_columns: Vec<String>,
    #[serde(default)]
    pub target_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationConfig {
    pub name: String,
    pub kind: RelationKind,
    /// Target table name, resolved through the catalog
    pub target: String,
    #[serde(default)]
    pub join: JoinMetadata,
}

impl RelationConfig {
    pub fn new(name: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            join: JoinMetadata::default(),
        }
    }

    pub fn with_join(mut self, source_columns: &[&str], target_columns: &[&str]) -> Self {
        self.join = JoinMetadata {
            source_columns: source_columns.iter().map(|s| s.to_string()).collect(),
            target_columns: target_columns.iter().map(|s| s.to_string()).collect(),
        };
        self
    }
}

/// Resolves the columns a relation hides from its default projection
pub trait HiddenProperties: Send + Sync {
    fn hidden_properties(&self, relation: &RelationConfig) -> Option<&[String]>;
}

/// Keyed by relation name
impl HiddenProperties for HashMap<String, Vec<String>> {
    fn hidden_properties(&self, relation: &RelationConfig) -> Option<&[String]> {
        self.get(&relation.name).map(Vec::as_slice)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableDefinition {
    name: String,
    columns: Vec<Column>,
    #[serde(default)]
    relations: Vec<RelationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CatalogDefinition {
    tables: Vec<TableDefinition>,
    #[serde(default)]
    hidden_properties: HashMap<String, Vec<String>>,
}

/// Schemas, relations and hidden properties known to the compiler
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "CatalogDefinition")]
pub struct Catalog {
    tables: HashMap<String, Arc<TableSchema>>,
    relations: HashMap<String, HashMap<String, RelationConfig>>,
    hidden: HashMap<String, Vec<String>>,
}

impl From<CatalogDefinition> for Catalog {
    fn from(def: CatalogDefinition) -> Self {
        let mut catalog = Catalog::new();
        for table in def.tables {
            let name = table.name.clone();
            catalog = catalog.with_table(TableSchema::new(table.name, table.columns));
            for relation in table.relations {
                catalog = catalog.with_relation(&name, relation);
            }
        }
        catalog.hidden = def.hidden_properties;
        catalog
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, schema: TableSchema) -> Self {
        self.tables.insert(schema.name.clone(), Arc::new(schema));
        self
    }

    pub fn with_relation(mut self, table: &str, relation: RelationConfig) -> Self {
        self.relations
            .entry(table.to_string())
            .or_default()
            .insert(relation.name.clone(), relation);
        self
    }

    pub fn with_hidden(mut self, relation: &str, columns: &[&str]) -> Self {
        self.hidden.insert(
            relation.to_string(),
            columns.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn table(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.tables.get(name).cloned()
    }

    pub fn relation(&self, table: &str, relation: &str) -> Option<&RelationConfig> {
        self.relations.get(table)?.get(relation)
    }
}

impl HiddenProperties for Catalog {
    fn hidden_properties(&self, relation: &RelationConfig) -> Option<&[String]> {
        self.hidden.hidden_properties(relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    const CATALOG_JSON: &str = r#"{
        "tables": [
            {
                "name": "users",
                "columns": [
                    {"name": "id", "type": "integer"},
                    {"name": "password", "type": "text"}
                ],
                "relations": [
                    {
                        "name": "posts",
                        "kind": "many",
                        "target": "posts",
                        "join": {"sourceColumns": ["id"], "targetColumns": ["authorId"]}
                    }
                ]
            },
            {
                "name": "posts",
                "columns": [
                    {"name": "id", "type": "integer"},
                    {"name": "authorId", "type": "integer"}
                ],
                "relations": [{"name": "author", "kind": "one", "target": "users"}]
            }
        ],
        "hiddenProperties": {"author": ["password"]}
    }"#;

    #[test]
    fn test_catalog_parse() {
        let catalog: Catalog = serde_json::from_str(CATALOG_JSON).unwrap();
        let users = catalog.table("users").unwrap();
        assert_eq!(users.columns.len(), 2);
        assert_eq!(users.columns[1].data_type, DataType::Text);

        let posts = catalog.relation("users", "posts").unwrap();
        assert_eq!(posts.kind, RelationKind::Many);
        assert_eq!(posts.join.target_columns, vec!["authorId"]);

        // Circular reference resolves by name
        let author = catalog.relation("posts", "author").unwrap();
        assert_eq!(catalog.table(&author.target).unwrap().name, "users");
    }

    #[test]
    fn test_catalog_hidden_properties() {
        let catalog: Catalog = serde_json::from_str(CATALOG_JSON).unwrap();
        let author = catalog.relation("posts", "author").unwrap();
        assert_eq!(
            catalog.hidden_properties(author),
            Some(&["password".to_string()][..])
        );
        let posts = catalog.relation("users", "posts").unwrap();
        assert_eq!(catalog.hidden_properties(posts), None);
    }

    #[test]
    fn test_catalog_unknown_lookups() {
        let catalog = Catalog::new();
        assert!(catalog.table("users").is_none());
        assert!(catalog.relation("users", "posts").is_none());
    }

    #[test]
    fn test_catalog_builder() {
        let catalog = Catalog::new()
            .with_table(TableSchema::new(
                "users",
                vec![Column::new("id", DataType::Integer)],
            ))
            .with_relation(
                "users",
                RelationConfig::new("posts", RelationKind::Many, "posts")
                    .with_join(&["id"], &["authorId"]),
            )
            .with_hidden("posts", &["draft"]);
        let relation = catalog.relation("users", "posts").unwrap();
        assert_eq!(relation.join.source_columns, vec!["id"]);
        assert_eq!(
            catalog.hidden_properties(relation),
            Some(&["draft".to_string()][..])
        );
    }

    #[test]
    fn test_hashmap_hidden_properties() {
        let mut hidden: HashMap<String, Vec<String>> = HashMap::new();
        hidden.insert("author".to_string(), vec!["password".to_string()]);
        let relation = RelationConfig::new("author", RelationKind::One, "users");
        assert_eq!(hidden.hidden_properties(&relation).unwrap().len(), 1);
    }
}
