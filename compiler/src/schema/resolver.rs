//! Column resolution with a process-wide cache
//!
//! Schemas are declared once at startup and live for the whole process, so
//! the cache is keyed by table name and never evicts. Population is
//! idempotent: two threads racing on the same miss compute equal maps and the
//! first insert wins.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;

use super::column::{Column, TableSchema};
use crate::filters::FilterError;

static SHARED: LazyLock<Arc<ColumnResolver>> = LazyLock::new(|| Arc::new(ColumnResolver::new()));

/// Column set of one table, in declaration order with O(1) name lookup
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedColumns {
    table: String,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl ResolvedColumns {
    fn from_schema(schema: &TableSchema) -> Result<Self, FilterError> {
        let mut columns = Vec::with_capacity(schema.columns.len());
        let mut index = HashMap::with_capacity(schema.columns.len());
        for column in &schema.columns {
            // First declaration wins on duplicate names
            if index.contains_key(&column.name) {
                tracing::warn!(
                    table = %schema.name,
                    column = %column.name,
                    "Duplicate column declaration ignored"
                );
                continue;
            }
            index.insert(column.name.clone(), columns.len());
            columns.push(column.clone());
        }

        if columns.is_empty() {
            return Err(FilterError::SchemaEmpty {
                table: schema.name.clone(),
            });
        }

        Ok(Self {
            table: schema.name.clone(),
            columns,
            index,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Columns in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Resolves and memoizes table column sets
#[derive(Debug, Default)]
pub struct ColumnResolver {
    cache: DashMap<String, Arc<ResolvedColumns>>,
}

impl ColumnResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide resolver shared by every compiler that does not bring its own
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Resolve a schema's columns, computing them on first use.
    ///
    /// Repeated calls for the same table return the same `Arc`.
    pub fn resolve(&self, schema: &TableSchema) -> Result<Arc<ResolvedColumns>, FilterError> {
        if let Some(hit) = self.cache.get(&schema.name) {
            return Ok(Arc::clone(hit.value()));
        }

        let resolved = ResolvedColumns::from_schema(schema)?;
        tracing::debug!(
            table = %schema.name,
            columns = resolved.len(),
            "Resolved table columns"
        );

        let entry = self
            .cache
            .entry(schema.name.clone())
            .or_insert_with(|| Arc::new(resolved));
        Ok(Arc::clone(entry.value()))
    }

    /// Number of cached tables
    pub fn cached_tables(&self) -> usize {
        self.cache.len()
    }
}
