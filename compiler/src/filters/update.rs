//! Update payload compilation
//!
//! Flat keys become direct column assignments. JSON path keys are grouped
//! per column and folded into one nested `jsonb_set` expression so sibling
//! keys inside the document survive the update.
//!
//! `jsonb_set` only creates the last element of a path. For deeper paths each
//! missing parent is first set to an empty container (an array when the next
//! segment is an index), reading the document through a single bound alias
//! so the expression grows linearly with the number of updates.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use super::error::{FilterError, KeyContext, Stage};
use super::json_path::{JsonPath, is_json_path};
use crate::schema::{DataType, ResolvedColumns};
use crate::sql::SqlDialect;

/// Alias the current document is bound to while parents are created
const MERGE_DOCUMENT: &str = "doc";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompileResult {
    /// Direct assignments, in payload order
    pub flat_fields: Map<String, JsonValue>,
    /// Column → merge expression
    pub merge_expressions_by_column: BTreeMap<String, String>,
}

impl UpdateCompileResult {
    pub fn is_empty(&self) -> bool {
        self.flat_fields.is_empty() && self.merge_expressions_by_column.is_empty()
    }
}

pub fn compile_update(
    columns: &ResolvedColumns,
    payload: &Map<String, JsonValue>,
    dialect: &dyn SqlDialect,
) -> Result<UpdateCompileResult, FilterError> {
    let mut flat_fields = Map::new();
    // Columns in first-appearance order with their updates in payload order
    let mut grouped: Vec<(String, Vec<(JsonPath, &JsonValue)>)> = Vec::new();

    for (key, value) in payload {
        if is_json_path(key) {
            let path = JsonPath::resolve(key, columns, Stage::Update)?;
            match grouped.iter_mut().find(|(column, _)| *column == path.column_name) {
                Some((_, updates)) => updates.push((path, value)),
                None => grouped.push((path.column_name.clone(), vec![(path, value)])),
            }
        } else {
            if !columns.contains(key) {
                return Err(KeyContext::new(Stage::Update, columns.table(), key).column_not_found(key));
            }
            flat_fields.insert(key.clone(), value.clone());
        }
    }

    let mut merge_expressions_by_column = BTreeMap::new();
    for (column, updates) in grouped {
        if flat_fields.contains_key(&column) {
            return Err(FilterError::ConflictingUpdate {
                table: columns.table().to_string(),
                column,
            });
        }

        let quoted = dialect.quote_identifier(&column);
        let is_plain_json = columns
            .get(&column)
            .is_some_and(|c| c.data_type == DataType::Json);
        let base = if is_plain_json {
            dialect.json_or_empty(&dialect.cast_to_json(&quoted))
        } else {
            dialect.json_or_empty(&quoted)
        };

        let merged = updates.iter().fold(base, |current, (path, value)| {
            set_with_parents(dialect, &current, &path.segments, value)
        });
        let expr = if is_plain_json {
            format!("({})::json", merged)
        } else {
            merged
        };

        tracing::trace!(
            table = columns.table(),
            column = %column,
            updates = updates.len(),
            "Compiled JSON merge expression"
        );
        merge_expressions_by_column.insert(column, expr);
    }

    Ok(UpdateCompileResult {
        flat_fields,
        merge_expressions_by_column,
    })
}

fn set_with_parents(
    dialect: &dyn SqlDialect,
    current: &str,
    segments: &[String],
    value: &JsonValue,
) -> String {
    if segments.len() < 2 {
        return dialect.json_set(current, segments, value);
    }

    let document = dialect.quote_identifier(MERGE_DOCUMENT);
    let mut target = document.clone();
    for depth in 1..segments.len() {
        let prefix = &segments[..depth];
        let empty = if is_index(&segments[depth]) { json!([]) } else { json!({}) };
        let existing = dialect.json_coalesce(&dialect.json_extract(&document, prefix), &empty);
        target = dialect.json_set_expr(&target, prefix, &existing);
    }

    let body = dialect.json_set(&target, segments, value);
    dialect.json_bind(current, MERGE_DOCUMENT, &body)
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
