//! SQL dialect trait
//!
//! Defines the database-specific syntax the renderer and the update
//! compiler rely on.

use serde_json::Value as JsonValue;

use crate::utils::sql::quote_identifier;

/// SQL dialect trait for generating database-specific SQL
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    fn placeholder(&self, index: usize) -> String;

    /// Quote a column or table name
    fn quote_identifier(&self, ident: &str) -> String {
        quote_identifier(ident)
    }

    /// Path literal for JSON path operators, e.g. `'{"tags","0"}'`
    fn json_path_literal(&self, path: &[String]) -> String;

    /// Extract the value at `path` as text
    fn json_extract_text(&self, col: &str, path: &[String]) -> String;

    /// Extract the value at `path` keeping its JSON type
    fn json_extract(&self, col: &str, path: &[String]) -> String;

    /// Cast text to numeric only when it looks like a signed decimal, else NULL
    fn safe_numeric(&self, text_expr: &str) -> String;

    /// Cast an expression to the JSON type used for comparisons and merges
    fn cast_to_json(&self, expr: &str) -> String;

    /// Inline JSON literal with string-literal escaping applied
    fn json_literal(&self, value: &JsonValue) -> String;

    /// `expr`, or `fallback` when `expr` is NULL
    fn json_coalesce(&self, expr: &str, fallback: &JsonValue) -> String {
        format!("COALESCE({}, {})", expr, self.json_literal(fallback))
    }

    /// `expr`, or an empty JSON object when `expr` is NULL
    fn json_or_empty(&self, expr: &str) -> String {
        self.json_coalesce(expr, &JsonValue::Object(Default::default()))
    }

    /// Set the SQL expression `value` at `path` inside `target`, creating the
    /// last key when missing
    fn json_set_expr(&self, target: &str, path: &[String], value: &str) -> String;

    /// Set `value` at `path` inside `target`, creating the last key when missing
    fn json_set(&self, target: &str, path: &[String], value: &JsonValue) -> String {
        self.json_set_expr(target, path, &self.json_literal(value))
    }

    /// Evaluate `body` with `value` bound once to the column `alias`
    fn json_bind(&self, value: &str, alias: &str, body: &str) -> String;

    /// Pattern matching operator (`LIKE`, `NOT ILIKE`, ...)
    fn like_operator(&self, case_insensitive: bool, negated: bool) -> &'static str;

    /// Regular expression match operator
    fn regex_operator(&self, case_insensitive: bool) -> &'static str;

    /// Generate LIMIT/OFFSET clause; empty when neither is set
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
