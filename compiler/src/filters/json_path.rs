//! JSON path addressing
//!
//! Keys such as `metadata.tags[0]` address a value inside a JSON/JSONB
//! column. Segments end up interpolated into a PostgreSQL path literal
//! (`'{"tags","0"}'`), so every segment must be a plain identifier, a
//! kebab-case identifier or an array index.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::error::{FilterError, KeyContext, Stage};
use super::expr::Expr;
use crate::schema::{DataType, ResolvedColumns};

static SEGMENT_RE: OnceLock<Regex> = OnceLock::new();

fn segment_regex() -> &'static Regex {
    SEGMENT_RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_-]*|[0-9]+)$").expect("Invalid regex")
    })
}

/// A key addresses a JSON path when it contains `.` or `[`
pub fn is_json_path(key: &str) -> bool {
    key.contains('.') || key.contains('[')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPath {
    pub column_name: String,
    pub segments: Vec<String>,
    /// Set by `resolve` for `json` (not `jsonb`) columns
    #[serde(skip)]
    plain_json: bool,
}

impl JsonPath {
    /// Split on `.`, `[` and `]`, discarding empty tokens.
    ///
    /// The first token is the column; no validation happens here.
    pub fn parse(key: &str) -> Self {
        let mut tokens = key
            .split(['.', '[', ']'])
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let column_name = tokens.next().unwrap_or_default();
        Self {
            column_name,
            segments: tokens.collect(),
            plain_json: false,
        }
    }

    /// First segment that is not an identifier or array index
    pub fn invalid_segment(&self) -> Option<&str> {
        let re = segment_regex();
        self.segments
            .iter()
            .find(|s| !re.is_match(s))
            .map(String::as_str)
    }

    /// Parse and fully validate `key` against a table's columns.
    ///
    /// Segment syntax is checked before the column is looked up.
    pub(crate) fn resolve(
        key: &str,
        columns: &ResolvedColumns,
        stage: Stage,
    ) -> Result<Self, FilterError> {
        let ctx = KeyContext::new(stage, columns.table(), key);
        let mut path = Self::parse(key);

        if let Some(component) = path.invalid_segment() {
            return Err(FilterError::InvalidJsonPathComponent {
                stage,
                table: ctx.table.to_string(),
                key: key.to_string(),
                component: component.to_string(),
            });
        }

        let column = columns
            .get(&path.column_name)
            .ok_or_else(|| ctx.column_not_found(&path.column_name))?;

        if !column.data_type.is_json() {
            return Err(FilterError::NonJsonColumn {
                stage,
                table: ctx.table.to_string(),
                key: key.to_string(),
                column: column.name.clone(),
            });
        }

        if path.segments.is_empty() {
            return Err(FilterError::EmptyJsonPath {
                stage,
                table: ctx.table.to_string(),
                key: key.to_string(),
            });
        }

        path.plain_json = column.data_type == DataType::Json;

        tracing::trace!(
            table = ctx.table,
            column = %path.column_name,
            segments = ?path.segments,
            "Resolved JSON path"
        );
        Ok(path)
    }

    /// `#>>` extraction; for equality and pattern comparisons
    pub fn text_expr(&self) -> Expr {
        Expr::JsonText {
            column: self.column_name.clone(),
            path: self.segments.clone(),
        }
    }

    /// `#>` extraction; keeps JSONB type ordering for ORDER BY.
    ///
    /// Values from `json` columns are cast to JSONB.
    pub fn native_expr(&self) -> Expr {
        let expr = Expr::JsonNative {
            column: self.column_name.clone(),
            path: self.segments.clone(),
        };
        if self.plain_json { Expr::jsonb(expr) } else { expr }
    }

    /// Text extraction behind a numeric guard
    pub fn numeric_expr(&self) -> Expr {
        Expr::safe_numeric(self.text_expr())
    }
}
