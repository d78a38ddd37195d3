//! Rendering of compiled filters to parameterized SQL

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::SqlDialect;
use crate::filters::{Expr, FilterError, OrderExpr, Predicate, QueryOptions, UpdateCompileResult};
use crate::schema::ResolvedColumns;

/// Bind values collected while rendering, in placeholder order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SqlParams {
    pub values: Vec<JsonValue>,
}

impl SqlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value and return its 1-based placeholder index
    pub fn push(&mut self, value: JsonValue) -> usize {
        self.values.push(value);
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bind `value` and return its placeholder. Structured values are cast to JSON.
    fn bind(&mut self, value: &JsonValue, dialect: &dyn SqlDialect) -> String {
        let placeholder = dialect.placeholder(self.push(value.clone()));
        if value.is_object() || value.is_array() {
            dialect.cast_to_json(&placeholder)
        } else {
            placeholder
        }
    }
}

impl Expr {
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        match self {
            Self::Column { name } => dialect.quote_identifier(name),
            Self::JsonText { column, path } => {
                dialect.json_extract_text(&dialect.quote_identifier(column), path)
            }
            Self::JsonNative { column, path } => {
                dialect.json_extract(&dialect.quote_identifier(column), path)
            }
            Self::SafeNumeric { inner } => dialect.safe_numeric(&inner.to_sql(dialect)),
            Self::Jsonb { inner } => dialect.cast_to_json(&inner.to_sql(dialect)),
        }
    }
}

impl Predicate {
    /// Render as a boolean SQL expression, appending bind values to `params`
    pub fn to_sql(&self, params: &mut SqlParams, dialect: &dyn SqlDialect) -> String {
        match self {
            Self::Compare { expr, op, value } => {
                let lhs = expr.to_sql(dialect);
                format!("{} {} {}", lhs, op.as_sql(), params.bind(value, dialect))
            }
            Self::IsNull { expr } => format!("{} IS NULL", expr.to_sql(dialect)),
            Self::IsNotNull { expr } => format!("{} IS NOT NULL", expr.to_sql(dialect)),
            Self::InList {
                expr,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return constant(*negated).to_string();
                }
                let lhs = expr.to_sql(dialect);
                let list: Vec<String> = values.iter().map(|v| params.bind(v, dialect)).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", lhs, keyword, list.join(", "))
            }
            Self::Between { expr, low, high } => {
                let lhs = expr.to_sql(dialect);
                let low = params.bind(low, dialect);
                let high = params.bind(high, dialect);
                format!("{} BETWEEN {} AND {}", lhs, low, high)
            }
            Self::Like {
                expr,
                pattern,
                case_insensitive,
                negated,
            } => {
                let lhs = expr.to_sql(dialect);
                let pattern = params.bind(&JsonValue::String(pattern.clone()), dialect);
                let op = dialect.like_operator(*case_insensitive, *negated);
                format!("{} {} {}", lhs, op, pattern)
            }
            Self::Regex {
                expr,
                pattern,
                case_insensitive,
            } => {
                let lhs = expr.to_sql(dialect);
                let pattern = params.bind(&JsonValue::String(pattern.clone()), dialect);
                format!("{} {} {}", lhs, dialect.regex_operator(*case_insensitive), pattern)
            }
            Self::And { terms } => join_terms(terms, "AND", true, params, dialect),
            Self::Or { terms } => join_terms(terms, "OR", false, params, dialect),
            Self::Constant { value } => constant(*value).to_string(),
        }
    }
}

fn join_terms(
    terms: &[Predicate],
    keyword: &str,
    empty: bool,
    params: &mut SqlParams,
    dialect: &dyn SqlDialect,
) -> String {
    if terms.is_empty() {
        return constant(empty).to_string();
    }
    let rendered: Vec<String> = terms.iter().map(|t| t.to_sql(params, dialect)).collect();
    format!("({})", rendered.join(&format!(" {} ", keyword)))
}

fn constant(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

impl OrderExpr {
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        format!("{} {}", self.expr.to_sql(dialect), self.direction.as_sql())
    }
}

impl UpdateCompileResult {
    /// Render `SET` assignments: flat fields as bind parameters, then merge expressions
    pub fn to_set_clause(&self, params: &mut SqlParams, dialect: &dyn SqlDialect) -> String {
        let flat = self.flat_fields.iter().map(|(name, value)| {
            format!("{} = {}", dialect.quote_identifier(name), params.bind(value, dialect))
        });
        let mut assignments: Vec<String> = flat.collect();
        assignments.extend(
            self.merge_expressions_by_column
                .iter()
                .map(|(column, expr)| format!("{} = {}", dialect.quote_identifier(column), expr)),
        );
        assignments.join(", ")
    }
}

/// Render a single-table `SELECT` for compiled options.
///
/// Relation inclusions are resolved by the execution layer with separate
/// queries and are not part of the statement. A projection that names no
/// known column is an error; only an absent projection selects `*`.
pub fn render_select(
    columns: &ResolvedColumns,
    options: &QueryOptions,
    dialect: &dyn SqlDialect,
) -> Result<(String, SqlParams), FilterError> {
    let mut params = SqlParams::new();

    let select_list = match &options.columns {
        Some(projection) => {
            let selected: Vec<String> = columns
                .iter()
                .filter(|c| projection.get(&c.name).copied().unwrap_or(false))
                .map(|c| dialect.quote_identifier(&c.name))
                .collect();
            if selected.is_empty() {
                return Err(FilterError::InvalidFields {
                    table: columns.table().to_string(),
                    reason: "projection selects no known columns".to_string(),
                });
            }
            selected.join(", ")
        }
        None => "*".to_string(),
    };

    let mut sql = format!(
        "SELECT {} FROM {}",
        select_list,
        dialect.quote_identifier(columns.table())
    );

    if let Some(predicate) = &options.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(&predicate.to_sql(&mut params, dialect));
    }

    if let Some(order_by) = options.order_by.as_ref().filter(|o| !o.is_empty()) {
        let order: Vec<String> = order_by.iter().map(|o| o.to_sql(dialect)).collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
    }

    let limit_offset = dialect.limit_offset(options.limit, options.offset);
    if !limit_offset.is_empty() {
        sql.push(' ');
        sql.push_str(&limit_offset);
    }

    if let Some(with) = &options.with {
        tracing::debug!(
            table = columns.table(),
            relations = ?with.keys().collect::<Vec<_>>(),
            "Relation inclusions left to the execution layer"
        );
    }

    Ok((sql, params))
}
