//! Backend-agnostic predicate and expression trees
//!
//! These are the compiler's output. Rendering to SQL text lives in
//! `crate::sql`.

use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::schema::{Column, DataType};

/// A value-producing expression over one column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Plain column reference
    Column { name: String },
    /// JSON value at `path` extracted as text (`#>>`)
    JsonText { column: String, path: Vec<String> },
    /// JSON value at `path` in its native JSON type (`#>`)
    JsonNative { column: String, path: Vec<String> },
    /// Numeric cast of a text expression that yields NULL for non-numeric text
    SafeNumeric { inner: Box<Expr> },
    /// JSONB cast; plain `json` values have no ordering or equality operators
    Jsonb { inner: Box<Expr> },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column { name: name.into() }
    }

    pub fn safe_numeric(inner: Expr) -> Self {
        Self::SafeNumeric {
            inner: Box::new(inner),
        }
    }

    pub fn jsonb(inner: Expr) -> Self {
        Self::Jsonb {
            inner: Box::new(inner),
        }
    }

    /// Column reference usable for ordering and JSON equality
    pub fn comparable_column(column: &Column) -> Self {
        let expr = Self::column(&column.name);
        if column.data_type == DataType::Json {
            Self::jsonb(expr)
        } else {
            expr
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// Boolean predicate tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    Compare {
        expr: Expr,
        op: CompareOp,
        value: JsonValue,
    },
    IsNull {
        expr: Expr,
    },
    IsNotNull {
        expr: Expr,
    },
    InList {
        expr: Expr,
        values: Vec<JsonValue>,
        negated: bool,
    },
    Between {
        expr: Expr,
        low: JsonValue,
        high: JsonValue,
    },
    Like {
        expr: Expr,
        pattern: String,
        case_insensitive: bool,
        negated: bool,
    },
    Regex {
        expr: Expr,
        pattern: String,
        case_insensitive: bool,
    },
    And {
        terms: Vec<Predicate>,
    },
    Or {
        terms: Vec<Predicate>,
    },
    /// Always true / always false
    Constant {
        value: bool,
    },
}

impl Predicate {
    /// Combine with AND: zero terms is "no predicate", one term is returned unwrapped
    pub fn all(mut terms: Vec<Predicate>) -> Option<Predicate> {
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(Self::And { terms }),
        }
    }

    /// Combine with OR, same unwrapping rules as [`Predicate::all`]
    pub fn any(mut terms: Vec<Predicate>) -> Option<Predicate> {
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(Self::Or { terms }),
        }
    }

    /// Nesting depth of AND/OR groups (a leaf is depth 0)
    pub fn depth(&self) -> usize {
        match self {
            Self::And { terms } | Self::Or { terms } => {
                1 + terms.iter().map(Predicate::depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Case-insensitive `ASC` / `DESC`
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderExpr {
    pub expr: Expr,
    pub direction: Direction,
}
