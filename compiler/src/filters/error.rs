//! Compiler error types
//!
//! Every failure is fail-fast and names the compiler stage, the table and the
//! offending key so the calling layer can surface it without extra context.

use std::fmt;

use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

/// Compiler stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Schema,
    Where,
    Order,
    Fields,
    Include,
    Update,
    Parse,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Where => "where",
            Self::Order => "order",
            Self::Fields => "fields",
            Self::Include => "include",
            Self::Update => "update",
            Self::Parse => "parse",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("{stage}: column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        stage: Stage,
        table: String,
        column: String,
    },

    #[error("schema: table '{table}' declares no columns")]
    SchemaEmpty { table: String },

    #[error("{stage}: invalid operator '{operator}' on key '{key}' in table '{table}'")]
    InvalidOperator {
        stage: Stage,
        table: String,
        key: String,
        operator: String,
    },

    #[error(
        "{stage}: operator '{operator}' on key '{key}' in table '{table}' expects {expected} operands, got {actual}"
    )]
    InvalidOperatorArity {
        stage: Stage,
        table: String,
        key: String,
        operator: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "{stage}: invalid operand for operator '{operator}' on key '{key}' in table '{table}': {reason}"
    )]
    InvalidOperand {
        stage: Stage,
        table: String,
        key: String,
        operator: String,
        reason: String,
    },

    #[error("{stage}: invalid JSON path component '{component}' in key '{key}' for table '{table}'")]
    InvalidJsonPathComponent {
        stage: Stage,
        table: String,
        key: String,
        component: String,
    },

    #[error("{stage}: column '{column}' in table '{table}' is not a JSON column (key '{key}')")]
    NonJsonColumn {
        stage: Stage,
        table: String,
        key: String,
        column: String,
    },

    #[error("{stage}: JSON path '{key}' in table '{table}' has no components")]
    EmptyJsonPath {
        stage: Stage,
        table: String,
        key: String,
    },

    #[error("order: invalid direction '{direction}' for '{key}' in table '{table}' (expected ASC or DESC)")]
    InvalidDirection {
        table: String,
        key: String,
        direction: String,
    },

    #[error("include: relation '{relation}' not found on table '{table}'")]
    RelationNotFound { table: String, relation: String },

    #[error("include: invalid inclusion on table '{table}': {reason}")]
    InvalidIncludeFormat { table: String, reason: String },

    #[error("include: relation '{relation}' on table '{table}' exceeds maximum inclusion depth {max}")]
    InclusionTooDeep {
        table: String,
        relation: String,
        max: usize,
    },

    #[error("where: invalid clause for key '{key}' in table '{table}': {reason}")]
    InvalidWhereClause {
        table: String,
        key: String,
        reason: String,
    },

    #[error("fields: invalid projection for table '{table}': {reason}")]
    InvalidFields { table: String, reason: String },

    #[error("update: column '{column}' in table '{table}' is assigned both directly and by JSON path")]
    ConflictingUpdate { table: String, column: String },

    #[error("parse: invalid filter JSON: {0}")]
    InvalidFilterJson(String),

    #[error("parse: filter JSON exceeds maximum size of {max} bytes")]
    FilterTooLarge { max: usize },
}

/// Serializable error payload for HTTP layers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message_code: &'static str,
    pub message: String,
    pub payload: JsonValue,
}

impl FilterError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            Self::SchemaEmpty { .. } => "SCHEMA_EMPTY",
            Self::InvalidOperator { .. } => "INVALID_OPERATOR",
            Self::InvalidOperatorArity { .. } => "INVALID_OPERATOR_ARITY",
            Self::InvalidOperand { .. } => "INVALID_OPERAND",
            Self::InvalidJsonPathComponent { .. } => "INVALID_JSON_PATH_COMPONENT",
            Self::NonJsonColumn { .. } => "NON_JSON_COLUMN",
            Self::EmptyJsonPath { .. } => "EMPTY_JSON_PATH",
            Self::InvalidDirection { .. } => "INVALID_DIRECTION",
            Self::RelationNotFound { .. } => "RELATION_NOT_FOUND",
            Self::InvalidIncludeFormat { .. } => "INVALID_INCLUDE_FORMAT",
            Self::InclusionTooDeep { .. } => "INCLUSION_TOO_DEEP",
            Self::InvalidWhereClause { .. } => "INVALID_WHERE_CLAUSE",
            Self::InvalidFields { .. } => "INVALID_FIELDS",
            Self::ConflictingUpdate { .. } => "CONFLICTING_UPDATE",
            Self::InvalidFilterJson(_) => "INVALID_FILTER_JSON",
            Self::FilterTooLarge { .. } => "FILTER_JSON_TOO_LARGE",
        }
    }

    /// HTTP status an API layer should answer with.
    ///
    /// An empty schema is a server-side declaration defect; everything else
    /// is caused by the caller's payload.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaEmpty { .. } => 500,
            _ => 400,
        }
    }

    /// Stage that raised the error
    pub fn stage(&self) -> Stage {
        match self {
            Self::ColumnNotFound { stage, .. }
            | Self::InvalidOperator { stage, .. }
            | Self::InvalidOperatorArity { stage, .. }
            | Self::InvalidOperand { stage, .. }
            | Self::InvalidJsonPathComponent { stage, .. }
            | Self::NonJsonColumn { stage, .. }
            | Self::EmptyJsonPath { stage, .. } => *stage,
            Self::SchemaEmpty { .. } => Stage::Schema,
            Self::InvalidDirection { .. } => Stage::Order,
            Self::RelationNotFound { .. }
            | Self::InvalidIncludeFormat { .. }
            | Self::InclusionTooDeep { .. } => Stage::Include,
            Self::InvalidWhereClause { .. } => Stage::Where,
            Self::InvalidFields { .. } => Stage::Fields,
            Self::ConflictingUpdate { .. } => Stage::Update,
            Self::InvalidFilterJson(_) | Self::FilterTooLarge { .. } => Stage::Parse,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status_code: self.status_code(),
            message_code: self.code(),
            message: self.to_string(),
            payload: json!({ "stage": self.stage() }),
        }
    }
}

/// Names the stage and table for errors raised while compiling one key
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyContext<'a> {
    pub stage: Stage,
    pub table: &'a str,
    pub key: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(stage: Stage, table: &'a str, key: &'a str) -> Self {
        Self { stage, table, key }
    }

    pub fn column_not_found(&self, column: &str) -> FilterError {
        FilterError::ColumnNotFound {
            stage: self.stage,
            table: self.table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn invalid_operator(&self, operator: &str) -> FilterError {
        FilterError::InvalidOperator {
            stage: self.stage,
            table: self.table.to_string(),
            key: self.key.to_string(),
            operator: operator.to_string(),
        }
    }

    pub fn invalid_operand(&self, operator: &str, reason: impl Into<String>) -> FilterError {
        FilterError::InvalidOperand {
            stage: self.stage,
            table: self.table.to_string(),
            key: self.key.to_string(),
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }
}
