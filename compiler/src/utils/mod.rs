//! Shared helpers for SQL text and JSON values

pub mod json;
pub mod sql;
