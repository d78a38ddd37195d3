//! Field projection
//!
//! Include-only: an array lists the columns to select, a map keeps the
//! entries whose value is `true`. `false` entries do not exclude anything.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use super::error::FilterError;

pub fn compile_fields(table: &str, fields: &JsonValue) -> Result<BTreeMap<String, bool>, FilterError> {
    let invalid = |reason: &str| FilterError::InvalidFields {
        table: table.to_string(),
        reason: reason.to_string(),
    };

    let mut projection = BTreeMap::new();
    match fields {
        JsonValue::Array(names) => {
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| invalid("field names must be strings"))?;
                projection.insert(name.to_string(), true);
            }
        }
        JsonValue::Object(entries) => {
            for (name, flag) in entries {
                match flag {
                    JsonValue::Bool(true) => {
                        projection.insert(name.clone(), true);
                    }
                    other => {
                        tracing::warn!(
                            table,
                            field = %name,
                            value = %other,
                            "Non-true field projection entry ignored"
                        );
                    }
                }
            }
        }
        _ => return Err(invalid("expected an array of names or a name to boolean map")),
    }

    Ok(projection)
}
