//! JSON utility functions

use serde_json::Value as JsonValue;

/// Render a JSON scalar as the text PostgreSQL's `#>>` would return for it.
///
/// Returns `None` for null, arrays and objects.
pub fn scalar_to_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// True for strings, numbers and booleans
pub fn is_scalar(value: &JsonValue) -> bool {
    matches!(
        value,
        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_)
    )
}

/// Serialize a value to its JSON text form.
///
/// `null` becomes the JSON literal `null`, never an SQL NULL.
pub fn to_json_text(value: &JsonValue) -> String {
    // Serializing a `Value` cannot fail: keys are always strings.
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
