//! Filter and update payload parsing

use serde_json::{Map, Value as JsonValue};

use super::error::FilterError;
use super::types::Filter;
use crate::core::CompilerConfig;

/// Parse a filter from JSON text.
///
/// Accepts a filter object, `null` (empty filter), or a JSON string that
/// itself contains a filter object, as sent in `?filter=` query strings.
pub fn parse_filter(json: &str, config: &CompilerConfig) -> Result<Filter, FilterError> {
    let value = parse_bounded(json, config)?;
    let value = match value {
        JsonValue::String(inner) => parse_bounded(&inner, config)?,
        other => other,
    };

    match value {
        JsonValue::Null => Ok(Filter::default()),
        JsonValue::Object(_) => {
            serde_json::from_value(value).map_err(|e| FilterError::InvalidFilterJson(e.to_string()))
        }
        other => Err(FilterError::InvalidFilterJson(format!(
            "expected a filter object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Parse an update payload; must be a JSON object
pub fn parse_update_payload(
    json: &str,
    config: &CompilerConfig,
) -> Result<Map<String, JsonValue>, FilterError> {
    match parse_bounded(json, config)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(FilterError::InvalidFilterJson(format!(
            "expected an update object, got {}",
            json_kind(&other)
        ))),
    }
}

fn parse_bounded(json: &str, config: &CompilerConfig) -> Result<JsonValue, FilterError> {
    if json.len() > config.max_filter_json_bytes {
        tracing::warn!(
            size = json.len(),
            max = config.max_filter_json_bytes,
            "Filter JSON exceeds size limit"
        );
        return Err(FilterError::FilterTooLarge {
            max: config.max_filter_json_bytes,
        });
    }
    serde_json::from_str(json).map_err(|e| FilterError::InvalidFilterJson(e.to_string()))
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
