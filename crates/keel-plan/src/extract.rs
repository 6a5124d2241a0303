//! Extraction of the raw step array from model output
//!
//! Model replies often wrap the JSON in markdown fences or surround it with
//! prose. Extraction removes the fences, then accepts either a payload that
//! is entirely a JSON array or the single bracketed span inside it.

use crate::error::PlanError;
use serde_json::Value;

/// Strip surrounding whitespace and one pair of markdown fence markers
#[must_use]
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // drop the language tag on the opening line
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Extract the array of raw step records
///
/// # Errors
/// `PlanError::Parse` when no array is present, when the payload is JSON
/// but not an array, or when the bracketed span is not one valid array.
pub fn extract_array(raw: &str) -> Result<Vec<Value>, PlanError> {
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(PlanError::parse("empty model output"));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => return Ok(items),
        Ok(other) => {
            return Err(PlanError::parse(format!(
                "expected JSON array, found {}",
                json_kind(&other)
            )))
        }
        Err(_) => {}
    }

    let span = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => return Err(PlanError::parse("no JSON array found in model output")),
    };

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(PlanError::parse(format!(
            "expected JSON array, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(PlanError::parse(format!("invalid JSON array: {e}"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
