//! Decoding analysis responses.
//!
//! The service answers with a JSON array of results, sometimes wrapped in a
//! markdown code fence. Only the first entry is used.

use serde_json::Value;

use super::types::{AnalysisError, CalculationResult};

/// Parse a response body into the first [`CalculationResult`].
///
/// # Errors
///
/// Returns [`AnalysisError::Parse`] if the body is not JSON, not a non-empty
/// array, or its first entry lacks `expr`/`result`.
pub fn parse_response(body: &str) -> Result<CalculationResult, AnalysisError> {
    let json = unwrap_fence(body);
    let value: Value = serde_json::from_str(json).map_err(|e| AnalysisError::Parse(e.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(AnalysisError::Parse("response is not an array".into()));
    };
    let Some(first) = entries.first() else {
        return Err(AnalysisError::Parse("response array is empty".into()));
    };

    let expression = scalar_field(first, "expr")?;
    let answer = scalar_field(first, "result")?;
    let assign = first.get("assign").and_then(Value::as_bool).unwrap_or(false);
    let steps = match first.get("steps") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    };
    Ok(CalculationResult { expression, answer, assign, steps })
}

/// Extract the `{error}` message from a failure body, if it has one.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    value.get("error").and_then(scalar_text)
}

/// Strip a surrounding markdown fence such as ```` ```json ... ``` ````.
fn unwrap_fence(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // The info string ("json") may share its line with the payload.
    let info_len = rest.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(rest.len());
    let rest = &rest[info_len..];
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn scalar_field(entry: &Value, key: &str) -> Result<String, AnalysisError> {
    entry
        .get(key)
        .and_then(scalar_text)
        .ok_or_else(|| AnalysisError::Parse(format!("missing or invalid `{key}`")))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
