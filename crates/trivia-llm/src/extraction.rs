//! Isolating a JSON object from free-form model output.
//!
//! The slice is deliberately naive: everything from the first `{` to the last
//! `}`. Output holding two objects, or braces inside string values outside the
//! envelope, yields the widest span and usually fails to parse.

use serde_json::Value;
use trivia_common::RelayError;

const FENCE_JSON: &str = "```json";
const FENCE: &str = "```";

/// Strip code fences, trim, and cut to the first-`{`..last-`}` span when one exists.
pub fn isolate_json(raw: &str) -> String {
    let text = raw.replace(FENCE_JSON, "").replace(FENCE, "");
    let text = text.trim();

    match (text.find('{'), text.rfind('}')) {
        (Some(first), Some(last)) if first < last => text[first..=last].to_string(),
        _ => text.to_string(),
    }
}

/// Parse the isolated span as JSON.
pub fn extract_json(raw: &str) -> Result<Value, RelayError> {
    let candidate = isolate_json(raw);
    serde_json::from_str(&candidate).map_err(|e| {
        tracing::debug!(error = %e, len = candidate.len(), "Extracted text is not JSON");
        RelayError::MalformedJson
    })
}
