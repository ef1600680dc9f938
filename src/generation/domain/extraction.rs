//! Output reference extraction from heterogeneous status payloads.

use super::OutputReference;
use serde_json::Value;

const TOP_LEVEL_KEYS: [&str; 3] = ["resultImageUrl", "imageUrl", "url"];
const NESTED_KEYS: [&str; 2] = ["resultImageUrl", "url"];

/// Finds the output reference in a successful status payload.
///
/// Lookup order:
///
/// 1. top-level `resultImageUrl`, `imageUrl`, `url`;
/// 2. the nested `response` object, parsed from a JSON string when the
///    service sends it encoded: `resultImageUrl`, `url`, then the first entry
///    of `images`.
///
/// Empty strings and non-string values never match. Returns `None` when no
/// candidate is found.
#[must_use]
pub fn extract_output_reference(data: &Value) -> Option<OutputReference> {
    if let Some(found) = first_string(data, &TOP_LEVEL_KEYS) {
        return Some(found);
    }

    let response = nested_response(data.get("response")?)?;
    first_string(&response, &NESTED_KEYS).or_else(|| {
        response
            .get("images")
            .and_then(Value::as_array)
            .and_then(|images| images.first())
            .and_then(string_reference)
    })
}

fn nested_response(value: &Value) -> Option<Value> {
    match value {
        Value::Object(_) => Some(value.clone()),
        Value::String(encoded) => serde_json::from_str::<Value>(encoded)
            .ok()
            .filter(Value::is_object),
        _ => None,
    }
}

fn first_string(object: &Value, keys: &[&str]) -> Option<OutputReference> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(string_reference))
}

fn string_reference(value: &Value) -> Option<OutputReference> {
    value.as_str().and_then(OutputReference::new)
}
