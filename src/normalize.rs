//! Response normalization.
//!
//! Executors hand back whatever shape their underlying agent produced:
//! a plain string, a `{"output": ...}` mapping, a list of content blocks
//! (`[{"type": "text", "text": ...}]`), or a string holding one of those
//! serialized. Everything is reduced to a plain string. Nothing here fails;
//! anything unrecognized falls back to its string form.

use serde_json::Value;

/// Reduce an executor response to plain text.
pub fn normalize_response(value: &Value) -> String {
    match value {
        Value::String(text) => normalize_text(text),
        Value::Object(map) => match map.get("output") {
            Some(output) => normalize_response(output),
            None => value.to_string(),
        },
        Value::Array(items) => match items.first() {
            Some(Value::Object(block)) => match block.get("text").or_else(|| block.get("content")) {
                Some(inner) => normalize_response(inner),
                None => items[0].to_string(),
            },
            Some(first) => normalize_response(first),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// A string may itself be a serialized list or mapping. Unwrap it when it
/// parses and carries text; otherwise return it untouched.
fn normalize_text(text: &str) -> String {
    let trimmed = text.trim();
    if !looks_structured(trimmed) {
        return text.to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(parsed) => match extract_text(&parsed) {
            Some(inner) => normalize_response(inner),
            None => text.to_string(),
        },
        Err(_) => text.to_string(),
    }
}

fn looks_structured(s: &str) -> bool {
    (s.starts_with('[') && s.ends_with(']')) || (s.starts_with('{') && s.ends_with('}'))
}

/// The text-bearing field of a parsed response, if there is one.
fn extract_text(parsed: &Value) -> Option<&Value> {
    match parsed {
        Value::Array(items) => items.first()?.as_object()?.get("text"),
        Value::Object(map) => map.get("output").or_else(|| map.get("text")),
        _ => None,
    }
}
