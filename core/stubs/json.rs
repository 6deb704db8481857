//! Stubs for JSON documents.

use log;
use serde_json::Value;

/// Strings longer than this many characters are cut and suffixed with `...`.
pub const JSON_TRUNCATE_LENGTH: usize = 400;

fn truncate_values(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, truncate_values(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(truncate_values).collect()),
        Value::String(s) if s.chars().count() > JSON_TRUNCATE_LENGTH => {
            let mut cut: String = s.chars().take(JSON_TRUNCATE_LENGTH).collect();
            cut.push_str("...");
            Value::String(cut)
        }
        other => other,
    }
}

fn pretty(value: &Value) -> Option<String> {
    match serde_json::to_string_pretty(value) {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("JSON serialization failed ({}), returning raw content.", e);
            None
        }
    }
}

pub fn stub(content: &str) -> String {
    let data: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("JSON parse failed ({}), returning raw content.", e);
            return content.to_string();
        }
    };

    match data {
        Value::Array(items) if items.len() > 1 => {
            let remaining = items.len() - 1;
            let Some(first) = items.into_iter().next() else {
                return content.to_string();
            };
            let Some(rendered) = pretty(&Value::Array(vec![truncate_values(first)])) else {
                return content.to_string();
            };
            // Pretty output of a non-empty array always ends with "\n]".
            let body = rendered.strip_suffix("\n]").unwrap_or(&rendered);
            format!("{},\n  // ... and {} more items\n]", body, remaining)
        }
        other => pretty(&truncate_values(other)).unwrap_or_else(|| content.to_string()),
    }
}
