//! Best-effort extraction of values from free-text model output.
//!
//! Model output is untrusted text that usually, but not always, embeds a JSON
//! object. The heuristic takes the greedy span from the first `{` to the last
//! `}` and parses it; anything that goes wrong yields a typed default instead
//! of an error.
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Requested type of an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Text,
}

/// An extracted value, or the default for its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Number(i64),
    Text(String),
}

impl Extracted {
    fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Numeric => Extracted::Number(0),
            ValueKind::Text => Extracted::Text(String::new()),
        }
    }
}

fn payload_regex() -> &'static Regex {
    static PAYLOAD: OnceLock<Regex> = OnceLock::new();
    PAYLOAD.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("payload regex is valid"))
}

/// Extract `key` from the structured payload embedded in `text`.
///
/// Returns `0` / empty string when there is no payload, the payload does not
/// parse, or the key is absent or null. Numeric values given as floats or as
/// numeric-looking strings are truncated toward zero.
pub fn extract(text: &str, key: &str, kind: ValueKind) -> Extracted {
    let Some(value) = payload_value(text, key) else {
        return Extracted::default_for(kind);
    };
    match kind {
        ValueKind::Numeric => Extracted::Number(coerce_integer(&value).unwrap_or(0)),
        ValueKind::Text => Extracted::Text(coerce_text(value)),
    }
}

/// Extract an integer, defaulting to `0`.
pub fn extract_score(text: &str, key: &str) -> i64 {
    match extract(text, key, ValueKind::Numeric) {
        Extracted::Number(value) => value,
        Extracted::Text(_) => 0,
    }
}

/// Extract a string, defaulting to empty.
pub fn extract_text(text: &str, key: &str) -> String {
    match extract(text, key, ValueKind::Text) {
        Extracted::Text(value) => value,
        Extracted::Number(_) => String::new(),
    }
}

fn payload_value(text: &str, key: &str) -> Option<Value> {
    let span = payload_regex().find(text)?;
    let parsed: Value = serde_json::from_str(span.as_str()).ok()?;
    match parsed {
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        },
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate_float)),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate_float))
        }
        _ => None,
    }
}

fn truncate_float(value: f64) -> Option<i64> {
    if value.is_finite() && value.abs() < i64::MAX as f64 {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

fn coerce_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}
