// Type predicates over JSON values

use crate::ValueType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").unwrap()
});

static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d+){0,3}$").unwrap());

static UNIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@-?\d+$").unwrap());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Check a value against a primitive type
pub fn matches_type(kind: &ValueType, value: &Value) -> bool {
    match kind {
        ValueType::String => !is_composite(value),
        ValueType::Numeric => as_number(value).is_some(),
        ValueType::Integer => as_number(value).is_some_and(|n| n.fract() == 0.0),
        ValueType::Version => scalar_text(value).is_some_and(|text| VERSION_REGEX.is_match(&text)),
        ValueType::Datetime => parse_timestamp(value).is_some(),
        ValueType::Array => is_composite(value),
        ValueType::Any | ValueType::Other(_) => true,
    }
}

/// Lists and maps
pub fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Numeric value of a number or numeric string
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if NUMERIC_REGEX.is_match(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Text form of a scalar; `None` for lists and maps
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) | Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Empty values: null, false, zero, "", "0", empty list or map
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Type name of a value, used when a key rule declares no primitive type
pub fn runtime_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "array",
    }
}

/// Parse a string into Unix seconds (UTC)
///
/// Accepts RFC 3339, RFC 2822, `Y-m-d H:M[:S]`, `Y/m/d H:M[:S]`, plain dates
/// and `@<seconds>`.
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    let text = value.as_str()?.trim();

    if UNIX_REGEX.is_match(text) {
        return text[1..].parse().ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        }
    }
    None
}
