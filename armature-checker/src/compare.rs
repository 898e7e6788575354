//! Type-aware comparison for range checks
//!
//! A [`Comparer`] is picked from the active type name of a key (the declared
//! primitive type, or the runtime type of the value) and evaluates range
//! operators. Unknown type names fall back to [`Comparer::Any`].

use crate::types::{as_number, parse_timestamp, scalar_text};
use crate::{Operator, RangeSpec};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::trace;

static DELIMITED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(?s)(?P<body>.*)/(?P<flags>[imsxu]*)$").unwrap());

/// Compiled `regex` operands, keyed by pattern text (invalid patterns map to `None`)
static PATTERN_CACHE: Lazy<RwLock<HashMap<String, Option<Regex>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

const PATTERN_CACHE_LIMIT: usize = 256;

/// Comparison strategy for one value type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparer {
    Any,
    String,
    Version,
    Datetime,
    Array,
}

impl Comparer {
    /// Select the comparer for a type name
    pub fn for_type(type_name: &str) -> Self {
        match type_name {
            "string" => Self::String,
            "version" => Self::Version,
            "datetime" => Self::Datetime,
            "array" => Self::Array,
            _ => Self::Any,
        }
    }

    /// Evaluate `value <operator> operand`
    pub fn compare(self, value: &Value, operand: &Value, operator: &Operator) -> bool {
        match self {
            Self::Any => compare_any(value, operand, operator),
            Self::String => compare_string(value, operand, operator),
            Self::Version => compare_version(value, operand, operator),
            Self::Datetime => compare_datetime(value, operand, operator),
            Self::Array => compare_array(value, operand, operator),
        }
    }
}

/// Evaluate alternative range specs against a value
///
/// Returns the failure message when no alternative holds.
pub fn check_range(type_name: &str, value: &Value, ranges: &[RangeSpec]) -> Result<(), String> {
    let comparer = Comparer::for_type(type_name);
    trace!(type_name, ?comparer, "evaluating range");

    let passed = ranges.iter().any(|range| {
        range
            .entries()
            .iter()
            .all(|(operator, operand)| comparer.compare(value, operand, operator))
    });

    if passed {
        Ok(())
    } else {
        Err(describe_ranges(type_name, ranges))
    }
}

/// `as <type>, should be <op> <val> and <op> <val>, or ...`
pub fn describe_ranges(type_name: &str, ranges: &[RangeSpec]) -> String {
    let alternatives = ranges
        .iter()
        .map(|range| {
            range
                .entries()
                .iter()
                .map(|(operator, operand)| format!("{} {}", operator, render_operand(operand)))
                .collect::<Vec<_>>()
                .join(" and ")
        })
        .collect::<Vec<_>>();

    format!("as {}, should be {}", type_name, alternatives.join(", or "))
}

/// Strings as-is, everything else as compact JSON
pub fn render_operand(operand: &Value) -> String {
    match operand {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_any(x: &Value, y: &Value, operator: &Operator) -> bool {
    match operator {
        Operator::Gt => loose_cmp(x, y) == Some(Ordering::Greater),
        Operator::Gte => matches!(loose_cmp(x, y), Some(Ordering::Greater | Ordering::Equal)),
        Operator::Lt => loose_cmp(x, y) == Some(Ordering::Less),
        Operator::Lte => matches!(loose_cmp(x, y), Some(Ordering::Less | Ordering::Equal)),
        Operator::Eq => loose_eq(x, y),
        Operator::Neq => !loose_eq(x, y),
        Operator::In => members(y).any(|member| loose_eq(x, member)),
        Operator::Custom(predicate) => predicate.evaluate(x, y),
        Operator::Regex | Operator::Unknown(_) => false,
    }
}

fn compare_string(x: &Value, y: &Value, operator: &Operator) -> bool {
    match operator {
        Operator::Regex => match (scalar_text(x), y.as_str()) {
            (Some(text), Some(pattern)) => {
                cached_pattern(pattern).is_some_and(|re| re.is_match(&text))
            }
            _ => false,
        },
        _ => compare_any(x, y, operator),
    }
}

fn compare_version(x: &Value, y: &Value, operator: &Operator) -> bool {
    if !operator.is_ordering() {
        return compare_string(x, y, operator);
    }
    let (Some(a), Some(b)) = (scalar_text(x), scalar_text(y)) else {
        return false;
    };
    let ordering = compare_versions(&a, &b);
    match operator {
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Gte => ordering != Ordering::Less,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Lte => ordering != Ordering::Greater,
        Operator::Eq => ordering == Ordering::Equal,
        _ => ordering != Ordering::Equal,
    }
}

fn compare_datetime(x: &Value, y: &Value, operator: &Operator) -> bool {
    match (parse_timestamp(x), parse_timestamp(y)) {
        (Some(a), Some(b)) => compare_any(&Value::from(a), &Value::from(b), operator),
        _ => false,
    }
}

fn compare_array(x: &Value, y: &Value, operator: &Operator) -> bool {
    match operator {
        Operator::Eq => x == y,
        Operator::Neq => x != y,
        _ => false,
    }
}

/// Segment-wise numeric comparison; missing segments count as 0
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|segment| segment.trim().parse().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(a), parse(b));

    (0..a.len().max(b.len()))
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn loose_eq(x: &Value, y: &Value) -> bool {
    match (as_number(x), as_number(y)) {
        (Some(a), Some(b)) => a == b,
        _ => x == y,
    }
}

/// Orders numbers (and numeric strings), strings and booleans among themselves;
/// null and mixed kinds are unordered, so every ordering operator fails
fn loose_cmp(x: &Value, y: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(x), as_number(y)) {
        return a.partial_cmp(&b);
    }
    match (x, y) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn members(collection: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match collection {
        Value::Array(items) => Box::new(items.iter()),
        Value::Object(map) => Box::new(map.values()),
        scalar => Box::new(std::iter::once(scalar)),
    }
}

fn cached_pattern(pattern: &str) -> Option<Regex> {
    if let Some(compiled) = PATTERN_CACHE.read().get(pattern) {
        return compiled.clone();
    }

    let compiled = compile_pattern(pattern);
    let mut cache = PATTERN_CACHE.write();
    if cache.len() >= PATTERN_CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(pattern.to_string(), compiled.clone());
    compiled
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    let Some(caps) = DELIMITED_PATTERN.captures(pattern) else {
        return Regex::new(pattern).ok();
    };
    let flags = &caps["flags"];
    RegexBuilder::new(&caps["body"])
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build()
        .ok()
}
