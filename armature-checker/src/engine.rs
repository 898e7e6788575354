//! Rule matching and the per-key check pipeline
//!
//! Both levels take the input map by value and hand back the transformed
//! map, so a failed alternative never leaks its defaults or conversions into
//! the next attempt.

use crate::compare::check_range;
use crate::types::{is_empty_value, matches_type, runtime_type_name};
use crate::{Alternatives, CheckError, CheckOptions, CheckResult, KeyRule, Rule, TypeSpec};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Result of matching a rule or a key rule
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// Whether one alternative fully succeeded
    pub passed: bool,
    /// Composed failure message; empty on success
    pub message: String,
    /// Transformed input (the untouched input on failure)
    pub data: Map<String, Value>,
}

impl CheckOutcome {
    fn pass(data: Map<String, Value>) -> Self {
        Self {
            passed: true,
            message: String::new(),
            data,
        }
    }

    fn fail(message: String, data: Map<String, Value>) -> Self {
        Self {
            passed: false,
            message,
            data,
        }
    }
}

/// Sub-checks of a key rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubCheck {
    Type,
    Required,
    NonEmpty,
    Default,
    Range,
    Convert,
}

const PIPELINE: [SubCheck; 6] = [
    SubCheck::Type,
    SubCheck::Required,
    SubCheck::NonEmpty,
    SubCheck::Default,
    SubCheck::Range,
    SubCheck::Convert,
];

impl SubCheck {
    fn applies_to(self, rule: &KeyRule) -> bool {
        match self {
            Self::Type => rule.kind.is_some(),
            Self::Required => rule.required.is_some(),
            Self::NonEmpty => rule.nonempty.is_some(),
            Self::Default => rule.default.is_some(),
            Self::Range => rule.range.is_some(),
            Self::Convert => rule.convert.is_some(),
        }
    }
}

enum Step {
    Pass(Map<String, Value>),
    Fail(String),
}

/// Match an input map against alternative rules
pub fn match_rule(
    input: Map<String, Value>,
    rules: &Alternatives<Rule>,
    options: &CheckOptions,
) -> CheckResult<CheckOutcome> {
    if rules.is_empty() {
        return Ok(CheckOutcome::pass(input));
    }

    let mut failures = Vec::new();
    let mut convert_error = None;
    for (index, rule) in rules.iter().enumerate() {
        let message = match match_single_rule(input.clone(), rule, options) {
            Ok(Ok(data)) => return Ok(CheckOutcome::pass(data)),
            Ok(Err(message)) => message,
            Err(error) => record_convert_error(error, &mut convert_error),
        };
        debug!(rule = index, %message, "rule alternative failed");
        failures.push(message);
    }

    if let Some(error) = convert_error {
        return Err(error);
    }
    Ok(CheckOutcome::fail(compose(failures, "rule"), input))
}

fn match_single_rule(
    mut data: Map<String, Value>,
    rule: &Rule,
    options: &CheckOptions,
) -> CheckResult<Result<Map<String, Value>, String>> {
    match rule {
        Rule::All(key_rules) => {
            let keys: Vec<String> = data.keys().cloned().collect();
            for key in keys {
                let outcome = check_key(data, &key, key_rules, options)?;
                if !outcome.passed {
                    return Ok(Err(outcome.message));
                }
                data = outcome.data;
            }
        }
        Rule::Keys(entries) => {
            for (key, key_rules) in entries {
                let outcome = check_key(data, key, key_rules, options)?;
                if !outcome.passed {
                    return Ok(Err(outcome.message));
                }
                data = outcome.data;
            }
            if options.filter {
                data.retain(|key, _| rule.declares(key));
            }
        }
    }
    Ok(Ok(data))
}

/// Check one key of an input map against alternative key rules
pub fn check_key(
    input: Map<String, Value>,
    key: &str,
    key_rules: &Alternatives<KeyRule>,
    options: &CheckOptions,
) -> CheckResult<CheckOutcome> {
    if key_rules.is_empty() {
        return Ok(CheckOutcome::pass(input));
    }

    let mut failures = Vec::new();
    let mut convert_error = None;
    for (index, key_rule) in key_rules.iter().enumerate() {
        let message = match run_pipeline(input.clone(), key, key_rule, options) {
            Ok(Step::Pass(data)) => return Ok(CheckOutcome::pass(data)),
            Ok(Step::Fail(message)) => message,
            Err(error) => record_convert_error(error, &mut convert_error),
        };
        debug!(key, key_rule = index, %message, "key rule alternative failed");
        failures.push(message);
    }

    if let Some(error) = convert_error {
        return Err(error);
    }
    let message = format!("key {} ({})", key, compose(failures, "key rule"));
    Ok(CheckOutcome::fail(message, input))
}

fn run_pipeline(
    mut data: Map<String, Value>,
    key: &str,
    rule: &KeyRule,
    options: &CheckOptions,
) -> CheckResult<Step> {
    for check in PIPELINE {
        if !check.applies_to(rule) {
            continue;
        }
        trace!(key, ?check, "running sub-check");
        data = match run_sub_check(check, data, key, rule, options)? {
            Step::Pass(data) => data,
            fail @ Step::Fail(_) => return Ok(fail),
        };
    }
    Ok(Step::Pass(data))
}

fn run_sub_check(
    check: SubCheck,
    data: Map<String, Value>,
    key: &str,
    rule: &KeyRule,
    options: &CheckOptions,
) -> CheckResult<Step> {
    match check {
        SubCheck::Type => check_type(data, key, rule, options),
        SubCheck::Required => Ok(check_required(data, key, rule)),
        SubCheck::NonEmpty => Ok(check_nonempty(data, key, rule)),
        SubCheck::Default => Ok(set_default(data, key, rule)),
        SubCheck::Range => Ok(check_key_range(data, key, rule)),
        SubCheck::Convert => convert(data, key, rule),
    }
}

fn check_type(
    mut data: Map<String, Value>,
    key: &str,
    rule: &KeyRule,
    options: &CheckOptions,
) -> CheckResult<Step> {
    let Some(value) = data.get(key) else {
        return Ok(Step::Pass(data));
    };

    match &rule.kind {
        Some(TypeSpec::Nested(nested)) => {
            let (sub_input, positional) = match value {
                Value::Object(map) => (map.clone(), false),
                Value::Array(items) => (positional_map(items), true),
                _ => return Ok(Step::Fail("should be array".to_string())),
            };
            let outcome = match_rule(sub_input, nested, options)?;
            if !outcome.passed {
                return Ok(Step::Fail(outcome.message));
            }
            let value = if positional {
                from_positional(outcome.data)
            } else {
                Value::Object(outcome.data)
            };
            data.insert(key.to_string(), value);
            Ok(Step::Pass(data))
        }
        Some(TypeSpec::Primitive(kind)) if !matches_type(kind, value) => {
            Ok(Step::Fail(format!("should be {}", kind)))
        }
        _ => Ok(Step::Pass(data)),
    }
}

fn check_required(data: Map<String, Value>, key: &str, rule: &KeyRule) -> Step {
    if rule.required == Some(true) && !data.contains_key(key) {
        return Step::Fail("is required".to_string());
    }
    Step::Pass(data)
}

fn check_nonempty(data: Map<String, Value>, key: &str, rule: &KeyRule) -> Step {
    if rule.nonempty == Some(true) && data.get(key).is_some_and(is_empty_value) {
        return Step::Fail("should not be empty".to_string());
    }
    Step::Pass(data)
}

fn set_default(mut data: Map<String, Value>, key: &str, rule: &KeyRule) -> Step {
    if let Some(default) = rule.default.as_ref().filter(|d| !d.is_null())
        && !data.contains_key(key)
    {
        data.insert(key.to_string(), default.clone());
    }
    Step::Pass(data)
}

fn check_key_range(data: Map<String, Value>, key: &str, rule: &KeyRule) -> Step {
    let (Some(value), Some(ranges)) = (data.get(key), rule.range.as_ref()) else {
        return Step::Pass(data);
    };
    if ranges.as_slice().is_empty() {
        return Step::Pass(data);
    }

    let type_name = match rule.primitive_type() {
        Some(kind) => kind.as_str(),
        None => runtime_type_name(value),
    };
    match check_range(type_name, value, ranges.as_slice()) {
        Ok(()) => Step::Pass(data),
        Err(message) => Step::Fail(message),
    }
}

fn convert(mut data: Map<String, Value>, key: &str, rule: &KeyRule) -> CheckResult<Step> {
    let Some(converter) = rule.convert.as_ref() else {
        return Ok(Step::Pass(data));
    };
    if let Some(value) = data.get_mut(key) {
        let current = std::mem::take(value);
        *value = converter
            .apply(current)
            .map_err(|message| CheckError::convert(key, message))?;
    }
    Ok(Step::Pass(data))
}

/// Keep the first converter error of a failed alternative and return its message
///
/// Later alternatives are still tried; the error is raised only if none of
/// them succeeds.
fn record_convert_error(error: CheckError, first: &mut Option<CheckError>) -> String {
    let message = error.message();
    first.get_or_insert(error);
    message
}

/// Join alternative failures, labelling each one when several were tried
fn compose(failures: Vec<String>, label: &str) -> String {
    if failures.len() > 1 {
        failures
            .iter()
            .enumerate()
            .map(|(index, message)| format!("with {} {}, {}", label, index, message))
            .collect::<Vec<_>>()
            .join("; ")
    } else {
        failures.into_iter().next().unwrap_or_default()
    }
}

fn positional_map(items: &[Value]) -> Map<String, Value> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| (index.to_string(), item.clone()))
        .collect()
}

fn from_positional(map: Map<String, Value>) -> Value {
    let is_list = map
        .keys()
        .enumerate()
        .all(|(index, key)| *key == index.to_string());
    if is_list {
        Value::Array(map.into_iter().map(|(_, value)| value).collect())
    } else {
        Value::Object(map)
    }
}
