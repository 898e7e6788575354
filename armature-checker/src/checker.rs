// Entry points for checking request input

use crate::engine::match_rule;
use crate::{
    Alternatives, CheckError, CheckOptions, CheckResult, KEY_ALL, KeyRule, Rule, ValueType,
};
use serde_json::{Map, Value};
use tracing::debug;

/// Checks input maps against rules
///
/// The input is borrowed and never modified; defaults, conversions and
/// filtering are applied to the returned copy.
pub struct InputChecker;

impl InputChecker {
    /// Check a single key with simple parameters
    ///
    /// Returns the (possibly defaulted) value, `Null` for an absent optional
    /// key, or the whole map when `key` is [`KEY_ALL`].
    pub fn check(
        input: &Map<String, Value>,
        key: &str,
        kind: impl Into<ValueType>,
        required: bool,
        nonempty: bool,
        default: impl Into<Value>,
    ) -> CheckResult<Value> {
        let key_rule = KeyRule::new()
            .with_type(kind)
            .with_required(required)
            .with_nonempty(nonempty)
            .with_default(default);

        Self::check_key_rule(input, key, key_rule)
    }

    /// Check a single key with a full key rule
    pub fn check_key_rule(
        input: &Map<String, Value>,
        key: &str,
        key_rule: impl Into<Alternatives<KeyRule>>,
    ) -> CheckResult<Value> {
        let rule = Rule::new().with_key(key, key_rule);
        let mut checked = Self::check_rule(input, rule, &CheckOptions::default())?;

        if key == KEY_ALL {
            Ok(Value::Object(checked))
        } else {
            Ok(checked.remove(key).unwrap_or(Value::Null))
        }
    }

    /// Check the whole input against a rule (or alternative rules)
    pub fn check_rule(
        input: &Map<String, Value>,
        rule: impl Into<Alternatives<Rule>>,
        options: &CheckOptions,
    ) -> CheckResult<Map<String, Value>> {
        Self::check_with(input, &rule.into(), options)
    }

    /// Same as [`InputChecker::check_rule`] for a borrowed, reusable rule set
    pub fn check_with(
        input: &Map<String, Value>,
        rules: &Alternatives<Rule>,
        options: &CheckOptions,
    ) -> CheckResult<Map<String, Value>> {
        let outcome = match_rule(input.clone(), rules, options)?;
        if !outcome.passed {
            debug!(message = %outcome.message, "input rejected");
            return Err(CheckError::invalid(outcome.message));
        }
        Ok(outcome.data)
    }
}
