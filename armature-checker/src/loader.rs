//! Declarative rules from JSON
//!
//! Rule documents use the same shape as the builder API:
//!
//! ```json
//! {
//!     "name": { "type": "string", "required": true, "nonempty": true },
//!     "page": { "type": "integer", "default": 1, "range": { ">=": 1 } },
//!     "tags": [{ "type": "array" }, { "type": "string" }]
//! }
//! ```
//!
//! A JSON list at any rule, key rule or range position holds alternatives.
//! A `type` that is an object or a list is a nested rule. The `...` key
//! applies its key rule to every input key. Converters and custom predicates
//! are closures and can only be attached through the builders.

use crate::{Alternatives, KEY_ALL, KeyRule, Operator, RangeSpec, Rule, RuleError, TypeSpec};
use serde_json::{Map, Value};

impl Rule {
    /// Load a rule (or a list of alternative rules) from JSON
    pub fn from_json(value: &Value) -> Result<Alternatives<Rule>, RuleError> {
        load_rules(value, "")
    }
}

impl KeyRule {
    /// Load a key rule (or a list of alternative key rules) from JSON
    pub fn from_json(value: &Value) -> Result<Alternatives<KeyRule>, RuleError> {
        load_key_rules(value, "")
    }
}

impl RangeSpec {
    /// Load a range spec (or a list of alternative range specs) from JSON
    pub fn from_json(value: &Value) -> Result<Alternatives<RangeSpec>, RuleError> {
        load_ranges(value, "range")
    }
}

fn load_rules(value: &Value, path: &str) -> Result<Alternatives<Rule>, RuleError> {
    match value {
        Value::Null => Ok(Alternatives::Many(Vec::new())),
        Value::Object(map) => Ok(Alternatives::One(load_rule(map, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => load_rule(map, &join(path, &index.to_string())),
                _ => Err(RuleError::shape(join(path, &index.to_string()), "an object")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Alternatives::Many),
        _ => Err(RuleError::shape(display(path), "an object or a list of objects")),
    }
}

fn load_rule(map: &Map<String, Value>, path: &str) -> Result<Rule, RuleError> {
    if let Some(key_rule) = map.get(KEY_ALL) {
        return Ok(Rule::All(load_key_rules(key_rule, &join(path, KEY_ALL))?));
    }
    let entries = map
        .iter()
        .map(|(key, key_rule)| {
            load_key_rules(key_rule, &join(path, key)).map(|rules| (key.clone(), rules))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Rule::Keys(entries))
}

fn load_key_rules(value: &Value, path: &str) -> Result<Alternatives<KeyRule>, RuleError> {
    match value {
        Value::Null => Ok(Alternatives::Many(Vec::new())),
        Value::Object(map) => Ok(Alternatives::One(load_key_rule(map, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => load_key_rule(map, &join(path, &index.to_string())),
                _ => Err(RuleError::shape(join(path, &index.to_string()), "an object")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Alternatives::Many),
        _ => Err(RuleError::shape(display(path), "an object or a list of objects")),
    }
}

fn load_key_rule(map: &Map<String, Value>, path: &str) -> Result<KeyRule, RuleError> {
    let mut rule = KeyRule::new();

    rule.kind = match map.get("type") {
        None | Some(Value::Null) => None,
        Some(Value::String(tag)) => Some(TypeSpec::Primitive(tag.as_str().into())),
        Some(nested @ (Value::Object(_) | Value::Array(_))) => Some(TypeSpec::Nested(Box::new(
            load_rules(nested, &join(path, "type"))?,
        ))),
        Some(_) => {
            return Err(RuleError::shape(join(path, "type"), "a type name or a nested rule"));
        }
    };
    rule.required = load_flag(map, "required", path)?;
    rule.nonempty = load_flag(map, "nonempty", path)?;
    rule.default = map.get("default").filter(|v| !v.is_null()).cloned();
    rule.range = match map.get("range") {
        None | Some(Value::Null) => None,
        Some(range) => Some(load_ranges(range, &join(path, "range"))?),
    };

    Ok(rule)
}

fn load_flag(map: &Map<String, Value>, name: &str, path: &str) -> Result<Option<bool>, RuleError> {
    match map.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(RuleError::shape(join(path, name), "a boolean")),
    }
}

fn load_ranges(value: &Value, path: &str) -> Result<Alternatives<RangeSpec>, RuleError> {
    match value {
        Value::Object(map) => Ok(Alternatives::One(load_range(map))),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(load_range(map)),
                _ => Err(RuleError::shape(join(path, &index.to_string()), "an object")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Alternatives::Many),
        _ => Err(RuleError::shape(path, "an object or a list of objects")),
    }
}

fn load_range(map: &Map<String, Value>) -> RangeSpec {
    map.iter().fold(RangeSpec::new(), |range, (symbol, operand)| {
        range.with(Operator::parse(symbol), operand.clone())
    })
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn display(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueType;
    use serde_json::json;

    #[test]
    fn test_load_declared_keys_in_order() {
        let rules = Rule::from_json(&json!({
            "b": { "type": "string" },
            "a": { "type": "integer", "required": false, "default": 3 },
        }))
        .unwrap();

        let Alternatives::One(Rule::Keys(entries)) = rules else {
            panic!("expected one rule with declared keys");
        };
        assert_eq!(entries[0].0, "b");
        assert_eq!(entries[1].0, "a");
        let a = &entries[1].1.as_slice()[0];
        assert_eq!(a.primitive_type(), Some(&ValueType::Integer));
        assert_eq!(a.required, Some(false));
        assert_eq!(a.default, Some(json!(3)));
    }

    #[test]
    fn test_load_wildcard_and_alternatives() {
        let rules = Rule::from_json(&json!([
            { "...": { "type": "numeric" } },
            { "x": [{ "type": "integer" }, { "type": "string" }] },
        ]))
        .unwrap();

        let rules = rules.as_slice();
        assert_eq!(rules.len(), 2);
        assert!(matches!(rules[0], Rule::All(_)));
        let Rule::Keys(entries) = &rules[1] else {
            panic!("expected declared keys");
        };
        assert_eq!(entries[0].1.len(), 2);
    }

    #[test]
    fn test_load_nested_type() {
        let rules = KeyRule::from_json(&json!({
            "type": { "id": { "type": "integer" } },
        }))
        .unwrap();
        assert!(matches!(
            rules.as_slice()[0].kind,
            Some(TypeSpec::Nested(_))
        ));
    }

    #[test]
    fn test_load_ranges() {
        let ranges = RangeSpec::from_json(&json!([{ "==": 1 }, { ">": 5, "<": 10 }])).unwrap();
        let ranges = ranges.as_slice();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].entries().len(), 2);
        assert_eq!(ranges[1].entries()[0].0.symbol(), ">");

        let ranges = RangeSpec::from_json(&json!({ "~=": "x" })).unwrap();
        assert!(matches!(ranges.as_slice()[0].entries()[0].0, Operator::Unknown(_)));
    }

    #[test]
    fn test_load_null_default_is_unset() {
        let rules = KeyRule::from_json(&json!({ "default": null })).unwrap();
        assert!(rules.as_slice()[0].default.is_none());
    }

    #[test]
    fn test_shape_errors_name_the_path() {
        let error = Rule::from_json(&json!({ "a": { "range": 5 } })).unwrap_err();
        assert_eq!(error, RuleError::shape("a.range", "an object or a list of objects"));

        let error = Rule::from_json(&json!({ "a": { "required": "yes" } })).unwrap_err();
        assert_eq!(error, RuleError::shape("a.required", "a boolean"));

        let error = Rule::from_json(&json!({ "a": { "type": 3 } })).unwrap_err();
        assert_eq!(error, RuleError::shape("a.type", "a type name or a nested rule"));

        let error = Rule::from_json(&json!("a")).unwrap_err();
        assert_eq!(error, RuleError::shape("<root>", "an object or a list of objects"));
    }
}
