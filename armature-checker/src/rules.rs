// Rule model and builders

use crate::{Alternatives, Emptiable};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Wildcard key: apply one key rule to every key present in the input
pub const KEY_ALL: &str = "...";

type ConvertFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;
type PredicateFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Primitive type tag of a key rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// Anything that is not a list or a map
    String,
    /// A number or a numeric string
    Numeric,
    /// A numeric value without fractional part
    Integer,
    /// Dotted numeric version, 1 to 4 groups
    Version,
    /// A string parseable as a point in time
    Datetime,
    /// A list or a map
    Array,
    /// No constraint
    Any,
    /// Unrecognized tag; the type check passes and ranges compare as `any`
    Other(String),
}

impl ValueType {
    /// Get type from its tag
    pub fn parse(tag: &str) -> Self {
        match tag {
            "string" => Self::String,
            "numeric" => Self::Numeric,
            "integer" => Self::Integer,
            "version" => Self::Version,
            "datetime" => Self::Datetime,
            "array" => Self::Array,
            "any" => Self::Any,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get type tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Version => "version",
            Self::Datetime => "datetime",
            Self::Array => "array",
            Self::Any => "any",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ValueType {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

/// The `type` field of a key rule
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// A primitive type tag
    Primitive(ValueType),
    /// The value must be a map (or list) matching a nested rule
    Nested(Box<Alternatives<Rule>>),
}

/// Caller-supplied value conversion
#[derive(Clone)]
pub struct Converter {
    func: ConvertFn,
}

impl Converter {
    /// Create a converter that cannot fail
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(move |value| Ok(func(value))),
        }
    }

    /// Create a converter whose errors abort the check
    pub fn try_new<F, E>(func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            func: Arc::new(move |value| func(value).map_err(|e| e.to_string())),
        }
    }

    /// Convert a value
    pub fn apply(&self, value: Value) -> Result<Value, String> {
        (self.func)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter(..)")
    }
}

/// Named binary predicate usable as a range operator
#[derive(Clone)]
pub struct Predicate {
    name: String,
    func: PredicateFn,
}

impl Predicate {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call with `(value, operand)`
    pub fn evaluate(&self, value: &Value, operand: &Value) -> bool {
        (self.func)(value, operand)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.name)
    }
}

/// Range operator
#[derive(Debug, Clone)]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
    Regex,
    In,
    /// Caller-supplied predicate
    Custom(Predicate),
    /// Unrecognized symbol; always fails
    Unknown(String),
}

impl Operator {
    /// Get operator from its symbol
    pub fn parse(symbol: &str) -> Self {
        match symbol {
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "<" => Self::Lt,
            "<=" => Self::Lte,
            "==" => Self::Eq,
            "!=" => Self::Neq,
            "regex" => Self::Regex,
            "in" => Self::In,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Symbol used in messages
    pub fn symbol(&self) -> &str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Regex => "regex",
            Self::In => "in",
            Self::Custom(predicate) => predicate.name(),
            Self::Unknown(symbol) => symbol,
        }
    }

    /// Whether this is one of the six ordering/equality operators
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Eq | Self::Neq
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operator/operand pairs that must all hold
#[derive(Debug, Clone, Default)]
pub struct RangeSpec {
    entries: Vec<(Operator, Value)>,
}

impl RangeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operator entry
    pub fn with(mut self, operator: Operator, operand: impl Into<Value>) -> Self {
        self.entries.push((operator, operand.into()));
        self
    }

    pub fn gt(self, operand: impl Into<Value>) -> Self {
        self.with(Operator::Gt, operand)
    }

    pub fn gte(self, operand: impl Into<Value>) -> Self {
        self.with(Operator::Gte, operand)
    }

    pub fn lt(self, operand: impl Into<Value>) -> Self {
        self.with(Operator::Lt, operand)
    }

    pub fn lte(self, operand: impl Into<Value>) -> Self {
        self.with(Operator::Lte, operand)
    }

    pub fn eq(self, operand: impl Into<Value>) -> Self {
        self.with(Operator::Eq, operand)
    }

    pub fn ne(self, operand: impl Into<Value>) -> Self {
        self.with(Operator::Neq, operand)
    }

    /// Value text must match a pattern (`^a+$` or `/^a+$/i`)
    pub fn matches(self, pattern: impl Into<String>) -> Self {
        self.with(Operator::Regex, Value::String(pattern.into()))
    }

    /// Value must be a member of the operand
    pub fn one_of(self, operand: impl Into<Value>) -> Self {
        self.with(Operator::In, operand)
    }

    /// Custom predicate called as `func(value, operand)`
    pub fn predicate<F>(self, name: impl Into<String>, func: F, operand: impl Into<Value>) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.with(Operator::Custom(Predicate::new(name, func)), operand)
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[(Operator, Value)] {
        &self.entries
    }
}

impl Emptiable for RangeSpec {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Checks applied to a single key
#[derive(Debug, Clone, Default)]
pub struct KeyRule {
    pub kind: Option<TypeSpec>,
    pub required: Option<bool>,
    pub nonempty: Option<bool>,
    /// Inserted when the key is absent; `Null` is never inserted
    pub default: Option<Value>,
    pub range: Option<Alternatives<RangeSpec>>,
    pub convert: Option<Converter>,
}

impl KeyRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key rule with only a primitive type
    pub fn typed(kind: impl Into<ValueType>) -> Self {
        Self::new().with_type(kind)
    }

    pub fn with_type(mut self, kind: impl Into<ValueType>) -> Self {
        self.kind = Some(TypeSpec::Primitive(kind.into()));
        self
    }

    /// The value must be a map matching `rule`
    pub fn with_nested(mut self, rule: impl Into<Alternatives<Rule>>) -> Self {
        self.kind = Some(TypeSpec::Nested(Box::new(rule.into())));
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_nonempty(mut self, nonempty: bool) -> Self {
        self.nonempty = Some(nonempty);
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        let default = default.into();
        self.default = (!default.is_null()).then_some(default);
        self
    }

    pub fn with_range(mut self, range: impl Into<Alternatives<RangeSpec>>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.convert = Some(converter);
        self
    }

    /// Declared primitive type, if any
    pub fn primitive_type(&self) -> Option<&ValueType> {
        match &self.kind {
            Some(TypeSpec::Primitive(kind)) => Some(kind),
            _ => None,
        }
    }
}

impl Emptiable for KeyRule {
    fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.required.is_none()
            && self.nonempty.is_none()
            && self.default.is_none()
            && self.range.is_none()
            && self.convert.is_none()
    }
}

/// Checks applied to a whole map
#[derive(Debug, Clone)]
pub enum Rule {
    /// Declared keys, checked in declaration order
    Keys(Vec<(String, Alternatives<KeyRule>)>),
    /// One key rule applied to every key present in the input
    All(Alternatives<KeyRule>),
}

impl Rule {
    /// Empty rule over declared keys
    pub fn new() -> Self {
        Self::Keys(Vec::new())
    }

    /// Wildcard rule
    pub fn all(key_rule: impl Into<Alternatives<KeyRule>>) -> Self {
        Self::All(key_rule.into())
    }

    /// Declare a key
    ///
    /// Redeclaring a key replaces its rule in place. Declaring [`KEY_ALL`]
    /// turns the rule into a wildcard rule, and once a rule is a wildcard
    /// rule further keys are ignored.
    pub fn with_key(
        self,
        key: impl Into<String>,
        key_rule: impl Into<Alternatives<KeyRule>>,
    ) -> Self {
        let key = key.into();
        let key_rule = key_rule.into();
        if key == KEY_ALL {
            return Self::All(key_rule);
        }
        match self {
            Self::Keys(mut entries) => {
                match entries.iter_mut().find(|(name, _)| *name == key) {
                    Some(entry) => entry.1 = key_rule,
                    None => entries.push((key, key_rule)),
                }
                Self::Keys(entries)
            }
            all @ Self::All(_) => all,
        }
    }

    /// Whether the rule declares `key` (never true for wildcard rules)
    pub fn declares(&self, key: &str) -> bool {
        match self {
            Self::Keys(entries) => entries.iter().any(|(name, _)| name == key),
            Self::All(_) => false,
        }
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::new()
    }
}

impl Emptiable for Rule {
    fn is_empty(&self) -> bool {
        match self {
            Self::Keys(entries) => entries.is_empty(),
            Self::All(_) => false,
        }
    }
}

/// Options for a whole-rule check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Drop undeclared keys from the result when the rule matched
    pub filter: bool,
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: bool) -> Self {
        self.filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_type_tags() {
        for tag in ["string", "numeric", "integer", "version", "datetime", "array", "any"] {
            assert_eq!(ValueType::parse(tag).as_str(), tag);
        }
        assert_eq!(ValueType::parse("uuid"), ValueType::Other("uuid".to_string()));
        assert_eq!(ValueType::from("integer").to_string(), "integer");
    }

    #[test]
    fn test_operator_symbols() {
        for symbol in [">", ">=", "<", "<=", "==", "!=", "regex", "in"] {
            assert_eq!(Operator::parse(symbol).symbol(), symbol);
        }
        assert!(matches!(Operator::parse("~="), Operator::Unknown(_)));
        assert!(Operator::Lte.is_ordering());
        assert!(!Operator::In.is_ordering());
    }

    #[test]
    fn test_null_default_is_not_set() {
        assert!(KeyRule::new().with_default(Value::Null).default.is_none());
        assert_eq!(KeyRule::new().with_default(3).default, Some(json!(3)));
    }

    #[test]
    fn test_key_rule_emptiness() {
        assert!(KeyRule::new().is_empty());
        assert!(!KeyRule::new().with_required(false).is_empty());
    }

    #[test]
    fn test_redeclared_key_keeps_position() {
        let rule = Rule::new()
            .with_key("a", KeyRule::typed("string"))
            .with_key("b", KeyRule::typed("string"))
            .with_key("a", KeyRule::typed("integer"));

        let Rule::Keys(entries) = rule else {
            panic!("expected declared keys");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "a");
        assert_eq!(
            entries[0].1.as_slice()[0].primitive_type(),
            Some(&ValueType::Integer)
        );
    }

    #[test]
    fn test_wildcard_key_wins() {
        let rule = Rule::new()
            .with_key("a", KeyRule::typed("string"))
            .with_key(KEY_ALL, KeyRule::typed("numeric"))
            .with_key("b", KeyRule::typed("string"));

        assert!(matches!(rule, Rule::All(_)));
        assert!(!rule.declares("a"));
    }

    #[test]
    fn test_converter_and_predicate() {
        let double = Converter::new(|v| json!(v.as_i64().unwrap_or(0) * 2));
        assert_eq!(double.apply(json!(4)), Ok(json!(8)));

        let strict =
            Converter::try_new(|v: Value| v.as_i64().map(Value::from).ok_or("not an integer"));
        assert_eq!(strict.apply(json!("x")), Err("not an integer".to_string()));

        let divides = Predicate::new("divides", |v, d| {
            matches!((v.as_i64(), d.as_i64()), (Some(v), Some(d)) if d != 0 && v % d == 0)
        });
        assert!(divides.evaluate(&json!(9), &json!(3)));
        assert_eq!(Operator::Custom(divides).symbol(), "divides");
    }

    #[test]
    fn test_options_deserialize() {
        let options: CheckOptions = serde_json::from_value(json!({ "filter": true })).unwrap();
        assert!(options.filter);

        let options: CheckOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, CheckOptions::new());
    }
}
