// Checker errors

use thiserror::Error;

/// Result type for checking operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Error raised by the top-level checking entry points
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    /// The input violated the rule; the message names the key/rule path
    #[error("param error: {0}")]
    Invalid(String),

    /// A caller-supplied converter rejected a value
    #[error("param error: key {key} (conversion failed: {message})")]
    Convert {
        /// Key whose value was being converted
        key: String,
        /// Converter's own error text
        message: String,
    },
}

impl CheckError {
    /// Create a new validation failure
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::Invalid(msg.into())
    }

    /// Create a new converter failure
    pub fn convert<K: Into<String>, S: Into<String>>(key: K, msg: S) -> Self {
        Self::Convert {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Composed message without the `param error:` prefix
    pub fn message(&self) -> String {
        match self {
            Self::Invalid(msg) => msg.clone(),
            Self::Convert { key, message } => {
                format!("key {} (conversion failed: {})", key, message)
            }
        }
    }

    /// Check if this error came from a converter
    pub fn is_convert(&self) -> bool {
        matches!(self, Self::Convert { .. })
    }
}

/// Error raised while loading rules from JSON
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// A rule position held a value of the wrong JSON shape
    #[error("Invalid rule at {path}: expected {expected}")]
    Shape {
        /// Dotted location inside the rule document
        path: String,
        /// What the loader expected to find
        expected: &'static str,
    },
}

impl RuleError {
    pub(crate) fn shape(path: impl Into<String>, expected: &'static str) -> Self {
        Self::Shape {
            path: path.into(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_display() {
        let error = CheckError::invalid("key a (is required)");
        assert_eq!(error.to_string(), "param error: key a (is required)");
        assert_eq!(error.message(), "key a (is required)");
        assert!(!error.is_convert());
    }

    #[test]
    fn test_convert_display() {
        let error = CheckError::convert("age", "not a number");
        assert!(error.is_convert());
        assert_eq!(
            error.to_string(),
            "param error: key age (conversion failed: not a number)"
        );
    }

    #[test]
    fn test_rule_error_display() {
        let error = RuleError::shape("a.range", "an object or a list of objects");
        assert_eq!(
            error.to_string(),
            "Invalid rule at a.range: expected an object or a list of objects"
        );
    }
}
