//! Rule-driven input checking for Armature
//!
//! Checks decoded request input (a JSON map) against declarative rules:
//! presence, type, emptiness and value ranges per key, with defaults,
//! conversions and optional filtering of undeclared keys.
//!
//! Every rule position accepts alternatives. A list of rules, key rules or
//! range specs succeeds as soon as one of them succeeds.
//!
//! # Examples
//!
//! ## Single Key
//!
//! ```
//! use armature_checker::InputChecker;
//! use serde_json::{json, Value};
//!
//! let input = json!({ "page": "3" }).as_object().cloned().unwrap();
//!
//! let page = InputChecker::check(&input, "page", "integer", true, false, Value::Null).unwrap();
//! assert_eq!(page, json!("3"));
//!
//! let size = InputChecker::check(&input, "size", "integer", false, false, 20).unwrap();
//! assert_eq!(size, json!(20));
//! ```
//!
//! ## Whole Rule
//!
//! ```
//! use armature_checker::{CheckOptions, Converter, InputChecker, KeyRule, RangeSpec, Rule};
//! use serde_json::json;
//!
//! let rule = Rule::new()
//!     .with_key("name", KeyRule::typed("string").with_required(true).with_nonempty(true))
//!     .with_key(
//!         "age",
//!         KeyRule::typed("integer")
//!             .with_range(RangeSpec::new().gte(0).lt(150))
//!             .with_converter(Converter::new(|v| json!(v.as_str().map_or(0, |s| s.len())))),
//!     );
//!
//! let input = json!({ "name": "john", "age": "42", "debug": true });
//! let input = input.as_object().unwrap();
//!
//! let checked = InputChecker::check_rule(input, rule, &CheckOptions::new().with_filter(true))
//!     .unwrap();
//! assert_eq!(checked.len(), 2);
//! assert_eq!(checked["age"], json!(2));
//! ```
//!
//! ## Rules From JSON
//!
//! ```
//! use armature_checker::{CheckOptions, InputChecker, Rule};
//! use serde_json::json;
//!
//! let rules = Rule::from_json(&json!({
//!     "version": { "type": "version", "range": { ">=": "1.2.0" } },
//! }))
//! .unwrap();
//!
//! let options = CheckOptions::new();
//! let ok = json!({ "version": "1.10.0" });
//! assert!(InputChecker::check_with(ok.as_object().unwrap(), &rules, &options).is_ok());
//!
//! let old = json!({ "version": "1.1.9" });
//! let error = InputChecker::check_with(old.as_object().unwrap(), &rules, &options).unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "param error: key version (as version, should be >= 1.2.0)"
//! );
//! ```

mod alternatives;
mod checker;
pub mod compare;
pub mod engine;
mod errors;
mod loader;
mod rules;
pub mod types;

pub use alternatives::*;
pub use checker::*;
pub use engine::CheckOutcome;
pub use errors::*;
pub use rules::*;
