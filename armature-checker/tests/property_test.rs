//! Property-based tests for armature-checker
//!
//! These tests use proptest to verify invariants around:
//! - Default application being idempotent
//! - Numeric version ordering
//! - Filtering only keeping declared keys

use armature_checker::*;
use proptest::prelude::*;
use serde_json::{Map, Value, json};

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Strategy for input keys
fn arb_key() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,7}").unwrap()
}

/// Strategy for scalar JSON values
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

/// Strategy for flat input maps
fn arb_input() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(arb_key(), arb_scalar(), 0..8)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Strategy for dotted versions with 1 to 4 segments
fn arb_version() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..50, 1..=4)
}

fn render_version(segments: &[u32]) -> String {
    segments
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn padded(segments: &[u32]) -> [u32; 4] {
    let mut out = [0; 4];
    out[..segments.len()].copy_from_slice(segments);
    out
}

proptest! {
    #[test]
    fn default_application_is_idempotent(
        input in arb_input(),
        key in arb_key(),
        default in arb_scalar(),
    ) {
        let rule = Rule::new().with_key(key.as_str(), KeyRule::new().with_default(default));

        let once = InputChecker::check_rule(&input, rule.clone(), &CheckOptions::new()).unwrap();
        let twice = InputChecker::check_rule(&once, rule, &CheckOptions::new()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn version_ordering_matches_numeric_segments(a in arb_version(), b in arb_version()) {
        let rule = Rule::new().with_key(
            "v",
            KeyRule::typed("version").with_range(RangeSpec::new().gte(render_version(&b))),
        );
        let input = json!({ "v": render_version(&a) }).as_object().cloned().unwrap();

        let passed = InputChecker::check_rule(&input, rule, &CheckOptions::new()).is_ok();
        prop_assert_eq!(passed, padded(&a) >= padded(&b));
    }

    #[test]
    fn filter_keeps_only_declared_keys(
        input in arb_input(),
        declared in prop::collection::vec(arb_key(), 0..4),
    ) {
        let rule = declared
            .iter()
            .fold(Rule::new(), |rule, key| rule.with_key(key.as_str(), KeyRule::typed("any")));
        let options = CheckOptions::new().with_filter(true);

        let checked = InputChecker::check_rule(&input, rule, &options).unwrap();
        if declared.is_empty() {
            prop_assert_eq!(&checked, &input);
        } else {
            prop_assert!(checked.keys().all(|key| declared.contains(key)));
            prop_assert!(
                declared
                    .iter()
                    .all(|key| checked.contains_key(key) == input.contains_key(key))
            );
        }
    }

    #[test]
    fn any_integer_passes_integer_type(n in any::<i64>()) {
        let input = json!({ "n": n }).as_object().cloned().unwrap();
        let value = InputChecker::check(&input, "n", "integer", true, false, Value::Null).unwrap();
        prop_assert_eq!(value, json!(n));
    }
}
