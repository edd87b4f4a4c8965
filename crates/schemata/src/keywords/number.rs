//! Numeric keywords
//!
//! Comparisons use exact integer arithmetic when both sides are integers and
//! fall back to `f64` otherwise. Draft-04 spells exclusive bounds as boolean
//! modifiers of `minimum`/`maximum`; later drafts use numeric
//! `exclusiveMinimum`/`exclusiveMaximum`.

use core::cmp::Ordering;

use serde_json::{Number, Value, json};

use crate::dialect::Keyword;
use crate::error::ErrorCode;
use crate::validate::{ValidationInput, ValidationOutcome, ValidationPath};

pub const MULTIPLE_OF: Keyword = Keyword::new("multipleOf", "multipleOf").with_validate(validate_multiple_of);
pub const MINIMUM: Keyword = Keyword::new("minimum", "minimum").with_validate(validate_minimum);
pub const MAXIMUM: Keyword = Keyword::new("maximum", "maximum").with_validate(validate_maximum);
pub const EXCLUSIVE_MINIMUM: Keyword =
    Keyword::new("exclusiveMinimum", "exclusiveMinimum").with_validate(validate_exclusive_minimum);
pub const EXCLUSIVE_MAXIMUM: Keyword =
    Keyword::new("exclusiveMaximum", "exclusiveMaximum").with_validate(validate_exclusive_maximum);

/// Draft-04 `minimum` honouring a boolean `exclusiveMinimum`.
pub const MINIMUM_04: Keyword = Keyword::new("minimum", "minimum").with_validate(validate_minimum_04);
/// Draft-04 `maximum` honouring a boolean `exclusiveMaximum`.
pub const MAXIMUM_04: Keyword = Keyword::new("maximum", "maximum").with_validate(validate_maximum_04);

/// Order a data number against a schema limit.
pub(crate) fn compare(data: &Number, limit: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (data.as_i64(), limit.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (data.as_u64(), limit.as_u64()) {
        return Some(a.cmp(&b));
    }
    data.as_f64()?.partial_cmp(&limit.as_f64()?)
}

fn number_pair<'a>(input: &ValidationInput<'a>, keyword: &str) -> Option<(&'a Number, &'a Number)> {
    let Value::Number(data) = input.data else {
        return None;
    };
    match input.node.schema.get(keyword) {
        Some(Value::Number(limit)) => Some((data, limit)),
        _ => None,
    }
}

fn bound_error(
    input: &ValidationInput<'_>,
    keyword: &str,
    code: ErrorCode,
    failed: impl Fn(Ordering) -> bool,
) -> Vec<ValidationOutcome> {
    let Some((data, limit)) = number_pair(input, keyword) else {
        return Vec::new();
    };
    match compare(data, limit) {
        Some(ordering) if failed(ordering) => {
            let mut extra = serde_json::Map::new();
            extra.insert(keyword.to_string(), Value::Number(limit.clone()));
            extra.insert("limit".to_string(), Value::Number(limit.clone()));
            vec![input.error(code, Value::Object(extra))]
        }
        _ => Vec::new(),
    }
}

fn validate_minimum(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    bound_error(input, "minimum", ErrorCode::Minimum, |o| o == Ordering::Less)
}

fn validate_maximum(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    bound_error(input, "maximum", ErrorCode::Maximum, |o| o == Ordering::Greater)
}

fn validate_exclusive_minimum(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    bound_error(input, "exclusiveMinimum", ErrorCode::ExclusiveMinimum, |o| {
        o != Ordering::Greater
    })
}

fn validate_exclusive_maximum(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    bound_error(input, "exclusiveMaximum", ErrorCode::ExclusiveMaximum, |o| {
        o != Ordering::Less
    })
}

fn is_exclusive(input: &ValidationInput<'_>, modifier: &str) -> bool {
    input.node.schema.get(modifier).and_then(Value::as_bool) == Some(true)
}

fn validate_minimum_04(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    if is_exclusive(input, "exclusiveMinimum") {
        return bound_error(input, "minimum", ErrorCode::ExclusiveMinimum, |o| {
            o != Ordering::Greater
        });
    }
    bound_error(input, "minimum", ErrorCode::Minimum, |o| o == Ordering::Less)
}

fn validate_maximum_04(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    if is_exclusive(input, "exclusiveMaximum") {
        return bound_error(input, "maximum", ErrorCode::ExclusiveMaximum, |o| {
            o != Ordering::Less
        });
    }
    bound_error(input, "maximum", ErrorCode::Maximum, |o| o == Ordering::Greater)
}

fn validate_multiple_of(input: &ValidationInput<'_>, _path: &mut ValidationPath) -> Vec<ValidationOutcome> {
    let Some((data, divisor)) = number_pair(input, "multipleOf") else {
        return Vec::new();
    };
    if is_multiple_of(data, divisor) {
        return Vec::new();
    }
    vec![input.error(ErrorCode::MultipleOf, json!({ "multipleOf": divisor }))]
}

fn is_multiple_of(data: &Number, divisor: &Number) -> bool {
    if let (Some(a), Some(b)) = (data.as_i64(), divisor.as_i64()) {
        return b == 0 || a % b == 0;
    }
    let (Some(a), Some(b)) = (data.as_f64(), divisor.as_f64()) else {
        return true;
    };
    if b == 0.0 {
        return true;
    }
    let quotient = a / b;
    if !quotient.is_finite() {
        return false;
    }
    // tolerate binary rounding, 0.3 / 0.1 == 2.9999999999999996
    (quotient - quotient.round()).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::compile;
    use crate::config::CompileOptions;

    fn codes(schema: Value, data: Value) -> Vec<&'static str> {
        compile::compile(schema, CompileOptions::default())
            .unwrap()
            .validate(&data)
            .errors
            .iter()
            .map(|e| e.code.as_str())
            .collect()
    }

    #[test]
    fn test_compare_mixed_numbers() {
        let a = Number::from(3);
        let b = Number::from_f64(2.5).unwrap();
        assert_eq!(compare(&a, &b), Some(Ordering::Greater));
        assert_eq!(compare(&Number::from(u64::MAX), &Number::from(u64::MAX)), Some(Ordering::Equal));
    }

    #[test]
    fn test_bounds() {
        assert!(codes(json!({ "minimum": 2 }), json!(2)).is_empty());
        assert_eq!(codes(json!({ "minimum": 2 }), json!(1.5)), vec!["minimum-error"]);
        assert_eq!(codes(json!({ "exclusiveMaximum": 2 }), json!(2)), vec!["exclusive-maximum-error"]);
        assert!(codes(json!({ "maximum": 2 }), json!("ignored")).is_empty());
    }

    #[test]
    fn test_draft04_boolean_exclusive() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "minimum": 2,
            "exclusiveMinimum": true
        });
        assert_eq!(codes(schema.clone(), json!(2)), vec!["exclusive-minimum-error"]);
        assert!(codes(schema, json!(2.1)).is_empty());
    }

    #[test]
    fn test_multiple_of() {
        assert!(codes(json!({ "multipleOf": 0.1 }), json!(0.3)).is_empty());
        assert!(codes(json!({ "multipleOf": 3 }), json!(9)).is_empty());
        assert_eq!(codes(json!({ "multipleOf": 3 }), json!(10)), vec!["multiple-of-error"]);
        assert_eq!(
            codes(json!({ "multipleOf": 0.123456789 }), json!(1e308)),
            vec!["multiple-of-error"]
        );
    }
}
