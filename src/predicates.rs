//! Built-in predicate dispatch.
//!
//! The engine treats the built-in predicate table as an injectable
//! dependency: rules that do not resolve to a custom validator method are
//! looked up here. [`StandardPredicates`] ships a default table behind the
//! `standard-predicates` feature.

use serde_json::Value;

// ─── PredicateTable ─────────────────────────────────────────────────────────

/// Extension point for built-in, possibly-parameterized predicates.
///
/// Implementations receive the field's raw value plus the rule's static
/// parameters and return `Some(outcome)`, or `None` when the name is
/// unknown. An unknown name surfaces to the caller as an
/// unresolved-predicate error rather than being silently skipped.
pub trait PredicateTable {
    /// Applies the named predicate to `value`. Names match
    /// case-insensitively.
    fn apply(&self, name: &str, value: &Value, args: &[Value]) -> Option<bool>;
}

// ─── Empty-value semantics ──────────────────────────────────────────────────

/// Whether a raw field value counts as empty for required/skip handling.
///
/// Missing, null, `""`, `[]`, and `{}` are empty. `0` and `false` are NOT:
/// they are real submitted values and predicates must see them.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

// ─── Value coercion helpers ─────────────────────────────────────────────────

/// Numeric reading of a value. Accepts numbers and numeric strings, the
/// way form-submitted data usually arrives.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Textual reading of a value for string predicates. Numbers render as
/// their display form; other types have no text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Loose equality: numbers compare by numeric value (42 equals 42.0),
/// everything else compares structurally.
pub fn values_loosely_equal(a: &Value, b: &Value) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(na), Some(nb)) if a.is_number() && b.is_number() => na == nb,
        _ => a == b,
    }
}

// ─── StandardPredicates ─────────────────────────────────────────────────────

/// Default predicate table.
///
/// Covers the common form-validation checks: presence, numeric shape,
/// length bounds, comparisons, membership, and regex patterns. All names
/// match case-insensitively.
#[cfg(feature = "standard-predicates")]
pub struct StandardPredicates;

#[cfg(feature = "standard-predicates")]
mod standard {
    use super::*;
    use regex::Regex;
    use std::sync::LazyLock;

    static ALPHA_NUMERIC_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[\p{L}\p{Nd}]+$").unwrap());

    static EMAIL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

    static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
            .unwrap()
    });

    impl PredicateTable for StandardPredicates {
        fn apply(&self, name: &str, value: &Value, args: &[Value]) -> Option<bool> {
            let outcome = match name.to_ascii_lowercase().as_str() {
                "not_empty" => !is_empty_value(Some(value)),
                "numeric" => as_number(value).is_some(),
                "natural" => as_number(value).is_some_and(|n| n >= 0.0 && n.fract() == 0.0),
                "boolean" => is_boolean_like(value),
                "alpha_numeric" => {
                    as_text(value).is_some_and(|s| ALPHA_NUMERIC_RE.is_match(&s))
                }
                "email" => value.as_str().is_some_and(|s| EMAIL_RE.is_match(s)),
                "uuid" => value.as_str().is_some_and(|s| UUID_RE.is_match(s)),
                "min_length" => check_length(value, args, |len, n| len >= n),
                "max_length" => check_length(value, args, |len, n| len <= n),
                "between" => {
                    let len = as_text(value).map(|s| s.chars().count() as f64);
                    match (len, arg_number(args, 0), arg_number(args, 1)) {
                        (Some(len), Some(min), Some(max)) => len >= min && len <= max,
                        _ => false,
                    }
                }
                "range" => match (as_number(value), arg_number(args, 0), arg_number(args, 1)) {
                    (Some(n), Some(lower), Some(upper)) => n > lower && n < upper,
                    _ => false,
                },
                "equal_to" => args
                    .first()
                    .is_some_and(|expected| values_loosely_equal(value, expected)),
                "in_list" => args.iter().any(|item| values_loosely_equal(value, item)),
                "comparison" => compare(value, args),
                "custom" => custom_pattern(value, args),
                _ => return None,
            };
            Some(outcome)
        }
    }

    /// `true`, `false`, `0`, `1`, `"0"`, and `"1"` are boolean-like.
    fn is_boolean_like(value: &Value) -> bool {
        match value {
            Value::Bool(_) => true,
            Value::Number(n) => n.as_f64() == Some(0.0) || n.as_f64() == Some(1.0),
            Value::String(s) => s == "0" || s == "1",
            _ => false,
        }
    }

    fn check_length(value: &Value, args: &[Value], cmp: impl Fn(f64, f64) -> bool) -> bool {
        match (as_text(value), arg_number(args, 0)) {
            (Some(s), Some(n)) => cmp(s.chars().count() as f64, n),
            _ => false,
        }
    }

    fn compare(value: &Value, args: &[Value]) -> bool {
        let (Some(op), Some(n), Some(v)) = (
            args.first().and_then(Value::as_str),
            arg_number(args, 1),
            as_number(value),
        ) else {
            return false;
        };
        match op {
            ">" => v > n,
            "<" => v < n,
            ">=" => v >= n,
            "<=" => v <= n,
            "==" => v == n,
            "!=" => v != n,
            _ => false,
        }
    }

    /// Regex pattern predicate. An invalid pattern never matches.
    fn custom_pattern(value: &Value, args: &[Value]) -> bool {
        let (Some(s), Some(pattern)) = (value.as_str(), args.first().and_then(Value::as_str))
        else {
            return false;
        };
        Regex::new(pattern).map(|re| re.is_match(s)).unwrap_or(false)
    }

    fn arg_number(args: &[Value], index: usize) -> Option<f64> {
        args.get(index).and_then(as_number)
    }
}
