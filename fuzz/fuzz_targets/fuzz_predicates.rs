#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use rulekit::predicates::{PredicateTable, StandardPredicates};
use serde_json::Value;

const NAMES: &[&str] = &[
    "not_empty",
    "numeric",
    "natural",
    "boolean",
    "alpha_numeric",
    "email",
    "uuid",
    "min_length",
    "max_length",
    "between",
    "range",
    "equal_to",
    "in_list",
    "comparison",
    "custom",
];

/// Generate a simple arbitrary JSON value from fuzzer bytes.
fn arbitrary_value(u: &mut Unstructured<'_>) -> arbitrary::Result<Value> {
    match u.int_in_range(0..=4)? {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(bool::arbitrary(u)?)),
        2 => {
            let n = f64::arbitrary(u)?;
            Ok(serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        3 => Ok(Value::String(String::arbitrary(u)?)),
        _ => Ok(Value::Null),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    let name = match u.choose(NAMES) {
        Ok(n) => n,
        Err(_) => return,
    };

    let value = match arbitrary_value(&mut u) {
        Ok(v) => v,
        Err(_) => return,
    };

    let mut args = Vec::new();
    while let Ok(true) = bool::arbitrary(&mut u) {
        if args.len() >= 4 {
            break;
        }
        match arbitrary_value(&mut u) {
            Ok(v) => args.push(v),
            Err(_) => break,
        }
    }

    // Every built-in predicate must answer Some for its own name, and
    // must never panic no matter the value or parameter shapes.
    assert!(StandardPredicates.apply(name, &value, &args).is_some());
});
