use rulekit::error::EngineErrorKind;
use rulekit::types::{JsonMap, PredicateRef, RuleDef, ValidationContext};
use rulekit::Record;
use serde_json::{Map, Value, json};

fn obj(value: Value) -> JsonMap {
    value.as_object().cloned().expect("object literal")
}

fn record_with_rules(rules: Value) -> Record {
    let mut record = Record::new("Entry");
    record.rules = obj(rules);
    record.register("always_fail", |_: &ValidationContext<'_>| false);
    record.register("always_pass", |_: &ValidationContext<'_>| true);
    record
}

// ─── Compilation and caching ────────────────────────────────────────────────

#[test]
fn compiling_twice_preserves_rule_identities_and_order() {
    let mut record = record_with_rules(json!({
        "a": { "r1": "always_pass", "r2": "always_fail" },
        "b": { "r3": "always_pass" }
    }));

    let first: Vec<(String, Vec<String>)> = record
        .rule_sets()
        .expect("compiles")
        .iter()
        .map(|s| {
            (
                s.field.clone(),
                s.rules().iter().map(|r| r.name.clone()).collect(),
            )
        })
        .collect();
    let second: Vec<(String, Vec<String>)> = record
        .rule_sets()
        .expect("compiles")
        .iter()
        .map(|s| {
            (
                s.field.clone(),
                s.rules().iter().map(|r| r.name.clone()).collect(),
            )
        })
        .collect();

    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            ("a".to_string(), vec!["r1".to_string(), "r2".to_string()]),
            ("b".to_string(), vec!["r3".to_string()]),
        ]
    );
}

#[test]
fn mutating_the_specification_forces_recompilation() {
    let mut record = record_with_rules(json!({
        "a": { "check": "always_pass" }
    }));
    assert_eq!(record.rule_count(), Ok(1));

    record.rules.insert(
        "b".to_string(),
        json!({ "check": "always_fail" }),
    );
    assert_eq!(record.rule_count(), Ok(2));
}

#[test]
fn recompilation_discards_dynamically_added_rules() {
    let mut record = record_with_rules(json!({
        "a": { "check": "always_pass" }
    }));
    record
        .add_rule("b", "extra", RuleDef::new(PredicateRef::Name("always_pass".into())))
        .expect("compiles");
    assert_eq!(record.rule_count(), Ok(2));

    // Any specification change replaces the compiled sets wholesale.
    record
        .rules
        .insert("c".to_string(), json!({ "check": "always_pass" }));
    assert_eq!(record.rule_count(), Ok(2));
    assert_eq!(record.has_rules("b"), Ok(false));
    assert_eq!(record.has_rules("c"), Ok(true));
}

#[test]
fn compile_errors_surface_on_malformed_definitions() {
    let mut record = record_with_rules(json!({
        "a": { "broken": 42 }
    }));
    let err = record.rule_count().expect_err("42 is not a rule definition");
    assert_eq!(err.kind, EngineErrorKind::InvalidRuleDefinition);
    assert_eq!(err.field.as_deref(), Some("a"));
}

// ─── Rule ordering and accumulation ─────────────────────────────────────────

#[test]
fn failures_accumulate_in_declared_rule_order() {
    let mut record = record_with_rules(json!({
        "a": {
            "r1": { "rule": "always_fail", "message": "first" },
            "r2": { "rule": "always_fail", "message": "second" }
        }
    }));
    record
        .validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "a": ["first", "second"] })));
}

#[test]
fn a_rule_without_message_reports_bare_true() {
    let mut record = record_with_rules(json!({
        "a": { "r1": { "rule": "always_fail" } }
    }));
    record
        .validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "a": [true] })));
}

#[test]
fn last_flag_stops_later_rules_for_the_field() {
    let mut record = record_with_rules(json!({
        "a": {
            "r1": { "rule": "always_fail", "message": "first", "last": true },
            "r2": { "rule": "always_fail", "message": "second" }
        },
        "b": { "r3": { "rule": "always_fail", "message": "other field still runs" } }
    }));
    record
        .validate(obj(json!({ "Entry": { "a": 1, "b": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(
        record.errors,
        obj(json!({
            "a": ["first"],
            "b": ["other field still runs"]
        }))
    );
}

// ─── Predicate resolution ───────────────────────────────────────────────────

#[test]
fn unresolved_predicates_are_evaluation_errors() {
    let mut record = record_with_rules(json!({
        "a": { "check": { "rule": "no_such_predicate" } }
    }));
    let err = record
        .validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new())
        .expect_err("nothing resolves no_such_predicate");
    assert_eq!(err.kind, EngineErrorKind::UnresolvedPredicate);
    assert_eq!(err.field.as_deref(), Some("a"));
    assert_eq!(err.rule.as_deref(), Some("check"));
}

#[test]
fn unresolved_predicates_outside_scope_never_fail() {
    // Lazy failure: a broken rule reference only matters when evaluated.
    let mut record = record_with_rules(json!({
        "a": { "check": { "rule": "no_such_predicate" } },
        "b": { "check": "always_pass" }
    }));
    let options = obj(json!({ "fieldList": ["b"] }));
    assert_eq!(
        record.validate(obj(json!({ "Entry": { "a": 1, "b": 1 } })), &options),
        Ok(true)
    );
}

#[test]
fn method_names_resolve_case_insensitively() {
    let mut record = record_with_rules(json!({
        "a": { "check": { "rule": "AlwaysFail", "message": "nope" } }
    }));
    record.register("alwaysfail", |_: &ValidationContext<'_>| false);
    record
        .validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "a": ["nope"] })));
}

// ─── Empty-value handling ───────────────────────────────────────────────────

#[test]
fn empty_values_skip_non_required_rules() {
    let mut record = record_with_rules(json!({
        "a": { "check": { "rule": "always_fail", "message": "nope" } }
    }));
    // Field absent entirely, and present but empty: both skip the rule.
    assert_eq!(record.validate(obj(json!({ "Entry": {} })), &Map::new()), Ok(true));
    assert_eq!(
        record.validate(obj(json!({ "Entry": { "a": "" } })), &Map::new()),
        Ok(true)
    );
    assert_eq!(
        record.validate(obj(json!({ "Entry": { "a": null } })), &Map::new()),
        Ok(true)
    );
}

#[test]
fn required_rules_fail_on_empty_values_without_running_the_predicate() {
    let mut record = record_with_rules(json!({
        "a": { "check": { "rule": "always_pass", "message": "must be present", "required": true } }
    }));
    assert_eq!(record.validate(obj(json!({ "Entry": {} })), &Map::new()), Ok(false));
    assert_eq!(record.errors, obj(json!({ "a": ["must be present"] })));
}

#[test]
fn allow_empty_false_behaves_like_required() {
    let mut record = record_with_rules(json!({
        "a": { "check": { "rule": "always_pass", "message": "cannot be blank", "allow_empty": false } }
    }));
    assert_eq!(
        record.validate(obj(json!({ "Entry": { "a": "" } })), &Map::new()),
        Ok(false)
    );
    assert_eq!(record.errors, obj(json!({ "a": ["cannot be blank"] })));
}

#[test]
fn zero_and_false_are_not_empty() {
    let mut record = record_with_rules(json!({
        "a": { "check": { "rule": "always_fail", "message": "ran" } }
    }));
    assert_eq!(
        record.validate(obj(json!({ "Entry": { "a": 0 } })), &Map::new()),
        Ok(false)
    );
    assert_eq!(
        record.validate(obj(json!({ "Entry": { "a": false } })), &Map::new()),
        Ok(false)
    );
}

// ─── Group resolution ───────────────────────────────────────────────────────

#[test]
fn a_rule_group_overrides_the_record_alias() {
    let mut record = record_with_rules(json!({
        "a": { "check": { "rule": "always_fail", "message": "nope", "group": "Other" } }
    }));
    // The value lives under a different group than the record's alias.
    let data = obj(json!({ "Other": { "a": 1 }, "Entry": {} }));
    assert_eq!(record.validate(data, &Map::new()), Ok(false));
    record.errors.clear();

    // Without a value under the override group the rule is skipped.
    let data = obj(json!({ "Entry": { "a": 1 } }));
    assert_eq!(record.validate(data, &Map::new()), Ok(true));
}

// ─── Dynamic rule composition ───────────────────────────────────────────────

#[test]
fn add_rule_creates_the_field_set_when_missing() {
    let mut record = record_with_rules(json!({
        "a": { "check": "always_pass" }
    }));
    let mut def = RuleDef::new(PredicateRef::Name("always_fail".into()));
    def.message = Some("added at runtime".into());
    record.add_rule("b", "added", def).expect("compiles");

    assert_eq!(record.has_rules("b"), Ok(true));
    record
        .validate(obj(json!({ "Entry": { "a": 1, "b": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "b": ["added at runtime"] })));
}

#[test]
fn rules_added_onto_an_empty_spec_are_evaluated() {
    let mut record = Record::new("Entry");
    record.register("always_fail", |_: &ValidationContext<'_>| false);

    let mut def = RuleDef::new(PredicateRef::Name("always_fail".into()));
    def.message = Some("added at runtime".into());
    record.add_rule("a", "added", def).expect("compiles");
    assert_eq!(record.has_rules("a"), Ok(true));

    assert_eq!(
        record.validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new()),
        Ok(false)
    );
    assert_eq!(record.errors, obj(json!({ "a": ["added at runtime"] })));
}

#[test]
fn add_rule_replaces_in_place_keeping_declaration_order() {
    let mut record = record_with_rules(json!({
        "a": {
            "r1": { "rule": "always_fail", "message": "old" },
            "r2": { "rule": "always_fail", "message": "tail" }
        }
    }));
    let mut def = RuleDef::new(PredicateRef::Name("always_fail".into()));
    def.message = Some("new".into());
    record.add_rule("a", "r1", def).expect("compiles");

    record
        .validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "a": ["new", "tail"] })));
}

#[test]
fn add_rules_replaces_the_whole_field_set() {
    let mut record = record_with_rules(json!({
        "a": {
            "r1": { "rule": "always_fail", "message": "old" },
            "r2": { "rule": "always_fail", "message": "older" }
        }
    }));
    record
        .add_rules("a", &json!({ "only": { "rule": "always_fail", "message": "new" } }))
        .expect("compiles");

    record
        .validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "a": ["new"] })));
}

#[test]
fn remove_rule_drops_one_rule_or_the_whole_field() {
    let mut record = record_with_rules(json!({
        "a": {
            "r1": { "rule": "always_fail", "message": "first" },
            "r2": { "rule": "always_fail", "message": "second" }
        },
        "b": { "r3": "always_fail" }
    }));

    record.remove_rule("a", Some("r1")).expect("compiles");
    record.remove_rule("b", None).expect("compiles");

    assert_eq!(record.has_rules("b"), Ok(false));
    assert_eq!(record.rule_count(), Ok(1));
    record
        .validate(obj(json!({ "Entry": { "a": 1, "b": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "a": ["second"] })));
}

#[test]
fn rule_set_lookup_exposes_compiled_rules() {
    let mut record = record_with_rules(json!({
        "a": { "r1": { "rule": ["min_length", 3], "message": "short" } }
    }));
    let set = record
        .rule_set("a")
        .expect("compiles")
        .expect("field has rules");
    let rule = set.rule("r1").expect("rule exists");
    assert_eq!(rule.predicate.name(), "min_length");
    assert_eq!(rule.predicate.args(), &[json!(3)]);
    assert!(record.rule_set("missing").expect("compiles").is_none());
}

// ─── Specification shorthands ───────────────────────────────────────────────

#[test]
fn bare_predicate_string_is_a_single_rule() {
    let mut record = record_with_rules(json!({
        "a": "always_fail"
    }));
    record
        .validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "a": [true] })));

    let set = record.rule_set("a").expect("compiles").expect("has rules");
    assert_eq!(set.rules().len(), 1);
    assert_eq!(set.rules()[0].name, "always_fail");
}

#[test]
fn anonymous_definition_with_rule_key_is_a_single_rule() {
    let mut record = record_with_rules(json!({
        "a": { "rule": "always_fail", "message": "nope" }
    }));
    record
        .validate(obj(json!({ "Entry": { "a": 1 } })), &Map::new())
        .expect("resolvable rules");
    assert_eq!(record.errors, obj(json!({ "a": ["nope"] })));
}
