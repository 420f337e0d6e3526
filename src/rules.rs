//! Compiled rules and per-field rule sets.
//!
//! A [`FieldRuleSet`] is the evaluable form of one field's entry in the
//! rule specification. Rule sets are built wholesale by the validator's
//! compile step and replaced wholesale on recompilation.

use crate::error::EngineError;
use crate::predicates::{PredicateTable, is_empty_value};
use crate::types::{CustomValidator, PredicateRef, RuleDef, ValidationContext};
use serde_json::Value;
use std::collections::HashMap;

// ─── Rule ───────────────────────────────────────────────────────────────────

/// One named, compiled validation rule for a field.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub name: String,
    pub predicate: PredicateRef,
    pub message: Option<String>,
    pub required: bool,
    pub allow_empty: Option<bool>,
    pub last: bool,
    pub group: Option<String>,
}

impl Rule {
    pub fn from_def(name: &str, def: RuleDef) -> Self {
        Rule {
            name: name.to_string(),
            predicate: def.rule,
            message: def.message,
            required: def.required,
            allow_empty: def.allow_empty,
            last: def.last,
            group: def.group,
        }
    }

    /// The value accumulated in the error map when this rule fails:
    /// the configured message, or bare `true` when none was given.
    fn failure_message(&self) -> Value {
        match &self.message {
            Some(message) => Value::String(message.clone()),
            None => Value::Bool(true),
        }
    }

    /// Evaluates this rule for `field`. `Ok(None)` is a pass; `Ok(Some(m))`
    /// is a failure carrying its message value.
    ///
    /// Resolution order: custom methods first, then the built-in table.
    /// Custom methods read ambient record state through the context and
    /// receive no value argument; built-ins receive the value and the
    /// rule's static parameters.
    fn check(
        &self,
        field: &str,
        ctx: &ValidationContext<'_>,
        methods: &HashMap<String, CustomValidator>,
        predicates: Option<&dyn PredicateTable>,
    ) -> Result<Option<Value>, EngineError> {
        let group = self.group.as_deref().unwrap_or(ctx.alias);
        let raw = ctx.group_value(group, field);

        if is_empty_value(raw) {
            if self.required || self.allow_empty == Some(false) {
                return Ok(Some(self.failure_message()));
            }
            return Ok(None);
        }
        let Some(value) = raw else {
            return Ok(None);
        };

        if let Some(method) = methods.get(&self.predicate.name().to_ascii_lowercase()) {
            return if method(ctx) {
                Ok(None)
            } else {
                Ok(Some(self.failure_message()))
            };
        }

        if let Some(table) = predicates
            && let Some(passed) = table.apply(self.predicate.name(), value, self.predicate.args())
        {
            return if passed {
                Ok(None)
            } else {
                Ok(Some(self.failure_message()))
            };
        }

        Err(EngineError::unresolved(
            field,
            &self.name,
            self.predicate.name(),
        ))
    }
}

// ─── FieldRuleSet ───────────────────────────────────────────────────────────

/// The ordered rules attached to one field. Rule names are unique: adding
/// a rule under an existing name replaces it in place, keeping its
/// position.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRuleSet {
    pub field: String,
    rules: Vec<Rule>,
}

impl FieldRuleSet {
    pub fn new(field: impl Into<String>) -> Self {
        FieldRuleSet {
            field: field.into(),
            rules: Vec::new(),
        }
    }

    /// Builds a rule set from one field's entry in the rule specification.
    ///
    /// The entry is either a mapping of rule name → definition, a bare
    /// predicate reference (string or array), or a single anonymous
    /// definition carrying a `rule` key; the latter two forms produce one
    /// rule named after the predicate.
    pub fn from_spec(field: &str, entry: &Value) -> Result<Self, EngineError> {
        let mut set = FieldRuleSet::new(field);
        match entry {
            Value::Object(map) if !single_rule_shorthand(map) => {
                for (name, def) in map {
                    set.set_rule(name, parse_def(field, def)?);
                }
            }
            _ => {
                let def = parse_def(field, entry)?;
                let name = def.rule.name().to_string();
                set.set_rule(&name, def);
            }
        }
        Ok(set)
    }

    /// Adds or replaces the named rule, preserving declaration order on
    /// replacement.
    pub fn set_rule(&mut self, name: &str, def: RuleDef) {
        let rule = Rule::from_def(name, def);
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Merges a mapping of rule name → definition into this set.
    pub fn set_rules(&mut self, defs: &serde_json::Map<String, Value>) -> Result<(), EngineError> {
        for (name, def) in defs {
            self.set_rule(name, parse_def(&self.field, def)?);
        }
        Ok(())
    }

    pub fn remove_rule(&mut self, name: &str) {
        self.rules.retain(|r| r.name != name);
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluates every rule in declared order against the record context,
    /// returning all failure messages. Evaluation does not stop at the
    /// first failure unless a failing rule carries `last`.
    pub fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        methods: &HashMap<String, CustomValidator>,
        predicates: Option<&dyn PredicateTable>,
    ) -> Result<Vec<Value>, EngineError> {
        let mut failures = Vec::new();
        for rule in &self.rules {
            if let Some(message) = rule.check(&self.field, ctx, methods, predicates)? {
                failures.push(message);
                if rule.last {
                    break;
                }
            }
        }
        Ok(failures)
    }
}

/// A mapping with a `rule` key holding a predicate reference is one
/// anonymous definition, not a name → definition map.
fn single_rule_shorthand(map: &serde_json::Map<String, Value>) -> bool {
    matches!(map.get("rule"), Some(Value::String(_)) | Some(Value::Array(_)))
}

fn parse_def(field: &str, def: &Value) -> Result<RuleDef, EngineError> {
    serde_json::from_value(def.clone())
        .map_err(|e| EngineError::invalid_definition(field, e.to_string()))
}
