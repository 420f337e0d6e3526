//! The validatable record: submitted data, the declarative rule
//! specification, registered custom validators, lifecycle hooks, and the
//! per-field error map the engine populates.

use crate::error::EngineError;
use crate::predicates::PredicateTable;
use crate::rules::FieldRuleSet;
use crate::types::{
    CustomValidator, HookOutcome, JsonMap, RecordSpec, RuleDef, ValidationContext,
};
use crate::validator::Validator;
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Cancelable hook fired before a validation run, receiving the per-call
/// options bag.
pub type BeforeHook = Box<dyn FnMut(&JsonMap) -> HookOutcome>;

/// Observational hook fired after all rule evaluation completes.
pub type AfterHook = Box<dyn FnMut()>;

/// Options key naming the fields a single validation call is scoped to.
pub const FIELD_LIST_KEY: &str = "fieldList";

/// A mutable container representing one validatable entity instance.
///
/// Construct one per validation request, attach rules and data, then call
/// [`Record::validate`]. The engine state is compiled lazily on first use
/// and cached until the rule specification changes.
///
/// Not designed for concurrent use: a record and its validator belong to
/// one logical request.
pub struct Record {
    /// Stable identifier naming this record's logical group within `data`.
    pub alias: String,
    /// Submitted data: group name → object of field values.
    pub data: JsonMap,
    /// Field name → declared type metadata. Informational.
    pub fields: JsonMap,
    /// The declarative rule specification: field → (rule name → rule
    /// definition). Mutating this invalidates the compiled engine state.
    pub rules: JsonMap,
    /// Field name → array of failure messages.
    pub errors: JsonMap,
    /// Default scope filter for validation runs that name no fields.
    pub whitelist: Vec<String>,
    /// Contextual key/value bag available to predicates. Additive; never
    /// auto-cleared.
    pub options: JsonMap,
    methods: HashMap<String, CustomValidator>,
    predicates: Option<Box<dyn PredicateTable>>,
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
    validator: Validator,
}

impl Record {
    pub fn new(alias: impl Into<String>) -> Self {
        Record {
            alias: alias.into(),
            data: JsonMap::new(),
            fields: JsonMap::new(),
            rules: JsonMap::new(),
            errors: JsonMap::new(),
            whitelist: Vec::new(),
            options: JsonMap::new(),
            methods: HashMap::new(),
            predicates: default_predicates(),
            before: None,
            after: None,
            validator: Validator::new(),
        }
    }

    /// Builds a record from a parsed specification document.
    pub fn from_spec(spec: RecordSpec) -> Self {
        let mut record = Record::new(spec.record);
        record.fields = spec.fields;
        record.rules = spec.validate;
        record.whitelist = spec.whitelist;
        record
    }

    // ─── Configuration ──────────────────────────────────────────────────

    /// Registers a custom validator method under a case-insensitive name.
    ///
    /// Custom validators read ambient record state through the context;
    /// they receive no value argument and must pull the field's value from
    /// the submitted data themselves.
    pub fn register(
        &mut self,
        name: &str,
        validator: impl Fn(&ValidationContext<'_>) -> bool + 'static,
    ) {
        self.methods
            .insert(name.to_ascii_lowercase(), Rc::new(validator));
    }

    /// Replaces the built-in predicate table.
    pub fn set_predicates(&mut self, predicates: impl PredicateTable + 'static) {
        self.predicates = Some(Box::new(predicates));
    }

    /// Installs the cancelable before-validation hook.
    pub fn before_validate(&mut self, hook: impl FnMut(&JsonMap) -> HookOutcome + 'static) {
        self.before = Some(Box::new(hook));
    }

    /// Installs the after-validation hook.
    pub fn after_validate(&mut self, hook: impl FnMut() + 'static) {
        self.after = Some(Box::new(hook));
    }

    /// Merges additional context into the options bag; later values
    /// overwrite same keys.
    pub fn add_options(&mut self, options: JsonMap) -> &JsonMap {
        for (key, value) in options {
            self.options.insert(key, value);
        }
        &self.options
    }

    /// Whether the record declares `field`, or, with `None`, whether it
    /// declares any field at all.
    pub fn exists(&self, field: Option<&str>) -> bool {
        match field {
            Some(name) => self.fields.contains_key(name),
            None => !self.fields.is_empty(),
        }
    }

    // ─── Validation ─────────────────────────────────────────────────────

    /// Validates `data` against the rule specification.
    ///
    /// `Ok(true)` iff the run completed with zero errors; `Ok(false)` when
    /// the before-hook cancelled or any field failed. Misconfigured rules
    /// (unresolved predicates, malformed definitions) are errors, not
    /// failures.
    pub fn validate(&mut self, data: JsonMap, options: &JsonMap) -> Result<bool, EngineError> {
        self.data = data;
        match self.invalid_fields(options)? {
            Some(errors) => Ok(errors.is_empty()),
            None => Ok(false),
        }
    }

    /// Runs validation over the already-assigned data and returns the
    /// error map, or `None` when the before-hook cancelled the run.
    ///
    /// This actually evaluates rules; it does not merely report previous
    /// messages. The after-hook fires only when rule evaluation actually
    /// ran, not when the specification changed to empty.
    pub fn invalid_fields(
        &mut self,
        options: &JsonMap,
    ) -> Result<Option<&JsonMap>, EngineError> {
        if let Some(hook) = self.before.as_mut()
            && hook(options) == HookOutcome::Cancel
        {
            return Ok(None);
        }

        let is_update = self.exists(None);
        let ctx = ValidationContext {
            alias: &self.alias,
            data: &self.data,
            options: &self.options,
            is_update,
        };
        let ran = self.validator.evaluate(
            &self.rules,
            &ctx,
            options.get(FIELD_LIST_KEY),
            &self.whitelist,
            &self.methods,
            self.predicates.as_deref(),
            &mut self.errors,
        )?;

        if ran && let Some(hook) = self.after.as_mut() {
            hook();
        }
        Ok(Some(&self.errors))
    }

    /// Marks a field invalid outside normal rule evaluation, for
    /// cross-field or externally-computed failures. Pass `true` for a
    /// message-less invalidation.
    pub fn invalidate(&mut self, field: &str, message: impl Into<Value>) {
        let entry = self
            .errors
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(message.into());
        }
    }

    // ─── Dynamic rule composition ───────────────────────────────────────
    //
    // Wrappers over the validator's mutation API, bound to this record's
    // specification. All force a compile first.

    /// Replaces (or creates) the entire rule set for a field.
    pub fn add_rules(&mut self, field: &str, rules: &Value) -> Result<&mut Self, EngineError> {
        self.validator.add_rules(&self.rules, field, rules)?;
        Ok(self)
    }

    /// Adds or replaces one named rule on a field.
    pub fn add_rule(
        &mut self,
        field: &str,
        name: &str,
        def: RuleDef,
    ) -> Result<&mut Self, EngineError> {
        self.validator.add_rule(&self.rules, field, name, def)?;
        Ok(self)
    }

    /// Removes one named rule, or the field's whole set when `rule` is
    /// `None`.
    pub fn remove_rule(
        &mut self,
        field: &str,
        rule: Option<&str>,
    ) -> Result<&mut Self, EngineError> {
        self.validator.remove(&self.rules, field, rule)?;
        Ok(self)
    }

    /// Whether a rule set is defined for a field.
    pub fn has_rules(&mut self, field: &str) -> Result<bool, EngineError> {
        self.validator.contains(&self.rules, field)
    }

    /// The compiled rule set for a field, if any.
    pub fn rule_set(&mut self, field: &str) -> Result<Option<&FieldRuleSet>, EngineError> {
        self.validator.get(&self.rules, field)
    }

    /// All compiled rule sets, in declaration order.
    pub fn rule_sets(&mut self) -> Result<&[FieldRuleSet], EngineError> {
        self.validator.rule_sets(&self.rules)
    }

    /// Number of fields currently holding rules.
    pub fn rule_count(&mut self) -> Result<usize, EngineError> {
        self.validator.len(&self.rules)
    }
}

#[cfg(feature = "standard-predicates")]
fn default_predicates() -> Option<Box<dyn PredicateTable>> {
    Some(Box::new(crate::predicates::StandardPredicates))
}

#[cfg(not(feature = "standard-predicates"))]
fn default_predicates() -> Option<Box<dyn PredicateTable>> {
    None
}
