//! The validation engine: lazy compilation of the rule specification into
//! field rule sets, cached behind a structural snapshot, plus field
//! scoping and multi-error evaluation.
//!
//! A [`Validator`] is owned by its [`crate::record::Record`] and lives
//! exactly as long as it. Every public operation forces a compile first so
//! it observes a state consistent with the record's current specification.

use crate::error::EngineError;
use crate::predicates::PredicateTable;
use crate::rules::FieldRuleSet;
use crate::types::{CustomValidator, JsonMap, RuleDef, ValidationContext};
use serde_json::Value;
use std::collections::HashMap;

/// Engine state derived from a record's rule specification.
#[derive(Default)]
pub struct Validator {
    /// Structural snapshot of the specification the current rule sets were
    /// compiled from. Compiled state is valid iff this still equals the
    /// record's specification.
    snapshot: Option<JsonMap>,
    /// Compiled rule sets, one per field, in declaration order.
    fields: Vec<FieldRuleSet>,
    /// Memoized table of custom validator methods, keyed by lower-cased
    /// name. Built once per validator instance.
    methods: Option<HashMap<String, CustomValidator>>,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    // ─── Compilation ────────────────────────────────────────────────────

    /// Compiles the rule specification into field rule sets.
    ///
    /// Returns `false` (clearing all rule sets) when the specification
    /// changed to empty. A specification matching the cached snapshot is a
    /// no-op returning `true`, which keeps rule sets mutated through the
    /// dynamic API live and evaluable until the specification next
    /// changes; any mutation discards the previous rule sets wholesale,
    /// including rules added dynamically since the last compile.
    pub fn compile(&mut self, spec: &JsonMap) -> Result<bool, EngineError> {
        if let Some(snapshot) = &self.snapshot
            && snapshot == spec
        {
            return Ok(true);
        }

        if spec.is_empty() {
            self.snapshot = Some(JsonMap::new());
            self.fields.clear();
            return Ok(false);
        }

        let mut fields = Vec::with_capacity(spec.len());
        for (field, entry) in spec {
            fields.push(FieldRuleSet::from_spec(field, entry)?);
        }
        self.fields = fields;
        self.snapshot = Some(spec.clone());
        Ok(true)
    }

    /// Resolves the custom-method table from the record's registry,
    /// memoizing it for the lifetime of this validator. Returns cheap
    /// clones of the registered closures.
    pub fn resolve_methods(
        &mut self,
        registry: &HashMap<String, CustomValidator>,
    ) -> HashMap<String, CustomValidator> {
        self.methods.get_or_insert_with(|| registry.clone()).clone()
    }

    // ─── Scope resolution ───────────────────────────────────────────────

    /// Resolves the in-scope rule sets for one evaluation run.
    ///
    /// `requested` is the caller's field list (the `fieldList` options
    /// entry): either an object keyed by the record's alias holding a
    /// nested list, or a flat list. Absent or empty, the record's own
    /// whitelist applies. An empty or multi-dimensional effective scope
    /// means "all compiled fields"; nested scope filters are not
    /// supported and fall back to no restriction.
    ///
    /// The second return is whether the scope was narrowed, in which case
    /// the caller must reset the error map before evaluating.
    pub fn fields_in_scope(
        &self,
        requested: Option<&Value>,
        whitelist: &[String],
        alias: &str,
    ) -> (Vec<&FieldRuleSet>, bool) {
        let effective = match requested {
            Some(value) if !is_empty_list(value) => explicit_scope(value, alias),
            _ if whitelist.is_empty() => None,
            _ => Some(whitelist.to_vec()),
        };

        match effective {
            Some(scope) => {
                let sets = self
                    .fields
                    .iter()
                    .filter(|set| scope.iter().any(|f| *f == set.field))
                    .collect();
                (sets, true)
            }
            None => (self.fields.iter().collect(), false),
        }
    }

    // ─── Evaluation ─────────────────────────────────────────────────────

    /// Runs compilation, scoping, and rule evaluation, accumulating
    /// failures into `errors`. Returns whether a run happened: `false`
    /// means the specification changed to empty and `errors` was left
    /// untouched. The lifecycle hooks around a run belong to the record
    /// and are fired by it.
    ///
    /// With a narrowed scope the whole error map is reset first;
    /// otherwise failures append to whatever the map already holds.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &mut self,
        spec: &JsonMap,
        ctx: &ValidationContext<'_>,
        requested: Option<&Value>,
        whitelist: &[String],
        registry: &HashMap<String, CustomValidator>,
        predicates: Option<&dyn PredicateTable>,
        errors: &mut JsonMap,
    ) -> Result<bool, EngineError> {
        if !self.compile(spec)? {
            return Ok(false);
        }

        let methods = self.resolve_methods(registry);
        let (sets, narrowed) = self.fields_in_scope(requested, whitelist, ctx.alias);
        if narrowed {
            errors.clear();
        }

        for set in sets {
            let failures = set.validate(ctx, &methods, predicates)?;
            if failures.is_empty() {
                continue;
            }
            let entry = errors
                .entry(set.field.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(messages) = entry {
                messages.extend(failures);
            }
        }
        Ok(true)
    }

    // ─── Dynamic rule-set mutation ──────────────────────────────────────
    //
    // Runtime composition on top of the compiled state. Mutations live
    // until the specification next changes, at which point recompilation
    // replaces the rule sets wholesale.

    /// Replaces (or creates) the entire rule set for a field from a
    /// specification entry.
    pub fn add_rules(
        &mut self,
        spec: &JsonMap,
        field: &str,
        rules: &Value,
    ) -> Result<(), EngineError> {
        self.compile(spec)?;
        let set = FieldRuleSet::from_spec(field, rules)?;
        match self.fields.iter_mut().find(|s| s.field == field) {
            Some(existing) => *existing = set,
            None => self.fields.push(set),
        }
        Ok(())
    }

    /// Adds or replaces one named rule on a field, creating the field's
    /// set when it does not exist yet.
    pub fn add_rule(
        &mut self,
        spec: &JsonMap,
        field: &str,
        name: &str,
        def: RuleDef,
    ) -> Result<(), EngineError> {
        self.compile(spec)?;
        match self.fields.iter_mut().find(|s| s.field == field) {
            Some(set) => set.set_rule(name, def),
            None => {
                let mut set = FieldRuleSet::new(field);
                set.set_rule(name, def);
                self.fields.push(set);
            }
        }
        Ok(())
    }

    /// Removes one named rule, or the field's entire set when no rule
    /// name is given.
    pub fn remove(
        &mut self,
        spec: &JsonMap,
        field: &str,
        rule: Option<&str>,
    ) -> Result<(), EngineError> {
        self.compile(spec)?;
        match rule {
            Some(name) => {
                if let Some(set) = self.fields.iter_mut().find(|s| s.field == field) {
                    set.remove_rule(name);
                }
            }
            None => self.fields.retain(|s| s.field != field),
        }
        Ok(())
    }

    /// Whether a rule set is currently defined for a field.
    pub fn contains(&mut self, spec: &JsonMap, field: &str) -> Result<bool, EngineError> {
        self.compile(spec)?;
        Ok(self.fields.iter().any(|s| s.field == field))
    }

    /// The rule set for a field, if any.
    pub fn get(&mut self, spec: &JsonMap, field: &str) -> Result<Option<&FieldRuleSet>, EngineError> {
        self.compile(spec)?;
        Ok(self.fields.iter().find(|s| s.field == field))
    }

    /// All rule sets, in declaration order.
    pub fn rule_sets(&mut self, spec: &JsonMap) -> Result<&[FieldRuleSet], EngineError> {
        self.compile(spec)?;
        Ok(&self.fields)
    }

    /// Number of fields currently holding rules.
    pub fn len(&mut self, spec: &JsonMap) -> Result<usize, EngineError> {
        self.compile(spec)?;
        Ok(self.fields.len())
    }
}

/// Explicit scope from a caller-supplied field list, per the resolution
/// order: alias-keyed nested list first, then a flat list. Returns `None`
/// when the list is multi-dimensional or names no usable fields.
fn explicit_scope(value: &Value, alias: &str) -> Option<Vec<String>> {
    if let Some(map) = value.as_object()
        && let Some(nested) = map.get(alias)
        && let Some(items) = nested.as_array()
        && !items.is_empty()
    {
        return flat_names(items);
    }
    if let Some(items) = value.as_array()
        && !items.is_empty()
    {
        return flat_names(items);
    }
    None
}

/// All elements as plain field names; `None` as soon as any element is
/// not a string (a nested structure).
fn flat_names(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn is_empty_list(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
