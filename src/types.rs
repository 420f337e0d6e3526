use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::rc::Rc;

/// Ordered JSON object. With `preserve_order` enabled on `serde_json`,
/// iteration follows insertion order, which the engine relies on for
/// declaration-ordered field and rule evaluation.
pub type JsonMap = Map<String, Value>;

// ─── PredicateRef ───────────────────────────────────────────────────────────

/// Reference to the predicate a rule invokes.
///
/// Deserializes from a bare string (`numeric`) or an array whose first
/// element is the predicate name and whose remaining elements are static
/// parameters (`[between, 8, 20]`).
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateRef {
    Name(String),
    Args(String, Vec<Value>),
}

impl PredicateRef {
    pub fn name(&self) -> &str {
        match self {
            PredicateRef::Name(name) => name,
            PredicateRef::Args(name, _) => name,
        }
    }

    pub fn args(&self) -> &[Value] {
        match self {
            PredicateRef::Name(_) => &[],
            PredicateRef::Args(_, args) => args,
        }
    }
}

impl Serialize for PredicateRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        match self {
            PredicateRef::Name(name) => name.serialize(serializer),
            PredicateRef::Args(name, args) => {
                let mut seq = serializer.serialize_seq(Some(args.len() + 1))?;
                seq.serialize_element(name)?;
                for arg in args {
                    seq.serialize_element(arg)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for PredicateRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(name) => Ok(PredicateRef::Name(name)),
            Value::Array(items) => {
                let mut iter = items.into_iter();
                match iter.next() {
                    Some(Value::String(name)) => Ok(PredicateRef::Args(name, iter.collect())),
                    _ => Err(serde::de::Error::custom(
                        "predicate array must start with a name string",
                    )),
                }
            }
            _ => Err(serde::de::Error::custom(
                "predicate reference must be a string or an array",
            )),
        }
    }
}

// ─── RuleDef ────────────────────────────────────────────────────────────────

/// Declarative definition of a single rule, as written in a rule
/// specification.
///
/// Accepts a shorthand form where the whole definition is just a predicate
/// reference (a string or array), in which case every flag takes its
/// default.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleDef {
    pub rule: PredicateRef,
    /// Message reported on failure; `true` is reported when absent.
    pub message: Option<String>,
    /// When set, an empty value fails instead of skipping the predicate.
    pub required: bool,
    /// Explicit override for the empty-value skip: `Some(false)` makes an
    /// empty value fail even for a non-required rule.
    pub allow_empty: Option<bool>,
    /// Stop evaluating later rules for this field after a failure.
    pub last: bool,
    /// Data group the field's value is read from, overriding the record
    /// alias.
    pub group: Option<String>,
}

impl RuleDef {
    pub fn new(rule: PredicateRef) -> Self {
        RuleDef {
            rule,
            message: None,
            required: false,
            allow_empty: None,
            last: false,
            group: None,
        }
    }
}

impl Serialize for RuleDef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("rule", &self.rule)?;
        if let Some(message) = &self.message {
            map.serialize_entry("message", message)?;
        }
        if self.required {
            map.serialize_entry("required", &true)?;
        }
        if let Some(allow_empty) = &self.allow_empty {
            map.serialize_entry("allow_empty", allow_empty)?;
        }
        if self.last {
            map.serialize_entry("last", &true)?;
        }
        if let Some(group) = &self.group {
            map.serialize_entry("group", group)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(_) | Value::Array(_) => {
                let rule: PredicateRef =
                    serde_json::from_value(value).map_err(serde::de::Error::custom)?;
                Ok(RuleDef::new(rule))
            }
            Value::Object(map) => {
                let rule_val = map.get("rule").ok_or_else(|| {
                    serde::de::Error::custom("rule definition must have a 'rule' key")
                })?;
                let rule: PredicateRef =
                    serde_json::from_value(rule_val.clone()).map_err(serde::de::Error::custom)?;

                let message = match map.get("message") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Null) | None => None,
                    Some(other) => {
                        return Err(serde::de::Error::custom(format!(
                            "rule message must be a string, got {}",
                            other
                        )));
                    }
                };

                Ok(RuleDef {
                    rule,
                    message,
                    required: bool_key(map, "required").map_err(serde::de::Error::custom)?
                        == Some(true),
                    allow_empty: bool_key(map, "allow_empty")
                        .map_err(serde::de::Error::custom)?,
                    last: bool_key(map, "last").map_err(serde::de::Error::custom)?
                        == Some(true),
                    group: match map.get("group") {
                        Some(Value::String(s)) => Some(s.clone()),
                        Some(Value::Null) | None => None,
                        Some(other) => {
                            return Err(serde::de::Error::custom(format!(
                                "rule group must be a string, got {}",
                                other
                            )));
                        }
                    },
                })
            }
            _ => Err(serde::de::Error::custom(
                "rule definition must be a string, array, or mapping",
            )),
        }
    }
}

fn bool_key(map: &JsonMap, key: &str) -> Result<Option<bool>, String> {
    match map.get(key) {
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(format!("rule '{}' flag must be a boolean, got {}", key, other)),
    }
}

// ─── RecordSpec ─────────────────────────────────────────────────────────────

/// A declarative record specification document: the alias of the record's
/// logical group, field metadata, the rule specification, and an optional
/// whitelist. See [`crate::parse::parse`] for the YAML front end.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Alias naming the record's logical group within submitted data.
    pub record: String,
    /// Field name → declared type metadata. Informational; the engine does
    /// not enforce types. A per-field `group` key overrides the data group.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: JsonMap,
    /// Field name → (rule name → rule definition).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub validate: JsonMap,
    /// Default scope filter applied when a validation call names no fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub whitelist: Vec<String>,
}

// ─── Lifecycle hooks ────────────────────────────────────────────────────────

/// Outcome of the cancelable before-validation hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookOutcome {
    Continue,
    Cancel,
}

// ─── ValidationContext ──────────────────────────────────────────────────────

/// Ambient record state exposed to custom validator methods.
///
/// Custom predicates receive no value argument; they pull whatever they
/// need from the submitted data and the options bag.
pub struct ValidationContext<'a> {
    /// The record's alias, naming its default data group.
    pub alias: &'a str,
    /// Full submitted data: group name → object of field values.
    pub data: &'a JsonMap,
    /// Contextual options bag (e.g. the acting user's identity).
    pub options: &'a JsonMap,
    /// Whether the record declares at least one field. Informational; the
    /// engine itself never branches on it.
    pub is_update: bool,
}

impl<'a> ValidationContext<'a> {
    /// Value of `field` within the record's own group.
    pub fn value(&self, field: &str) -> Option<&'a Value> {
        self.group_value(self.alias, field)
    }

    /// Value of `field` within an explicit data group.
    pub fn group_value(&self, group: &str, field: &str) -> Option<&'a Value> {
        self.data.get(group)?.as_object()?.get(field)
    }

    /// Entry in the options bag.
    pub fn option(&self, key: &str) -> Option<&'a Value> {
        self.options.get(key)
    }
}

/// A custom validator closure registered on a record, looked up
/// case-insensitively by rule predicate name.
pub type CustomValidator = Rc<dyn Fn(&ValidationContext<'_>) -> bool>;
