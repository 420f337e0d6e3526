use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kind for parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
    UnknownVariant,
}

/// Produced by `parse` when YAML deserialization of a record spec fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: {}", path, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// Error kind for engine failures.
///
/// Rule failures are never represented here; they are reported through the
/// record's error map. An `EngineError` always means the rule specification
/// itself is broken.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    /// A rule references a predicate name found neither among the record's
    /// registered validator methods nor in the built-in predicate table.
    UnresolvedPredicate,
    /// A rule definition value does not deserialize into a rule.
    InvalidRuleDefinition,
}

/// Produced during compilation or evaluation when the rule specification
/// is misconfigured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub message: String,
}

impl EngineError {
    pub(crate) fn unresolved(field: &str, rule: &str, predicate: &str) -> Self {
        EngineError {
            kind: EngineErrorKind::UnresolvedPredicate,
            field: Some(field.to_string()),
            rule: Some(rule.to_string()),
            message: format!(
                "predicate '{}' matches no registered method and no built-in predicate",
                predicate
            ),
        }
    }

    pub(crate) fn invalid_definition(field: &str, message: impl Into<String>) -> Self {
        EngineError {
            kind: EngineErrorKind::InvalidRuleDefinition,
            field: Some(field.to_string()),
            rule: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.field, &self.rule) {
            (Some(field), Some(rule)) => {
                write!(f, "{} (field '{}', rule '{}')", self.message, field, rule)
            }
            (Some(field), None) => write!(f, "{} (field '{}')", self.message, field),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for EngineError {}
