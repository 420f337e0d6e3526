use crate::error::{ParseError, ParseErrorKind};
use crate::types::RecordSpec;

/// Parse a YAML string into an unvalidated record specification.
///
/// Performs YAML deserialization and type mapping only. Rule definitions
/// are not checked here; a broken definition fails when the engine
/// compiles the specification.
pub fn parse(input: &str) -> Result<RecordSpec, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Syntax,
            message: "empty input".to_string(),
            path: None,
        });
    }

    // Deserialize via serde_json::Value as intermediate so unknown-key
    // checks see the document exactly as written.
    let value: serde_json::Value = serde_saphyr::from_str(input).map_err(|e| {
        let msg = e.to_string();
        ParseError {
            kind: classify_saphyr_error(&msg),
            message: msg,
            path: None,
        }
    })?;

    let Some(map) = value.as_object() else {
        return Err(ParseError {
            kind: ParseErrorKind::TypeMismatch,
            message: "document root must be a YAML mapping".to_string(),
            path: None,
        });
    };

    for key in map.keys() {
        match key.as_str() {
            "record" | "fields" | "validate" | "whitelist" => {}
            other => {
                return Err(ParseError {
                    kind: ParseErrorKind::TypeMismatch,
                    message: format!("unknown top-level field: {}", other),
                    path: Some(other.to_string()),
                });
            }
        }
    }

    let spec: RecordSpec = serde_json::from_value(value).map_err(|e| {
        let msg = e.to_string();
        ParseError {
            kind: classify_json_error(&msg),
            message: msg,
            path: None,
        }
    })?;

    Ok(spec)
}

fn classify_saphyr_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown") || lower.contains("variant") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("type") || lower.contains("invalid") || lower.contains("expected") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}

fn classify_json_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown variant") || lower.contains("unknown field") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("missing field") || lower.contains("invalid type") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}
