//! Declarative, lazily-compiled validation engine for data records.
//!
//! Callers attach named rules to named fields of a [`Record`], the engine
//! evaluates those rules against submitted data, and reports, per field,
//! every rule that failed along with its message:
//!
//! ```text
//! parse(yaml) → RecordSpec → Record → validate(data, options) → bool
//!                                   → invalid_fields(options) → error map
//! ```
//!
//! Rule specifications are plain ordered JSON mappings; the engine
//! compiles them lazily into per-field rule sets and caches the result
//! until the specification changes. Rules resolve either to built-in
//! predicates (see [`predicates::PredicateTable`]) or to custom validator
//! closures registered on the record. A cancelable before-hook and an
//! observational after-hook bracket every run.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//!
//! let yaml = r#"
//! record: Example
//! fields:
//!   title:
//!     type: text
//! validate:
//!   title:
//!     present:
//!       rule: not_empty
//!       required: true
//!       message: "Title is required"
//! "#;
//!
//! let mut record = rulekit::load(yaml).expect("valid spec");
//! let data = json!({ "Example": { "title": "" } });
//! let valid = record
//!     .validate(data.as_object().cloned().unwrap_or_default(), &Default::default())
//!     .expect("well-formed rules");
//! assert!(!valid);
//! assert_eq!(record.errors["title"], json!(["Title is required"]));
//! ```
//!
//! # Feature Flags
//!
//! | Feature               | Default | Description |
//! |-----------------------|---------|-------------|
//! | `standard-predicates` | yes     | Built-in predicate table backed by the [`regex`] crate. See [`predicates::StandardPredicates`]. |

pub mod error;
pub mod parse;
pub mod predicates;
pub mod record;
pub mod rules;
pub mod types;
pub mod validator;

pub use error::*;
pub use record::Record;
pub use types::*;

// Re-export entry-point functions at the crate root for convenience.
pub use parse::parse;

/// Convenience entry point composing parse → [`Record::from_spec`].
///
/// # Errors
///
/// Returns `Err(ParseError)` if the document does not parse.
pub fn load(input: &str) -> Result<Record, ParseError> {
    let spec = parse::parse(input)?;
    Ok(Record::from_spec(spec))
}
