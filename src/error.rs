//! Error types with fix suggestions
//!
//! Only configuration errors (programmer misuse, malformed schemas, failed
//! submits) live here. Validation failures are data, see
//! [`crate::validation::ValueError`].

use thiserror::Error;

use crate::validation::ValueError;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum BinderError {
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Schema errors (FORM-010 to FORM-014)
    // ─────────────────────────────────────────────────────────────

    #[error("FORM-010: Unknown type '{name}' referenced from '{referenced_by}'")]
    UnknownType { name: String, referenced_by: String },

    #[error("FORM-011: Duplicate field '{field}' in model '{model}'")]
    DuplicateField { model: String, field: String },

    #[error("FORM-012: Required fields form a cycle: {cycle}")]
    RequiredCycle { cycle: String },

    #[error("FORM-013: Model '{model}' has no field '{field}'")]
    UnknownField { model: String, field: String },

    #[error("FORM-014: Invalid pattern '{pattern}': {details}")]
    InvalidPattern { pattern: String, details: String },

    // ─────────────────────────────────────────────────────────────
    // Path errors (FORM-020)
    // ─────────────────────────────────────────────────────────────

    #[error("FORM-020: Invalid path syntax: {path}")]
    InvalidPath { path: String },

    // ─────────────────────────────────────────────────────────────
    // Binding misuse (FORM-030 to FORM-034)
    // ─────────────────────────────────────────────────────────────

    #[error("FORM-030: Model at '{path}' is not an array")]
    NotAnArray { path: String },

    #[error("FORM-031: Model at '{path}' is not an array item")]
    NotAnArrayItem { path: String },

    #[error("FORM-032: Unknown binder for model '{path}'")]
    UnknownBinder { path: String },

    #[error("FORM-033: Unexpected undefined value at '{path}'")]
    UndefinedValue { path: String },

    #[error("FORM-034: Cannot descend into '{path}': parent value is {found}, expected {expected}")]
    ContainerMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    // ─────────────────────────────────────────────────────────────
    // Submit errors (FORM-050 to FORM-052)
    // ─────────────────────────────────────────────────────────────

    #[error("FORM-050: Validation failed with {} error(s)", .errors.len())]
    ValidationFailed { errors: Vec<ValueError> },

    #[error("FORM-051: Submit rejected by server with {count} violation(s)")]
    ServerRejected { count: usize },

    #[error("FORM-052: Submit failed: {0}")]
    Submit(#[source] anyhow::Error),
}

impl FixSuggestion for BinderError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BinderError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            BinderError::JsonParse(_) => Some("Ensure the value file is valid JSON (try parsing with jq)"),
            BinderError::Io(_) => Some("Check file path and permissions"),
            BinderError::UnknownType { .. } => {
                Some("Declare the type under `models:` or use string/number/boolean")
            }
            BinderError::DuplicateField { .. } => Some("Use unique field names within a model"),
            BinderError::RequiredCycle { .. } => {
                Some("Mark at least one field of the cycle as `optional: true`")
            }
            BinderError::UnknownField { .. } => Some("Check the field name against the schema"),
            BinderError::InvalidPattern { .. } => Some("Fix the regular expression syntax"),
            BinderError::InvalidPath { .. } => Some("Use format: field.subfield or items[0].field"),
            BinderError::NotAnArray { .. } => {
                Some("append_item/prepend_item only work on array-typed fields")
            }
            BinderError::NotAnArrayItem { .. } => {
                Some("remove_self only works on nodes reached through an array index")
            }
            BinderError::UnknownBinder { .. } => {
                Some("Navigate with a model obtained from the same binder's model()")
            }
            BinderError::UndefinedValue { .. } => {
                Some("Use clear() to reset the root instead of writing an undefined value")
            }
            BinderError::ContainerMismatch { .. } => {
                Some("The stored value does not match the schema; read() a conforming value")
            }
            BinderError::ValidationFailed { .. } => {
                Some("Inspect errors() on the binder and fix the reported fields")
            }
            BinderError::ServerRejected { .. } => {
                Some("Server-side violations were attached to the matching fields")
            }
            BinderError::Submit(_) => Some("Check the submit endpoint"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_codes() {
        let err = BinderError::NotAnArray {
            path: "name".to_string(),
        };
        assert!(err.to_string().contains("FORM-030"));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn every_variant_has_a_suggestion() {
        let err = BinderError::RequiredCycle {
            cycle: "Person -> Person".to_string(),
        };
        assert!(err.fix_suggestion().unwrap().contains("optional"));

        let err = BinderError::ValidationFailed { errors: vec![] };
        assert!(err.to_string().contains("0 error(s)"));
        assert!(err.fix_suggestion().is_some());
    }
}
