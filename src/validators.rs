//! Built-in validators
//!
//! Constraint validators usable from code or declared on schema fields:
//!
//! ```yaml
//! fields:
//!   - name: email
//!     type: string
//!     validators:
//!       - not_blank
//!       - email
//!   - name: tags
//!     type: [string]
//!     validators:
//!       - size: { min: 1, max: 5 }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::binder::Binder;
use crate::error::BinderError;
use crate::validation::{ValidationOutcome, Validator};
use crate::value::Value;

/// Pragmatic address check: local part, `@`, dotted domain
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

/// Value must not be blank (see [`Value::is_blank`])
pub struct Required {
    message: String,
}

impl Required {
    pub fn new() -> Self {
        Self {
            message: "must not be empty".to_string(),
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for Required {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for Required {
    fn message(&self) -> &str {
        &self.message
    }

    fn implies_required(&self) -> bool {
        true
    }

    async fn validate(&self, value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        (!Value::is_blank(value)).into()
    }
}

/// Value must be defined and not null
pub struct NotNull {
    message: String,
}

impl NotNull {
    pub fn new() -> Self {
        Self {
            message: "must not be null".to_string(),
        }
    }
}

impl Default for NotNull {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for NotNull {
    fn message(&self) -> &str {
        &self.message
    }

    fn implies_required(&self) -> bool {
        true
    }

    async fn validate(&self, value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        matches!(value, Some(v) if !v.is_null()).into()
    }
}

/// String must contain at least one non-whitespace character
pub struct NotBlank {
    message: String,
}

impl NotBlank {
    pub fn new() -> Self {
        Self {
            message: "must not be blank".to_string(),
        }
    }
}

impl Default for NotBlank {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for NotBlank {
    fn message(&self) -> &str {
        &self.message
    }

    fn implies_required(&self) -> bool {
        true
    }

    async fn validate(&self, value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        match value {
            Some(Value::String(s)) => (!s.trim().is_empty()).into(),
            Some(Value::Null) | None => ValidationOutcome::Invalid,
            Some(_) => ValidationOutcome::Valid,
        }
    }
}

/// Length bounds for strings (in chars) and arrays
pub struct Size {
    min: usize,
    max: usize,
    message: String,
}

impl Size {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            message: format!("size must be between {} and {}", min, max),
        }
    }
}

#[async_trait]
impl Validator for Size {
    fn message(&self) -> &str {
        &self.message
    }

    /// A positive minimum makes the field mandatory
    fn implies_required(&self) -> bool {
        self.min > 0
    }

    async fn validate(&self, value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        let len = match value {
            Some(Value::String(s)) => s.chars().count(),
            Some(Value::Array(items)) => items.len(),
            None | Some(Value::Null) => 0,
            Some(_) => return ValidationOutcome::Valid,
        };
        (self.min <= len && len <= self.max).into()
    }
}

/// Numeric lower bound (inclusive); numeric strings are parsed
pub struct Min {
    min: f64,
    message: String,
}

impl Min {
    pub fn new(min: f64) -> Self {
        Self {
            min,
            message: format!("must be greater than or equal to {}", min),
        }
    }
}

#[async_trait]
impl Validator for Min {
    fn message(&self) -> &str {
        &self.message
    }

    async fn validate(&self, value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        match numeric(value) {
            Some(n) => (n >= self.min).into(),
            None => ValidationOutcome::Invalid,
        }
    }
}

/// Numeric upper bound (inclusive); numeric strings are parsed
pub struct Max {
    max: f64,
    message: String,
}

impl Max {
    pub fn new(max: f64) -> Self {
        Self {
            max,
            message: format!("must be less than or equal to {}", max),
        }
    }
}

#[async_trait]
impl Validator for Max {
    fn message(&self) -> &str {
        &self.message
    }

    async fn validate(&self, value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        match numeric(value) {
            Some(n) => (n <= self.max).into(),
            None => ValidationOutcome::Invalid,
        }
    }
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String must match a regular expression (anywhere, anchor it if needed)
pub struct Pattern {
    regex: Regex,
    message: String,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, BinderError> {
        let regex = Regex::new(pattern).map_err(|e| BinderError::InvalidPattern {
            pattern: pattern.to_string(),
            details: e.to_string(),
        })?;
        Ok(Self {
            regex,
            message: format!("must match \"{}\"", pattern),
        })
    }
}

#[async_trait]
impl Validator for Pattern {
    fn message(&self) -> &str {
        &self.message
    }

    async fn validate(&self, value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        match value {
            Some(Value::String(s)) => self.regex.is_match(s).into(),
            Some(other) if !other.is_null() => {
                self.regex.is_match(&other.to_json().to_string()).into()
            }
            _ => ValidationOutcome::Invalid,
        }
    }
}

pub struct Email {
    message: String,
}

impl Email {
    pub fn new() -> Self {
        Self {
            message: "must be a well-formed email address".to_string(),
        }
    }
}

impl Default for Email {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for Email {
    fn message(&self) -> &str {
        &self.message
    }

    async fn validate(&self, value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        match value.and_then(Value::as_str) {
            Some(s) => EMAIL_REGEX.is_match(s).into(),
            None => ValidationOutcome::Invalid,
        }
    }
}

/// Declarative validator as written in schema files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorSpec {
    Required,
    NotNull,
    NotBlank,
    Size { min: usize, max: usize },
    Min(f64),
    Max(f64),
    Pattern(String),
    Email,
}

impl ValidatorSpec {
    /// Instantiate the validator
    pub fn build(&self) -> Result<Arc<dyn Validator>, BinderError> {
        let validator: Arc<dyn Validator> = match self {
            ValidatorSpec::Required => Arc::new(Required::new()),
            ValidatorSpec::NotNull => Arc::new(NotNull::new()),
            ValidatorSpec::NotBlank => Arc::new(NotBlank::new()),
            ValidatorSpec::Size { min, max } => Arc::new(Size::new(*min, *max)),
            ValidatorSpec::Min(min) => Arc::new(Min::new(*min)),
            ValidatorSpec::Max(max) => Arc::new(Max::new(*max)),
            ValidatorSpec::Pattern(pattern) => Arc::new(Pattern::new(pattern)?),
            ValidatorSpec::Email => Arc::new(Email::new()),
        };
        Ok(validator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Schema, TypeRef};

    fn binder() -> Binder {
        Binder::new(Schema::new(), TypeRef::String).unwrap()
    }

    async fn passes(validator: &dyn Validator, value: Option<Value>) -> bool {
        matches!(
            validator.validate(value.as_ref(), &binder()).await,
            ValidationOutcome::Valid
        )
    }

    #[tokio::test]
    async fn required_rejects_blank() {
        let v = Required::new();
        assert!(v.implies_required());
        assert!(!passes(&v, None).await);
        assert!(!passes(&v, Some(Value::from(""))).await);
        assert!(passes(&v, Some(Value::from("x"))).await);
        assert!(passes(&v, Some(Value::from(false))).await);
    }

    #[tokio::test]
    async fn not_blank_trims() {
        let v = NotBlank::new();
        assert!(!passes(&v, Some(Value::from("   "))).await);
        assert!(passes(&v, Some(Value::from(" a "))).await);
    }

    #[tokio::test]
    async fn size_counts_chars_and_items() {
        let v = Size::new(1, 3);
        assert!(v.implies_required());
        assert!(passes(&v, Some(Value::from("héé"))).await);
        assert!(!passes(&v, Some(Value::from("abcd"))).await);
        assert!(!passes(&v, Some(Value::array([]))).await);
        assert!(!Size::new(0, 3).implies_required());
    }

    #[tokio::test]
    async fn min_max_accept_numeric_strings() {
        assert!(passes(&Min::new(18.0), Some(Value::from(18))).await);
        assert!(passes(&Min::new(18.0), Some(Value::from("21"))).await);
        assert!(!passes(&Min::new(18.0), Some(Value::from(17.5))).await);
        assert!(!passes(&Max::new(10.0), Some(Value::from("abc"))).await);
    }

    #[tokio::test]
    async fn email_and_pattern() {
        let email = Email::new();
        assert!(passes(&email, Some(Value::from("a@x.com"))).await);
        assert!(!passes(&email, Some(Value::from("a@x"))).await);

        let zip = Pattern::new(r"^\d{5}$").unwrap();
        assert!(passes(&zip, Some(Value::from("12345"))).await);
        assert!(!passes(&zip, Some(Value::from("1234"))).await);
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let err = Pattern::new("(").err().unwrap();
        assert!(err.to_string().contains("FORM-014"));
    }

    #[test]
    fn specs_parse_from_yaml() {
        let specs: Vec<ValidatorSpec> = serde_yaml::from_str(
            r#"
- required
- size: { min: 1, max: 5 }
- min: 0
- pattern: "^[A-Z]"
- email
"#,
        )
        .unwrap();
        assert_eq!(specs[0], ValidatorSpec::Required);
        assert_eq!(specs[1], ValidatorSpec::Size { min: 1, max: 5 });
        assert_eq!(specs[2], ValidatorSpec::Min(0.0));
        assert!(specs.iter().all(|s| s.build().is_ok()));
    }
}
