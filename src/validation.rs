//! Validator contract and validation results
//!
//! A validator inspects the value of the node it is attached to and answers
//! with a [`ValidationOutcome`]. Outcomes are turned into [`ValueError`]s by
//! the binder, which also decides where in the tree each error lands (see
//! [`ValueError::property`]).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::binder::Binder;
use crate::model::Model;
use crate::path::NodePath;
use crate::value::Value;

/// Validation capability attached to a node
#[async_trait]
pub trait Validator: Send + Sync {
    /// Message used for errors that do not carry their own
    fn message(&self) -> &str;

    /// Whether the presence of this validator makes the node `required`
    fn implies_required(&self) -> bool {
        false
    }

    /// Whether the validator still runs on an empty value of an optional node
    fn validates_empty(&self) -> bool {
        self.implies_required()
    }

    /// Check `value` (undefined is `None`)
    ///
    /// `binder` gives access to the rest of the tree for cross-field rules.
    async fn validate(&self, value: Option<&Value>, binder: &Binder) -> ValidationOutcome;
}

/// Target of a validation error
#[derive(Clone)]
pub enum Property {
    /// Explicit dotted path, e.g. `items[0].name`
    Path(String),
    /// A descriptor instance of the same binder
    Model(Model),
}

impl Property {
    /// Resolved path string
    pub fn name(&self) -> String {
        match self {
            Property::Path(path) => path.clone(),
            Property::Model(model) => model.name(),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Property::Model(model) => f.debug_tuple("Model").field(&model.name()).finish(),
        }
    }
}

impl From<&str> for Property {
    fn from(path: &str) -> Self {
        Property::Path(path.to_string())
    }
}

impl From<String> for Property {
    fn from(path: String) -> Self {
        Property::Path(path)
    }
}

impl From<Model> for Property {
    fn from(model: Model) -> Self {
        Property::Model(model)
    }
}

impl From<&Model> for Property {
    fn from(model: &Model) -> Self {
        Property::Model(model.clone())
    }
}

/// One rejection reported by a validator
#[derive(Debug, Clone, Default)]
pub struct ValidationIssue {
    /// Where the error belongs; defaults to the validated node
    pub property: Option<Property>,
    /// Overrides the validator message
    pub message: Option<String>,
}

impl ValidationIssue {
    pub fn at(property: impl Into<Property>) -> Self {
        Self {
            property: Some(property.into()),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Validator answer
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid,
    /// One error on the validated node, with the validator message
    Invalid,
    /// Zero or more explicit issues; an empty list means valid
    Issues(Vec<ValidationIssue>),
}

impl From<bool> for ValidationOutcome {
    fn from(valid: bool) -> Self {
        if valid {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid
        }
    }
}

impl From<ValidationIssue> for ValidationOutcome {
    fn from(issue: ValidationIssue) -> Self {
        ValidationOutcome::Issues(vec![issue])
    }
}

impl From<Vec<ValidationIssue>> for ValidationOutcome {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        ValidationOutcome::Issues(issues)
    }
}

impl ValidationOutcome {
    /// Materialize errors for a validator run on the node named `node_name`
    pub fn into_errors(
        self,
        node_name: &str,
        value: Option<&Value>,
        validator: &Arc<dyn Validator>,
    ) -> Vec<ValueError> {
        let make = |property: String, message: Option<String>| ValueError {
            property,
            message: message.unwrap_or_else(|| validator.message().to_string()),
            value: value.cloned(),
            validator: Some(Arc::clone(validator)),
        };

        match self {
            ValidationOutcome::Valid => Vec::new(),
            ValidationOutcome::Invalid => vec![make(node_name.to_string(), None)],
            ValidationOutcome::Issues(issues) => issues
                .into_iter()
                .map(|issue| {
                    let property = issue
                        .property
                        .map(|p| p.name())
                        .unwrap_or_else(|| node_name.to_string());
                    make(property, issue.message)
                })
                .collect(),
        }
    }
}

/// A validation error attributed to a path
#[derive(Clone)]
pub struct ValueError {
    /// Resolved dotted path of the node the error belongs to
    pub property: String,
    pub message: String,
    /// Value of the validated node when the validator ran
    pub value: Option<Value>,
    /// Producing validator; `None` for server-reported violations
    pub validator: Option<Arc<dyn Validator>>,
}

impl ValueError {
    /// Parsed [`ValueError::property`]; unparseable paths match no node
    pub fn path(&self) -> Option<NodePath> {
        NodePath::parse(&self.property).ok()
    }
}

impl PartialEq for ValueError {
    fn eq(&self, other: &Self) -> bool {
        let same_validator = match (&self.validator, &other.validator) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.property == other.property
            && self.message == other.message
            && self.value == other.value
            && same_validator
    }
}

impl fmt::Debug for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueError")
            .field("property", &self.property)
            .field("message", &self.message)
            .field("value", &self.value)
            .finish()
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.property, self.message)
        }
    }
}

/// Validity reported by a bound input control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityState {
    pub valid: bool,
    /// Control-provided explanation, e.g. "Please enter a valid date"
    pub message: String,
}

impl ValidityState {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Synthetic validator standing in for an invalid control
///
/// The control value may not even parse, so the configured validators are
/// skipped and this one fails unconditionally.
pub struct ValidityStateValidator {
    message: String,
}

impl ValidityStateValidator {
    pub fn new(state: &ValidityState) -> Self {
        Self {
            message: state.message.clone(),
        }
    }
}

#[async_trait]
impl Validator for ValidityStateValidator {
    fn message(&self) -> &str {
        &self.message
    }

    fn validates_empty(&self) -> bool {
        true
    }

    async fn validate(&self, _value: Option<&Value>, _binder: &Binder) -> ValidationOutcome {
        ValidationOutcome::Invalid
    }
}

type SyncCheck = dyn Fn(Option<&Value>, &Binder) -> ValidationOutcome + Send + Sync;

/// Closure-backed synchronous validator
///
/// ```ignore
/// let emails_match = FnValidator::new("Emails do not match", move |value, _| {
///     let value = value.and_then(Value::as_object);
///     // compare fields, point the error at `other_email`
///     ValidationIssue::at(&other_email).into()
/// });
/// ```
pub struct FnValidator {
    message: String,
    implies_required: bool,
    check: Box<SyncCheck>,
}

impl FnValidator {
    pub fn new<F>(message: impl Into<String>, check: F) -> Self
    where
        F: Fn(Option<&Value>, &Binder) -> ValidationOutcome + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            implies_required: false,
            check: Box::new(check),
        }
    }

    pub fn required(mut self) -> Self {
        self.implies_required = true;
        self
    }
}

#[async_trait]
impl Validator for FnValidator {
    fn message(&self) -> &str {
        &self.message
    }

    fn implies_required(&self) -> bool {
        self.implies_required
    }

    async fn validate(&self, value: Option<&Value>, binder: &Binder) -> ValidationOutcome {
        (self.check)(value, binder)
    }
}

type AsyncCheck = dyn Fn(Option<Value>, Binder) -> BoxFuture<'static, ValidationOutcome> + Send + Sync;

/// Closure-backed asynchronous validator, e.g. a uniqueness check against a service
pub struct AsyncFnValidator {
    message: String,
    check: Box<AsyncCheck>,
}

impl AsyncFnValidator {
    pub fn new<F>(message: impl Into<String>, check: F) -> Self
    where
        F: Fn(Option<Value>, Binder) -> BoxFuture<'static, ValidationOutcome> + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            check: Box::new(check),
        }
    }
}

#[async_trait]
impl Validator for AsyncFnValidator {
    fn message(&self) -> &str {
        &self.message
    }

    async fn validate(&self, value: Option<&Value>, binder: &Binder) -> ValidationOutcome {
        (self.check)(value.cloned(), binder.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(message: &str) -> Arc<dyn Validator> {
        Arc::new(FnValidator::new(message, |_, _| ValidationOutcome::Valid))
    }

    #[test]
    fn invalid_targets_validated_node() {
        let v = validator("bad");
        let errors = ValidationOutcome::Invalid.into_errors("name", Some(&Value::from("x")), &v);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property, "name");
        assert_eq!(errors[0].message, "bad");
        assert_eq!(errors[0].value, Some(Value::from("x")));
    }

    #[test]
    fn issues_default_property_and_message() {
        let v = validator("mismatch");
        let outcome = ValidationOutcome::from(vec![
            ValidationIssue::at("otherEmail"),
            ValidationIssue::default().with_message("custom"),
        ]);
        let errors = outcome.into_errors("", None, &v);
        assert_eq!(errors[0].property, "otherEmail");
        assert_eq!(errors[0].message, "mismatch");
        assert_eq!(errors[1].property, "");
        assert_eq!(errors[1].message, "custom");
    }

    #[test]
    fn empty_issue_list_is_valid() {
        let v = validator("x");
        assert!(ValidationOutcome::Issues(vec![])
            .into_errors("a", None, &v)
            .is_empty());
        assert!(ValidationOutcome::from(true).into_errors("a", None, &v).is_empty());
    }

    #[test]
    fn value_error_path_accepts_brackets() {
        let err = ValueError {
            property: "items[1].name".to_string(),
            message: "m".to_string(),
            value: None,
            validator: None,
        };
        assert_eq!(err.path().unwrap().to_string(), "items.1.name");
        assert_eq!(err.to_string(), "items[1].name: m");
    }

    #[test]
    fn validity_validator_runs_on_empty() {
        let v = ValidityStateValidator::new(&ValidityState::invalid("Bad date"));
        assert!(v.validates_empty());
        assert!(!v.implies_required());
        assert_eq!(v.message(), "Bad date");
    }
}
