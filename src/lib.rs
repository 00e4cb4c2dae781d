//! formbind - hierarchical data binding and validation for structured values

pub mod binder;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod node;
pub mod path;
pub mod schema;
pub mod validation;
pub mod validators;
pub mod value;

pub use binder::{Binder, ServerViolation, SubmitFailure};
pub use config::BinderConfig;
pub use error::{BinderError, FixSuggestion};
pub use model::{Model, ModelKind};
pub use node::BinderNode;
pub use path::{Key, NodePath};
pub use schema::{FieldDef, ModelDef, Schema, SchemaDef, TypeRef};
pub use validation::{
    AsyncFnValidator, FnValidator, Property, ValidationIssue, ValidationOutcome, ValidityState,
    Validator, ValueError,
};
pub use validators::ValidatorSpec;
pub use value::Value;
