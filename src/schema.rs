//! Structural descriptors
//!
//! A [`Schema`] is the static shape of a bound value: a registry of named
//! object models whose fields are typed with [`TypeRef`]s. Named references
//! are how self-referential shapes are written without ownership cycles:
//!
//! ```yaml
//! models:
//!   Person:
//!     fields:
//!       - name: name
//!         type: string
//!         validators: [not_blank]
//!       - name: address
//!         type: Address
//!       - name: friends
//!         type: [Person]
//!       - name: manager
//!         type: Person
//!         optional: true
//!   Address:
//!     fields:
//!       - { name: city, type: string }
//! ```
//!
//! Schemas are immutable once compiled and cheap to clone.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BinderError;
use crate::path::Key;
use crate::validation::Validator;
use crate::validators::ValidatorSpec;
use crate::value::{Map, Value};

/// Type of a field, array item or root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawType", into = "RawType")]
pub enum TypeRef {
    String,
    Number,
    Boolean,
    /// Object model declared under `models:`
    Named(String),
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn array_of(item: TypeRef) -> Self {
        TypeRef::Array(Box::new(item))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeRef::String | TypeRef::Number | TypeRef::Boolean)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::String => f.write_str("string"),
            TypeRef::Number => f.write_str("number"),
            TypeRef::Boolean => f.write_str("boolean"),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Array(item) => write!(f, "[{}]", item),
        }
    }
}

/// YAML spelling: `string`, `Address`, `[Address]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawType {
    Name(String),
    List(Vec<RawType>),
}

impl TryFrom<RawType> for TypeRef {
    type Error = String;

    fn try_from(raw: RawType) -> Result<Self, Self::Error> {
        match raw {
            RawType::Name(name) => Ok(match name.as_str() {
                "string" => TypeRef::String,
                "number" => TypeRef::Number,
                "boolean" => TypeRef::Boolean,
                _ => TypeRef::Named(name),
            }),
            RawType::List(mut items) => {
                if items.len() != 1 {
                    return Err(format!(
                        "array type must list exactly one item type, got {}",
                        items.len()
                    ));
                }
                let item = TypeRef::try_from(items.remove(0))?;
                Ok(TypeRef::Array(Box::new(item)))
            }
        }
    }
}

impl From<TypeRef> for RawType {
    fn from(ty: TypeRef) -> Self {
        match ty {
            TypeRef::Array(item) => RawType::List(vec![RawType::from(*item)]),
            other => RawType::Name(other.to_string()),
        }
    }
}

/// Field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Optional fields are left out of empty values
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            validators: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn validator(mut self, spec: ValidatorSpec) -> Self {
        self.validators.push(spec);
        self
    }
}

/// Object model declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Model-level validators, run against the whole object
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
}

impl ModelDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn validator(mut self, spec: ValidatorSpec) -> Self {
        self.validators.push(spec);
        self
    }
}

/// Schema file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    #[serde(default)]
    pub models: BTreeMap<String, ModelDef>,
}

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, name: impl Into<String>, model: ModelDef) -> Self {
        self.models.insert(name.into(), model);
        self
    }
}

/// Compiled field: validators instantiated once so their identity is stable
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub optional: bool,
    pub validators: Vec<Arc<dyn Validator>>,
}

pub struct ObjectModel {
    pub name: String,
    pub fields: Vec<Field>,
    pub validators: Vec<Arc<dyn Validator>>,
}

impl ObjectModel {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Structural view of a [`TypeRef`]
pub enum Shape<'a> {
    Scalar,
    Object(&'a ObjectModel),
    Array(&'a TypeRef),
}

/// Compiled, validated schema
#[derive(Clone, Default)]
pub struct Schema {
    models: Arc<BTreeMap<String, ObjectModel>>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Schema {
    /// Schema without named models (scalar and array-of-scalar roots only)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, BinderError> {
        let def: SchemaDef = serde_yaml::from_str(yaml)?;
        Self::compile(def)
    }

    pub fn from_file(path: &Path) -> Result<Self, BinderError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Check references and instantiate validators
    pub fn compile(def: SchemaDef) -> Result<Self, BinderError> {
        for (model_name, model) in &def.models {
            let mut seen = HashSet::new();
            for field in &model.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(BinderError::DuplicateField {
                        model: model_name.clone(),
                        field: field.name.clone(),
                    });
                }
                check_reference(&def, &field.ty, &format!("{}.{}", model_name, field.name))?;
            }
        }
        check_required_cycles(&def)?;

        let mut models = BTreeMap::new();
        for (name, model) in def.models {
            let fields = model
                .fields
                .into_iter()
                .map(|f| {
                    Ok(Field {
                        validators: build_all(&f.validators)?,
                        name: f.name,
                        ty: f.ty,
                        optional: f.optional,
                    })
                })
                .collect::<Result<Vec<_>, BinderError>>()?;
            let compiled = ObjectModel {
                name: name.clone(),
                fields,
                validators: build_all(&model.validators)?,
            };
            models.insert(name, compiled);
        }

        Ok(Self {
            models: Arc::new(models),
        })
    }

    pub fn model(&self, name: &str) -> Option<&ObjectModel> {
        self.models.get(name)
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Ensure every named type in `ty` is declared
    pub fn check_type(&self, ty: &TypeRef, referenced_by: &str) -> Result<(), BinderError> {
        match ty {
            TypeRef::Named(name) if !self.models.contains_key(name) => {
                Err(BinderError::UnknownType {
                    name: name.clone(),
                    referenced_by: referenced_by.to_string(),
                })
            }
            TypeRef::Array(item) => self.check_type(item, referenced_by),
            _ => Ok(()),
        }
    }

    /// Structural kind of `ty`; unknown names read as scalars
    pub fn shape<'a>(&'a self, ty: &'a TypeRef) -> Shape<'a> {
        match ty {
            TypeRef::Named(name) => match self.models.get(name) {
                Some(model) => Shape::Object(model),
                None => Shape::Scalar,
            },
            TypeRef::Array(item) => Shape::Array(item),
            _ => Shape::Scalar,
        }
    }

    /// Type reached from `ty` through `key`
    pub fn child_type(&self, ty: &TypeRef, key: &Key) -> Option<TypeRef> {
        match (self.shape(ty), key) {
            (Shape::Object(model), Key::Field(name)) => model.field(name).map(|f| f.ty.clone()),
            (Shape::Array(item), Key::Index(_)) => Some(item.clone()),
            _ => None,
        }
    }

    /// Empty value factory
    ///
    /// Optional fields are omitted, which is also what stops recursion for
    /// self-referential models.
    pub fn empty_value(&self, ty: &TypeRef) -> Value {
        match ty {
            TypeRef::String => Value::from(""),
            TypeRef::Number => Value::from(0),
            TypeRef::Boolean => Value::from(false),
            TypeRef::Array(_) => Value::array([]),
            TypeRef::Named(name) => match self.models.get(name) {
                Some(model) => {
                    let map: Map = model
                        .fields
                        .iter()
                        .filter(|f| !f.optional)
                        .map(|f| (f.name.clone(), self.empty_value(&f.ty)))
                        .collect();
                    Value::Object(Arc::new(map))
                }
                None => Value::Null,
            },
        }
    }
}

fn build_all(specs: &[ValidatorSpec]) -> Result<Vec<Arc<dyn Validator>>, BinderError> {
    specs.iter().map(ValidatorSpec::build).collect()
}

fn check_reference(def: &SchemaDef, ty: &TypeRef, referenced_by: &str) -> Result<(), BinderError> {
    match ty {
        TypeRef::Named(name) if !def.models.contains_key(name) => Err(BinderError::UnknownType {
            name: name.clone(),
            referenced_by: referenced_by.to_string(),
        }),
        TypeRef::Array(item) => check_reference(def, item, referenced_by),
        _ => Ok(()),
    }
}

/// Reject cycles made only of required object fields
///
/// Their empty value would be infinite. Optional fields and arrays (empty
/// value `[]`) break cycles.
fn check_required_cycles(def: &SchemaDef) -> Result<(), BinderError> {
    fn visit<'a>(
        def: &'a SchemaDef,
        name: &'a str,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Result<(), BinderError> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(pos) = stack.iter().position(|n| *n == name) {
            let mut cycle: Vec<&str> = stack[pos..].to_vec();
            cycle.push(name);
            return Err(BinderError::RequiredCycle {
                cycle: cycle.join(" -> "),
            });
        }

        stack.push(name);
        if let Some(model) = def.models.get(name) {
            for field in model.fields.iter().filter(|f| !f.optional) {
                if let TypeRef::Named(next) = &field.ty {
                    visit(def, next, stack, done)?;
                }
            }
        }
        stack.pop();
        done.insert(name);
        Ok(())
    }

    let mut done = HashSet::new();
    for name in def.models.keys() {
        visit(def, name, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}
