//! Positioned descriptor instances
//!
//! A [`Model`] is a schema type at a concrete position in one binder's tree:
//! `binder.model().field("address")?.field("city")?`. It is the handle
//! application code navigates with, validators point errors at, and
//! [`crate::BinderNode::for_model`] resolves to a node.

use std::fmt;
use std::sync::Arc;

use crate::error::BinderError;
use crate::path::{Key, NodePath};
use crate::schema::{Field, Schema, Shape, TypeRef};
use crate::validation::Validator;
use crate::value::Value;

/// Container kind of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Scalar,
    Object,
    Array,
}

#[derive(Clone)]
pub struct Model {
    binder_id: u64,
    schema: Schema,
    path: NodePath,
    /// Types from the root down to this model, one more than path keys
    types: Arc<Vec<TypeRef>>,
}

impl Model {
    pub(crate) fn root(binder_id: u64, schema: Schema, ty: TypeRef) -> Self {
        Self {
            binder_id,
            schema,
            path: NodePath::root(),
            types: Arc::new(vec![ty]),
        }
    }

    pub(crate) fn binder_id(&self) -> u64 {
        self.binder_id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Dotted path from the root, empty for the root
    pub fn name(&self) -> String {
        self.path.to_string()
    }

    /// Key by which the parent reaches this model
    pub fn key(&self) -> Option<&Key> {
        self.path.key()
    }

    pub fn ty(&self) -> &TypeRef {
        &self.types[self.types.len() - 1]
    }

    pub fn kind(&self) -> ModelKind {
        match self.schema.shape(self.ty()) {
            Shape::Scalar => ModelKind::Scalar,
            Shape::Object(_) => ModelKind::Object,
            Shape::Array(_) => ModelKind::Array,
        }
    }

    pub fn is_array(&self) -> bool {
        self.kind() == ModelKind::Array
    }

    pub fn parent(&self) -> Option<Model> {
        let path = self.path.parent()?;
        let types = self.types[..self.types.len() - 1].to_vec();
        Some(Self {
            binder_id: self.binder_id,
            schema: self.schema.clone(),
            path,
            types: Arc::new(types),
        })
    }

    /// Kind of the structural parent, `None` at the root
    pub fn parent_kind(&self) -> Option<ModelKind> {
        self.parent().map(|p| p.kind())
    }

    pub fn child(&self, key: &Key) -> Result<Model, BinderError> {
        // Numeric segments name a field when the container is an object
        if let (Key::Index(index), ModelKind::Object) = (key, self.kind()) {
            return self.field(&index.to_string());
        }
        let ty = self.schema.child_type(self.ty(), key).ok_or_else(|| match key {
            Key::Field(field) => BinderError::UnknownField {
                model: self.ty().to_string(),
                field: field.clone(),
            },
            Key::Index(_) => BinderError::NotAnArray { path: self.name() },
        })?;

        let mut types = self.types.to_vec();
        types.push(ty);
        Ok(Self {
            binder_id: self.binder_id,
            schema: self.schema.clone(),
            path: self.path.child(key.clone()),
            types: Arc::new(types),
        })
    }

    pub fn field(&self, name: &str) -> Result<Model, BinderError> {
        self.child(&Key::Field(name.to_string()))
    }

    pub fn item(&self, index: usize) -> Result<Model, BinderError> {
        self.child(&Key::Index(index))
    }

    /// Navigate a relative path such as `items[0].name`
    pub fn at(&self, path: &str) -> Result<Model, BinderError> {
        NodePath::parse(path)?
            .keys()
            .iter()
            .try_fold(self.clone(), |model, key| model.child(key))
    }

    /// Field declarations of an object model, empty otherwise
    pub fn fields(&self) -> &[Field] {
        match self.schema.shape(self.ty()) {
            Shape::Object(model) => &model.fields,
            _ => &[],
        }
    }

    /// Declaration of this model in its parent object, if reached by field
    fn declaration(&self) -> Option<&Field> {
        let Key::Field(name) = self.key()? else {
            return None;
        };
        let parent_ty = self.types.get(self.types.len().checked_sub(2)?)?;
        match self.schema.shape(parent_ty) {
            Shape::Object(model) => model.field(name),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.declaration().map(|f| f.optional).unwrap_or(false)
    }

    /// Validators a fresh node starts with: field constraints, then model-level rules
    pub fn default_validators(&self) -> Vec<Arc<dyn Validator>> {
        let mut validators: Vec<Arc<dyn Validator>> = self
            .declaration()
            .map(|f| f.validators.clone())
            .unwrap_or_default();
        if let Shape::Object(model) = self.schema.shape(self.ty()) {
            validators.extend(model.validators.iter().cloned());
        }
        validators
    }

    pub fn empty_value(&self) -> Value {
        self.schema.empty_value(self.ty())
    }

    /// Empty value of the item type, `None` for non-arrays
    pub fn empty_item_value(&self) -> Option<Value> {
        match self.schema.shape(self.ty()) {
            Shape::Array(item) => Some(self.schema.empty_value(item)),
            _ => None,
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("path", &self.name())
            .field("type", &self.ty().to_string())
            .finish()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.binder_id == other.binder_id && self.path == other.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, ModelDef, SchemaDef};
    use crate::validators::ValidatorSpec;

    fn schema() -> Schema {
        Schema::compile(
            SchemaDef::new()
                .model(
                    "Order",
                    ModelDef::new()
                        .field(
                            FieldDef::new("customer", TypeRef::String)
                                .validator(ValidatorSpec::Required),
                        )
                        .field(FieldDef::new("lines", TypeRef::array_of(TypeRef::named("Line"))))
                        .field(FieldDef::new("note", TypeRef::String).optional()),
                )
                .model(
                    "Line",
                    ModelDef::new()
                        .field(FieldDef::new("sku", TypeRef::String))
                        .validator(ValidatorSpec::NotNull),
                ),
        )
        .unwrap()
    }

    fn root() -> Model {
        Model::root(7, schema(), TypeRef::named("Order"))
    }

    #[test]
    fn navigation_builds_paths() {
        let sku = root().field("lines").unwrap().item(2).unwrap().field("sku").unwrap();
        assert_eq!(sku.name(), "lines.2.sku");
        assert_eq!(sku.kind(), ModelKind::Scalar);
        assert_eq!(sku.parent().unwrap().kind(), ModelKind::Object);
        assert_eq!(sku.parent_kind(), Some(ModelKind::Object));
        assert_eq!(root().at("lines[2].sku").unwrap(), sku);
    }

    #[test]
    fn numeric_segment_names_object_field() {
        let schema = Schema::compile(
            SchemaDef::new().model(
                "Codes",
                ModelDef::new().field(FieldDef::new("0", TypeRef::String)),
            ),
        )
        .unwrap();
        let root = Model::root(1, schema, TypeRef::named("Codes"));
        let zero = root.at("0").unwrap();
        assert_eq!(zero.key(), Some(&Key::Field("0".to_string())));
        assert_eq!(zero.kind(), ModelKind::Scalar);
        assert!(root.at("1").is_err());
    }

    #[test]
    fn navigation_errors() {
        let err = root().field("missing").err().unwrap();
        assert!(matches!(err, BinderError::UnknownField { .. }));
        let err = root().field("customer").unwrap().item(0).err().unwrap();
        assert!(matches!(err, BinderError::NotAnArray { .. }));
    }

    #[test]
    fn default_validators_merge_field_and_model() {
        assert_eq!(root().field("customer").unwrap().default_validators().len(), 1);
        let line = root().at("lines.0").unwrap();
        assert_eq!(line.default_validators().len(), 1);
        assert!(root().default_validators().is_empty());
    }

    #[test]
    fn optional_flag_comes_from_declaration() {
        assert!(root().field("note").unwrap().is_optional());
        assert!(!root().field("customer").unwrap().is_optional());
        assert!(!root().is_optional());
    }

    #[test]
    fn empty_item_value_only_for_arrays() {
        let lines = root().field("lines").unwrap();
        assert_eq!(
            lines.empty_item_value().unwrap().to_json(),
            serde_json::json!({"sku": ""})
        );
        assert!(root().empty_item_value().is_none());
    }
}
