//! Binding nodes
//!
//! A [`BinderNode`] is a handle on one position of the bound value tree. It
//! carries no value of its own: reads project the root value through the
//! parent chain, writes rebuild every container on the way back up and end
//! in a single root replacement. Per-node validation state (visited flag,
//! validators, own errors) lives in the binder's node arena, keyed by path.
//!
//! Nodes are created on demand. Creating a node registers its ancestors
//! first and then materializes an empty value wherever a descendant needs
//! a container to exist.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, trace, warn};

use crate::binder::Binder;
use crate::error::BinderError;
use crate::model::{Model, ModelKind};
use crate::path::{Key, NodePath};
use crate::validation::{ValidityState, ValidityStateValidator, Validator, ValueError};
use crate::value::{Map, Value};

/// Validation state of one node, owned by the binder
#[derive(Default)]
pub(crate) struct NodeState {
    visited: bool,
    validators: Vec<Arc<dyn Validator>>,
    own_errors: Vec<ValueError>,
    /// Memoized empty item of an array node, shared by all its item nodes
    default_array_item: Option<Value>,
    validity: Option<ValidityState>,
    /// Set only while `validity` reports an invalid control
    validity_validator: Option<Arc<dyn Validator>>,
}

impl NodeState {
    fn new(validators: Vec<Arc<dyn Validator>>) -> Self {
        Self {
            validators,
            ..Self::default()
        }
    }

    /// Forget visited flag and errors; true if either was set
    pub(crate) fn clear_validation(&mut self) -> bool {
        let changed = self.visited || !self.own_errors.is_empty();
        self.visited = false;
        self.own_errors.clear();
        changed
    }
}

/// Handle on one node of a binder's tree
#[derive(Clone)]
pub struct BinderNode {
    binder: Binder,
    model: Model,
}

impl BinderNode {
    pub(crate) fn new(binder: Binder, model: Model) -> Self {
        let node = Self { binder, model };
        if let Err(err) = node.register() {
            warn!(node = %node.name(), error = %err, "could not initialize value");
        }
        node
    }

    /// Like `new`, but fails when the value cannot be materialized
    pub(crate) fn try_new(binder: Binder, model: Model) -> Result<Self, BinderError> {
        let node = Self { binder, model };
        node.register()?;
        Ok(node)
    }

    fn register(&self) -> Result<(), BinderError> {
        if self.binder.nodes().contains_key(self.path()) {
            return Ok(());
        }
        if let Some(parent) = self.model.parent() {
            BinderNode::try_new(self.binder.clone(), parent)?;
        }

        let inserted = match self.binder.nodes().entry(self.path().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(NodeState::new(self.model.default_validators()));
                true
            }
        };
        if inserted {
            trace!(node = %self.name(), "node registered");
            if let Err(err) = self.initialize_value(false) {
                // Unregister so the next lookup reports the failure again
                self.binder.nodes().remove(self.path());
                return Err(err);
            }
        }
        Ok(())
    }

    /// Read access to this node's state; the closure must not touch other nodes
    fn with_state<R>(&self, f: impl FnOnce(&NodeState) -> R) -> R {
        match self.binder.nodes().get(self.path()) {
            Some(state) => f(&state),
            None => f(&NodeState::default()),
        }
    }

    fn with_state_mut<R>(&self, f: impl FnOnce(&mut NodeState) -> R) -> R {
        let mut state = self
            .binder
            .nodes()
            .entry(self.path().clone())
            .or_insert_with(|| NodeState::new(self.model.default_validators()));
        f(&mut state)
    }

    // ─────────────────────────────────────────────────────────────
    // Tree
    // ─────────────────────────────────────────────────────────────

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn path(&self) -> &NodePath {
        self.model.path()
    }

    /// Dotted path from the root, empty for the root
    pub fn name(&self) -> String {
        self.model.name()
    }

    pub fn is_root(&self) -> bool {
        self.path().is_root()
    }

    pub fn parent(&self) -> Option<BinderNode> {
        self.model
            .parent()
            .map(|model| BinderNode::new(self.binder.clone(), model))
    }

    /// Node for any descriptor instance of the same binder
    pub fn for_model(&self, model: &Model) -> Result<BinderNode, BinderError> {
        if model.binder_id() != self.binder.id() {
            return Err(BinderError::UnknownBinder { path: model.name() });
        }
        BinderNode::try_new(self.binder.clone(), model.clone())
    }

    pub fn field(&self, name: &str) -> Result<BinderNode, BinderError> {
        let model = self.model.field(name)?;
        BinderNode::try_new(self.binder.clone(), model)
    }

    pub fn item(&self, index: usize) -> Result<BinderNode, BinderError> {
        let model = self.model.item(index)?;
        BinderNode::try_new(self.binder.clone(), model)
    }

    /// Direct children that currently exist
    ///
    /// Objects list their mandatory fields plus optional fields that have a
    /// value, a default value, or an already registered node. Arrays list one
    /// node per current item. Nothing is listed while the value or the
    /// default value is undefined.
    pub fn children(&self) -> Vec<BinderNode> {
        let Some(value) = self.value() else {
            return Vec::new();
        };

        match self.model.kind() {
            ModelKind::Object => {
                let Some(default) = self.default_value() else {
                    return Vec::new();
                };
                let has_key = |v: &Value, name: &str| {
                    v.as_object().map(|m| m.contains_key(name)).unwrap_or(false)
                };
                self.model
                    .fields()
                    .iter()
                    .filter(|field| {
                        !field.optional
                            || has_key(&value, &field.name)
                            || has_key(&default, &field.name)
                            || self
                                .binder
                                .nodes()
                                .contains_key(&self.path().field(field.name.as_str()))
                    })
                    .filter_map(|field| self.model.field(&field.name).ok())
                    .map(|model| BinderNode::new(self.binder.clone(), model))
                    .collect()
            }
            ModelKind::Array => {
                let len = value.as_array().map(<[Value]>::len).unwrap_or(0);
                (0..len)
                    .filter_map(|index| self.model.item(index).ok())
                    .map(|model| BinderNode::new(self.binder.clone(), model))
                    .collect()
            }
            ModelKind::Scalar => Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Value
    // ─────────────────────────────────────────────────────────────

    /// Current value, projected from the parent (the root reads the binder)
    pub fn value(&self) -> Option<Value> {
        let (Some(parent), Some(key)) = (self.parent(), self.path().key()) else {
            return self.binder.value();
        };
        let parent_value = match parent.value() {
            Some(value) => Some(value),
            None => {
                parent.initialize_or_warn();
                parent.value()
            }
        };
        parent_value?.get(key).cloned()
    }

    /// Replace this node's value
    ///
    /// Setting the identical value is a no-op. `None` removes an object
    /// field; it is rejected for array items and the root.
    pub fn set_value(&self, value: Option<Value>) -> Result<(), BinderError> {
        if Value::same_opt(value.as_ref(), self.value().as_ref()) {
            return Ok(());
        }
        self.set_value_state(value, false)?;
        self.binder.prune_stale_nodes(self.path());
        Ok(())
    }

    /// Pristine value of this node
    ///
    /// Array items have no recorded defaults; they all share the array's
    /// memoized empty item.
    pub fn default_value(&self) -> Option<Value> {
        let Some(parent) = self.parent() else {
            return self.binder.default_value();
        };
        if parent.model.is_array() {
            return Some(parent.default_array_item_value());
        }
        let parent_default = match parent.default_value() {
            Some(value) => Some(value),
            None => {
                parent.initialize_or_warn();
                parent.default_value()
            }
        };
        let key = self.path().key()?;
        parent_default?.get(key).cloned()
    }

    fn default_array_item_value(&self) -> Value {
        if let Some(item) = self.with_state(|s| s.default_array_item.clone()) {
            return item;
        }
        let item = self.model.empty_item_value().unwrap_or(Value::Null);
        self.with_state_mut(|s| s.default_array_item.get_or_insert(item).clone())
    }

    /// True if the value is not the same as the default value
    pub fn dirty(&self) -> bool {
        !Value::same_opt(self.value().as_ref(), self.default_value().as_ref())
    }

    /// Materialize the empty value for an undefined node
    ///
    /// Only the root and nodes a descendant depends on are materialized.
    /// The write keeps the binder pristine when no default exists yet.
    fn initialize_value(&self, required_by_child: bool) -> Result<(), BinderError> {
        let parent = self.parent();
        if let Some(parent) = &parent {
            if parent.value().is_none() || parent.default_value().is_none() {
                parent.initialize_value(true)?;
            }
        }

        let value = match (&parent, self.path().key()) {
            (Some(parent), Some(key)) => parent.value().and_then(|v| v.get(key).cloned()),
            _ => self.binder.value(),
        };
        if value.is_some() || !(required_by_child || parent.is_none()) {
            return Ok(());
        }

        let keep_pristine = self.default_value().is_none();
        self.set_value_state(Some(self.model.empty_value()), keep_pristine)
    }

    /// Materialize for a descendant read; getters cannot fail
    fn initialize_or_warn(&self) {
        if let Err(err) = self.initialize_value(true) {
            warn!(node = %self.name(), error = %err, "could not initialize value");
        }
    }

    /// Write `value` by rebuilding each container up to the root
    fn set_value_state(&self, value: Option<Value>, keep_pristine: bool) -> Result<(), BinderError> {
        let Some(parent) = self.parent() else {
            let value = value.ok_or(BinderError::UndefinedValue { path: self.name() })?;
            self.binder.assign_value(value, keep_pristine);
            return Ok(());
        };

        let replacement = match (parent.model.kind(), self.path().key()) {
            (ModelKind::Object, Some(Key::Field(name))) => {
                let mut fields = match parent.value() {
                    Some(Value::Object(fields)) => fields.as_ref().clone(),
                    None | Some(Value::Null) => Map::new(),
                    Some(other) => {
                        return Err(BinderError::ContainerMismatch {
                            path: parent.name(),
                            expected: "object",
                            found: other.type_name(),
                        })
                    }
                };
                match value {
                    Some(value) => fields.insert(name.clone(), value),
                    None => fields.remove(name),
                };
                Value::Object(Arc::new(fields))
            }
            (ModelKind::Array, Some(Key::Index(index))) => {
                let value = value.ok_or(BinderError::UndefinedValue { path: self.name() })?;
                let mut items = match parent.value() {
                    Some(Value::Array(items)) => items.as_ref().clone(),
                    None | Some(Value::Null) => Vec::new(),
                    Some(other) => {
                        return Err(BinderError::ContainerMismatch {
                            path: parent.name(),
                            expected: "array",
                            found: other.type_name(),
                        })
                    }
                };
                if *index >= items.len() {
                    items.resize(*index + 1, Value::Null);
                }
                items[*index] = value;
                Value::from(items)
            }
            (kind, _) => {
                return Err(BinderError::ContainerMismatch {
                    path: parent.name(),
                    expected: "object or array",
                    found: match kind {
                        ModelKind::Object => "object",
                        ModelKind::Array => "array",
                        ModelKind::Scalar => "scalar",
                    },
                })
            }
        };

        parent.set_value_state(Some(replacement), keep_pristine)
    }

    // ─────────────────────────────────────────────────────────────
    // Arrays
    // ─────────────────────────────────────────────────────────────

    fn array_items(&self) -> Vec<Value> {
        self.value()
            .and_then(|v| v.as_array().map(<[Value]>::to_vec))
            .unwrap_or_default()
    }

    fn new_item(&self, item: Option<Value>) -> Result<Value, BinderError> {
        if !self.model.is_array() {
            return Err(BinderError::NotAnArray { path: self.name() });
        }
        Ok(match item {
            Some(item) => item,
            None => self.model.empty_item_value().unwrap_or(Value::Null),
        })
    }

    /// Add `item` (or the empty item) at the end of an array node
    pub fn append_item(&self, item: Option<Value>) -> Result<(), BinderError> {
        let item = self.new_item(item)?;
        let mut items = self.array_items();
        items.push(item);
        debug!(node = %self.name(), len = items.len(), "item appended");
        self.set_value(Some(Value::from(items)))
    }

    /// Add `item` (or the empty item) at the start of an array node
    pub fn prepend_item(&self, item: Option<Value>) -> Result<(), BinderError> {
        let item = self.new_item(item)?;
        let mut items = self.array_items();
        items.insert(0, item);
        debug!(node = %self.name(), len = items.len(), "item prepended");
        self.set_value(Some(Value::from(items)))
    }

    /// Remove this array item from its parent array
    pub fn remove_self(&self) -> Result<(), BinderError> {
        let not_an_item = || BinderError::NotAnArrayItem { path: self.name() };
        let parent = self.parent().ok_or_else(not_an_item)?;
        let Some(Key::Index(index)) = self.path().key() else {
            return Err(not_an_item());
        };
        if !parent.model.is_array() {
            return Err(not_an_item());
        }

        let items: Vec<Value> = parent
            .array_items()
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i != index)
            .map(|(_, item)| item)
            .collect();
        debug!(node = %self.name(), "item removed");
        parent.set_value(Some(Value::from(items)))
    }

    // ─────────────────────────────────────────────────────────────
    // Validation state
    // ─────────────────────────────────────────────────────────────

    pub fn visited(&self) -> bool {
        self.with_state(|s| s.visited)
    }

    /// Mark the node as touched; a change re-runs validation
    pub async fn set_visited(&self, visited: bool) {
        let changed = self.with_state_mut(|s| std::mem::replace(&mut s.visited, visited) != visited);
        if changed {
            self.update_validation().await;
        }
    }

    pub fn validators(&self) -> Vec<Arc<dyn Validator>> {
        self.with_state(|s| s.validators.clone())
    }

    pub fn set_validators(&self, validators: Vec<Arc<dyn Validator>>) {
        self.with_state_mut(|s| s.validators = validators);
    }

    pub fn add_validator(&self, validator: Arc<dyn Validator>) {
        self.with_state_mut(|s| s.validators.push(validator));
    }

    /// Errors attributed to exactly this node
    pub fn own_errors(&self) -> Vec<ValueError> {
        self.with_state(|s| s.own_errors.clone())
    }

    /// Descendants' errors first, then this node's own errors
    pub fn errors(&self) -> Vec<ValueError> {
        let mut errors: Vec<ValueError> = self
            .children()
            .iter()
            .flat_map(BinderNode::errors)
            .collect();
        errors.extend(self.own_errors());
        errors
    }

    pub fn invalid(&self) -> bool {
        !self.errors().is_empty()
    }

    /// True if any validator attached to this node implies presence
    pub fn required(&self) -> bool {
        self.with_state(|s| s.validators.iter().any(|v| v.implies_required()))
    }

    pub fn validity(&self) -> Option<ValidityState> {
        self.with_state(|s| s.validity.clone())
    }

    /// Report the state of the control bound to this node
    ///
    /// While the control is invalid, its message replaces all configured
    /// validators of the node.
    pub fn set_validity(&self, validity: Option<ValidityState>) {
        self.with_state_mut(|s| {
            s.validity_validator = match &validity {
                Some(state) if !state.valid => {
                    Some(Arc::new(ValidityStateValidator::new(state)) as Arc<dyn Validator>)
                }
                _ => None,
            };
            s.validity = validity;
        });
    }

    // ─────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────

    /// Validate this subtree and every ancestor
    ///
    /// Errors are deduplicated, redistributed over this subtree by path,
    /// and returned in full, including errors that point outside the subtree.
    pub async fn validate(&self) -> Vec<ValueError> {
        let mut runs = self.request_validation_of_descendants();
        runs.extend(self.request_validation_with_ancestors());
        debug!(node = %self.name(), runs = runs.len(), "validating");

        let mut errors: Vec<ValueError> = Vec::new();
        for error in join_all(runs).await.into_iter().flatten() {
            if !errors.contains(&error) {
                errors.push(error);
            }
        }
        if !errors.is_empty() {
            debug!(node = %self.name(), count = errors.len(), "validation produced errors");
        }

        self.set_errors_with_descendants(&errors);
        self.binder.update(None);
        errors
    }

    /// Store errors whose path is exactly this node, pass the rest down
    pub(crate) fn set_errors_with_descendants(&self, errors: &[ValueError]) {
        let located: Vec<(NodePath, ValueError)> = errors
            .iter()
            .filter_map(|error| Some((self.locate(error)?, error.clone())))
            .collect();
        self.distribute_errors(&located);
    }

    /// Node path an error names
    ///
    /// Numeric segments are resolved against the schema, so `codes.0` reaches
    /// an object field called `0`. Properties outside the schema fall back to
    /// the plain parse.
    fn locate(&self, error: &ValueError) -> Option<NodePath> {
        match self.binder.model().at(&error.property) {
            Ok(model) => Some(model.path().clone()),
            Err(_) => error.path(),
        }
    }

    fn distribute_errors(&self, errors: &[(NodePath, ValueError)]) {
        let path = self.path();
        let mut own = Vec::new();
        let mut related = Vec::new();
        for (error_path, error) in errors {
            if error_path == path {
                own.push(error.clone());
            } else if error_path.starts_with(path) {
                related.push((error_path.clone(), error.clone()));
            }
        }

        self.with_state_mut(|s| s.own_errors = own);

        let mut children = self.children();
        // Errors may name optional fields that were never materialized
        if self.model.kind() == ModelKind::Object && self.value().is_some() {
            let depth = path.keys().len();
            for (error_path, _) in &related {
                let Some(key) = error_path.keys().get(depth) else {
                    continue;
                };
                let Key::Field(name) = key else {
                    continue;
                };
                if !children.iter().any(|c| c.model.key() == Some(key)) {
                    if let Ok(child) = self.field(name) {
                        children.push(child);
                    }
                }
            }
        }
        for child in children {
            child.distribute_errors(&related);
        }
    }

    fn run_own_validators(&self) -> Vec<BoxFuture<'static, Vec<ValueError>>> {
        if let Some(validator) = self.with_state(|s| s.validity_validator.clone()) {
            return vec![self.binder.schedule_validation(&self.model, validator)];
        }
        self.validators()
            .into_iter()
            .map(|validator| self.binder.schedule_validation(&self.model, validator))
            .collect()
    }

    fn request_validation_of_descendants(&self) -> Vec<BoxFuture<'static, Vec<ValueError>>> {
        self.children()
            .into_iter()
            .flat_map(|child| {
                let mut runs = child.run_own_validators();
                runs.extend(child.request_validation_of_descendants());
                runs
            })
            .collect()
    }

    fn request_validation_with_ancestors(&self) -> Vec<BoxFuture<'static, Vec<ValueError>>> {
        let mut runs = self.run_own_validators();
        if let Some(parent) = self.parent() {
            runs.extend(parent.request_validation_with_ancestors());
        }
        runs
    }

    /// Reset visited flags and errors in this subtree
    ///
    /// Returns true if anything changed.
    pub fn clear_validation(&self) -> bool {
        let mut changed = self.with_state_mut(NodeState::clear_validation);
        for child in self.children() {
            changed |= child.clear_validation();
        }
        changed
    }

    /// Re-validate where it matters after an edit
    ///
    /// A visited node validates itself. Otherwise dirty or invalid nodes
    /// pass the request on to their children.
    pub fn update_validation(&self) -> BoxFuture<'static, ()> {
        let node = self.clone();
        async move {
            if node.visited() {
                node.validate().await;
            } else if node.dirty() || node.invalid() {
                join_all(node.children().iter().map(BinderNode::update_validation)).await;
            }
        }
        .boxed()
    }
}

impl fmt::Debug for BinderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderNode")
            .field("path", &self.name())
            .field("type", &self.model.ty().to_string())
            .finish()
    }
}

impl PartialEq for BinderNode {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model
    }
}
