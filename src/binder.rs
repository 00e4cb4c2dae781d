//! Validation coordinator
//!
//! The [`Binder`] owns the single root value, the pristine default value and
//! the lazily built node arena. Every node value is a projection of the root
//! value, and every write replaces containers along the root-to-node path, so
//! the binder is the only place where state actually changes.
//!
//! Validator runs are submitted here and deduplicated per (node, validator)
//! pair: concurrent requests share one in-flight future.
//!
//! ```text
//! BinderNode::validate()
//!        │  descendants' + ancestors' validators
//!        ▼
//! Binder::request_validation ──► pending[(path, validator)] ──► Shared<future>
//!        │                                                   (joined by duplicates)
//!        ▼
//!   join_all ──► redistribute by path ──► on_change hook
//! ```

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::config::BinderConfig;
use crate::error::BinderError;
use crate::model::Model;
use crate::node::{BinderNode, NodeState};
use crate::path::{Key, NodePath};
use crate::schema::{Schema, TypeRef};
use crate::validation::{ValidationOutcome, Validator, ValueError};
use crate::value::Value;

static NEXT_BINDER_ID: AtomicU64 = AtomicU64::new(1);

type PendingKey = (NodePath, usize);

/// One shared validator run plus the number of requests awaiting it
#[derive(Clone)]
struct PendingValidation {
    run: Shared<BoxFuture<'static, Vec<ValueError>>>,
    waiters: Arc<AtomicUsize>,
}

/// Violation reported by the submit endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerViolation {
    /// Path of the offending field, `items[0].name` style
    #[serde(alias = "parameterName")]
    pub property: String,
    pub message: String,
}

/// Why a submit endpoint refused the value
#[derive(Debug)]
pub enum SubmitFailure {
    /// Server-side validation; violations are attached to the matching nodes
    Validation(Vec<ServerViolation>),
    Other(anyhow::Error),
}

impl From<anyhow::Error> for SubmitFailure {
    fn from(err: anyhow::Error) -> Self {
        SubmitFailure::Other(err)
    }
}

#[derive(Default)]
struct RootState {
    value: Option<Value>,
    default_value: Option<Value>,
}

struct BinderInner {
    id: u64,
    schema: Schema,
    root_ty: TypeRef,
    config: BinderConfig,
    state: RwLock<RootState>,
    nodes: DashMap<NodePath, NodeState>,
    pending: DashMap<PendingKey, PendingValidation>,
    in_flight: AtomicUsize,
    submitting: AtomicBool,
}

/// Root of a binding tree, cheap to clone
#[derive(Clone)]
pub struct Binder {
    inner: Arc<BinderInner>,
}

impl Binder {
    pub fn new(schema: Schema, root: TypeRef) -> Result<Self, BinderError> {
        Self::with_config(schema, root, BinderConfig::default())
    }

    pub fn with_config(
        schema: Schema,
        root: TypeRef,
        config: BinderConfig,
    ) -> Result<Self, BinderError> {
        schema.check_type(&root, "<root>")?;

        let binder = Self {
            inner: Arc::new(BinderInner {
                id: NEXT_BINDER_ID.fetch_add(1, Ordering::Relaxed),
                schema,
                root_ty: root,
                config,
                state: RwLock::new(RootState::default()),
                nodes: DashMap::new(),
                pending: DashMap::new(),
                in_flight: AtomicUsize::new(0),
                submitting: AtomicBool::new(false),
            }),
        };

        // Creating the root node seeds the empty value as the pristine baseline
        binder.root();
        debug!(binder = binder.inner.id, root = %binder.inner.root_ty, "binder created");
        Ok(binder)
    }

    /// Build a schema from YAML and bind its model `root_model`
    pub fn from_yaml(yaml: &str, root_model: &str) -> Result<Self, BinderError> {
        let schema = Schema::from_yaml(yaml)?;
        Self::new(schema, TypeRef::named(root_model))
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn config(&self) -> &BinderConfig {
        &self.inner.config
    }

    /// Root descriptor instance, the starting point for navigation
    pub fn model(&self) -> Model {
        Model::root(
            self.inner.id,
            self.inner.schema.clone(),
            self.inner.root_ty.clone(),
        )
    }

    pub fn root(&self) -> BinderNode {
        BinderNode::new(self.clone(), self.model())
    }

    /// Node for a descriptor instance of this binder
    pub fn node(&self, model: &Model) -> Result<BinderNode, BinderError> {
        self.root().for_model(model)
    }

    /// Node by path, e.g. `address.city` or `items[0].name`
    pub fn node_at(&self, path: &str) -> Result<BinderNode, BinderError> {
        let model = self.model().at(path)?;
        BinderNode::try_new(self.clone(), model)
    }

    pub(crate) fn nodes(&self) -> &DashMap<NodePath, NodeState> {
        &self.inner.nodes
    }

    /// Drop the state of array items under `scope` that no longer exist
    ///
    /// An item that reappears at the same index starts from a fresh node.
    pub(crate) fn prune_stale_nodes(&self, scope: &NodePath) {
        let root = self.value();
        let stale: Vec<NodePath> = self
            .inner
            .nodes
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|path| path.starts_with(scope) && !item_exists(root.as_ref(), path))
            .collect();
        if stale.is_empty() {
            return;
        }
        for path in &stale {
            self.inner.nodes.remove(path);
        }
        debug!(binder = self.inner.id, count = stale.len(), "pruned vanished item nodes");
    }

    /// Prune vanished items and clear validation state across the whole arena
    fn reset_validation_state(&self) {
        self.prune_stale_nodes(&NodePath::root());
        for mut state in self.inner.nodes.iter_mut() {
            state.clear_validation();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Value and pristine state
    // ─────────────────────────────────────────────────────────────

    pub fn value(&self) -> Option<Value> {
        self.inner.state.read().value.clone()
    }

    /// Same contract as the root node's setter
    pub fn set_value(&self, value: Value) -> Result<(), BinderError> {
        self.root().set_value(Some(value))
    }

    pub fn default_value(&self) -> Option<Value> {
        self.inner.state.read().default_value.clone()
    }

    pub fn set_default_value(&self, value: Value) {
        self.inner.state.write().default_value = Some(value);
    }

    /// True if the root value is not the pristine default value
    pub fn dirty(&self) -> bool {
        let state = self.inner.state.read();
        !Value::same_opt(state.value.as_ref(), state.default_value.as_ref())
    }

    /// Final step of every write
    ///
    /// The first write with `keep_pristine` on a clean binder also moves the
    /// default value, so lazily materialized empty values do not count as edits.
    pub(crate) fn assign_value(&self, value: Value, keep_pristine: bool) {
        let old = {
            let mut state = self.inner.state.write();
            if keep_pristine
                && Value::same_opt(state.value.as_ref(), state.default_value.as_ref())
            {
                state.default_value = Some(value.clone());
            }
            if let Some(current) = &state.value {
                if Value::same(current, &value) {
                    return;
                }
            }
            state.value.replace(value)
        };
        trace!(binder = self.inner.id, "root value replaced");
        self.update(old.as_ref());
    }

    /// Re-render hook
    pub(crate) fn update(&self, old_value: Option<&Value>) {
        if let Some(hook) = &self.inner.config.on_change {
            hook(old_value);
        }
    }

    /// Replace value and default value, clearing validation state
    pub fn read(&self, value: Value) {
        let old = {
            let mut state = self.inner.state.write();
            state.default_value = Some(value.clone());
            state.value.replace(value)
        };
        debug!(binder = self.inner.id, "read new value");
        self.reset_validation_state();
        self.update(old.as_ref());
    }

    /// Reset to the empty value of the root model
    pub fn clear(&self) {
        self.read(self.model().empty_value());
    }

    /// Discard edits: value goes back to the default value
    pub fn reset(&self) {
        let old = {
            let mut state = self.inner.state.write();
            match state.default_value.clone() {
                Some(default) => state.value.replace(default),
                None => state.value.clone(),
            }
        };
        self.reset_validation_state();
        self.update(old.as_ref());
    }

    // ─────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────

    pub fn validators(&self) -> Vec<Arc<dyn Validator>> {
        self.root().validators()
    }

    pub fn set_validators(&self, validators: Vec<Arc<dyn Validator>>) {
        self.root().set_validators(validators);
    }

    pub fn add_validator(&self, validator: Arc<dyn Validator>) {
        self.root().add_validator(validator);
    }

    pub async fn validate(&self) -> Vec<ValueError> {
        self.root().validate().await
    }

    pub fn errors(&self) -> Vec<ValueError> {
        self.root().errors()
    }

    pub fn invalid(&self) -> bool {
        self.root().invalid()
    }

    /// True while any validator run is in flight
    pub fn validating(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Run `validator` for the node of `model`
    ///
    /// Concurrent requests for the same (node, validator) pair share a
    /// single run.
    pub fn request_validation(
        &self,
        model: &Model,
        validator: Arc<dyn Validator>,
    ) -> Result<BoxFuture<'static, Vec<ValueError>>, BinderError> {
        if model.binder_id() != self.inner.id {
            return Err(BinderError::UnknownBinder { path: model.name() });
        }
        Ok(self.schedule_validation(model, validator))
    }

    pub(crate) fn schedule_validation(
        &self,
        model: &Model,
        validator: Arc<dyn Validator>,
    ) -> BoxFuture<'static, Vec<ValueError>> {
        let key = (model.path().clone(), validator_identity(&validator));
        // Node registration may write the root value, keep it outside the table lock
        let node = BinderNode::new(self.clone(), model.clone());

        let pending = match self.inner.pending.entry(key.clone()) {
            Entry::Occupied(entry) => {
                trace!(node = %key.0, "joining in-flight validation");
                let pending = entry.get().clone();
                pending.waiters.fetch_add(1, Ordering::SeqCst);
                pending
            }
            Entry::Vacant(entry) => {
                let in_flight = InFlight::start(Arc::clone(&self.inner));
                let run = async move {
                    let errors = run_validator(node, validator).await;
                    drop(in_flight);
                    errors
                }
                .boxed()
                .shared();
                let pending = PendingValidation {
                    run,
                    waiters: Arc::new(AtomicUsize::new(1)),
                };
                entry.insert(pending.clone());
                pending
            }
        };

        let waiter = Waiter {
            inner: Arc::clone(&self.inner),
            key,
            pending,
        };
        async move {
            let errors = waiter.pending.run.clone().await;
            drop(waiter);
            errors
        }
        .boxed()
    }

    // ─────────────────────────────────────────────────────────────
    // Submit
    // ─────────────────────────────────────────────────────────────

    pub fn submitting(&self) -> bool {
        self.inner.submitting.load(Ordering::SeqCst)
    }

    /// Validate, then hand the value to `endpoint`
    ///
    /// Client-side errors abort before the endpoint is called. Server-side
    /// violations are attached to the nodes they name.
    pub async fn submit_to<T, F, Fut>(&self, endpoint: F) -> Result<T, BinderError>
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = Result<T, SubmitFailure>>,
    {
        let errors = self.validate().await;
        if !errors.is_empty() {
            warn!(count = errors.len(), "submit blocked by validation errors");
            return Err(BinderError::ValidationFailed { errors });
        }

        let value = self.value().unwrap_or(Value::Null);
        self.inner.submitting.store(true, Ordering::SeqCst);
        let result = endpoint(value).await;
        self.inner.submitting.store(false, Ordering::SeqCst);

        match result {
            Ok(response) => Ok(response),
            Err(SubmitFailure::Validation(violations)) => {
                let count = violations.len();
                warn!(count, "submit rejected by server validation");
                let errors: Vec<ValueError> = violations
                    .into_iter()
                    .map(|violation| ValueError {
                        property: violation.property,
                        message: violation.message,
                        value: None,
                        validator: None,
                    })
                    .collect();
                self.root().set_errors_with_descendants(&errors);
                self.update(None);
                Err(BinderError::ServerRejected { count })
            }
            Err(SubmitFailure::Other(err)) => Err(BinderError::Submit(err)),
        }
    }

    /// Submit through the configured `on_submit` hook
    ///
    /// Without a hook this only validates.
    pub async fn submit(&self) -> Result<(), BinderError> {
        match self.inner.config.on_submit.clone() {
            Some(hook) => self.submit_to(|value| hook(value)).await,
            None => {
                let errors = self.validate().await;
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(BinderError::ValidationFailed { errors })
                }
            }
        }
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("id", &self.inner.id)
            .field("root", &self.inner.root_ty.to_string())
            .field("nodes", &self.inner.nodes.len())
            .finish()
    }
}

/// Counts one validator run as in flight until it settles or is dropped
struct InFlight(Arc<BinderInner>);

impl InFlight {
    fn start(inner: Arc<BinderInner>) -> Self {
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One request awaiting a shared run
///
/// The last waiter to finish or be dropped removes the run from the table.
/// Once no clone of the shared future is left, the run itself is dropped.
struct Waiter {
    inner: Arc<BinderInner>,
    key: PendingKey,
    pending: PendingValidation,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let pending = &self.pending;
        let removed = self.inner.pending.remove_if(&self.key, |_, current| {
            current.run.ptr_eq(&pending.run) && pending.waiters.fetch_sub(1, Ordering::SeqCst) == 1
        });
        if removed.is_some() {
            trace!(node = %self.key.0, "validation run released");
        }
    }
}

/// True unless an array on the way to `path` is too short to hold it
fn item_exists(root: Option<&Value>, path: &NodePath) -> bool {
    let mut current = root;
    for key in path.keys() {
        let Some(value) = current else {
            return true;
        };
        if let (Key::Index(index), Some(items)) = (key, value.as_array()) {
            if *index >= items.len() {
                return false;
            }
        }
        current = value.get(key);
    }
    true
}

fn validator_identity(validator: &Arc<dyn Validator>) -> usize {
    Arc::as_ptr(validator) as *const () as usize
}

/// One validator against one node
///
/// A panicking validator is reported as a plain rejection instead of
/// tearing down the whole validation round.
async fn run_validator(node: BinderNode, validator: Arc<dyn Validator>) -> Vec<ValueError> {
    let value = node.value();
    let name = node.name();
    let binder = node.binder().clone();

    if binder.config().skip_empty_optional
        && !validator.validates_empty()
        && !node.required()
        && Value::is_blank(value.as_ref())
    {
        trace!(node = %name, "skipping validator on empty optional value");
        return Vec::new();
    }

    let outcome = AssertUnwindSafe(validator.validate(value.as_ref(), &binder))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            error!(node = %name, validator = validator.message(), "validator panicked");
            ValidationOutcome::Invalid
        });

    outcome.into_errors(&name, value.as_ref(), &validator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, ModelDef, SchemaDef};
    use crate::validation::FnValidator;
    use crate::validators::ValidatorSpec;
    use serde_json::json;
    use std::time::Duration;

    fn person_schema() -> Schema {
        Schema::compile(
            SchemaDef::new().model(
                "Person",
                ModelDef::new()
                    .field(FieldDef::new("name", TypeRef::String).validator(ValidatorSpec::Required))
                    .field(FieldDef::new("email", TypeRef::String))
                    .field(FieldDef::new("nickname", TypeRef::String).optional()),
            ),
        )
        .unwrap()
    }

    fn person_binder() -> Binder {
        Binder::new(person_schema(), TypeRef::named("Person")).unwrap()
    }

    #[test]
    fn new_binder_starts_pristine_with_empty_value() {
        let binder = person_binder();
        assert_eq!(binder.value().unwrap().to_json(), json!({"name": "", "email": ""}));
        assert!(!binder.dirty());
    }

    #[test]
    fn unknown_root_type_is_rejected() {
        let err = Binder::new(person_schema(), TypeRef::named("Nope")).err().unwrap();
        assert!(matches!(err, BinderError::UnknownType { .. }));
    }

    #[test]
    fn read_round_trips_and_is_pristine() {
        let binder = person_binder();
        let value = Value::from(json!({"name": "Ada", "email": "ada@x.com"}));
        binder.read(value.clone());
        assert_eq!(binder.value(), Some(value));
        assert!(!binder.dirty());
    }

    #[test]
    fn reset_discards_edits() {
        let binder = person_binder();
        binder.read(Value::from(json!({"name": "Ada", "email": ""})));
        binder.node_at("name").unwrap().set_value(Some(Value::from("Bob"))).unwrap();
        assert!(binder.dirty());
        binder.reset();
        assert!(!binder.dirty());
        assert_eq!(binder.node_at("name").unwrap().value(), Some(Value::from("Ada")));
    }

    #[test]
    fn clear_restores_empty_value() {
        let binder = person_binder();
        binder.read(Value::from(json!({"name": "Ada", "email": "a@x.com"})));
        binder.clear();
        assert_eq!(binder.value().unwrap().to_json(), json!({"name": "", "email": ""}));
        assert!(!binder.dirty());
    }

    #[test]
    fn change_hook_sees_old_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let config = BinderConfig::new().on_change(move |old| {
            if old.is_some() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        let binder =
            Binder::with_config(person_schema(), TypeRef::named("Person"), config).unwrap();

        binder.node_at("email").unwrap().set_value(Some(Value::from("x"))).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Same value again is a no-op
        binder.node_at("email").unwrap().set_value(Some(Value::from("x"))).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_run() {
        let binder = person_binder();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let slow: Arc<dyn Validator> = Arc::new(crate::validation::AsyncFnValidator::new(
            "slow",
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    ValidationOutcome::Invalid
                }
                .boxed()
            },
        ));

        binder.node_at("email").unwrap().set_value(Some(Value::from("a@x.com"))).unwrap();
        let model = binder.model().field("email").unwrap();
        let a = binder.request_validation(&model, Arc::clone(&slow)).unwrap();
        let b = binder.request_validation(&model, Arc::clone(&slow)).unwrap();
        assert!(binder.validating());
        let (a, b) = futures::join!(a, b);

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert!(!binder.validating());

        // Settled runs leave the table; the next request runs again
        binder.request_validation(&model, slow).unwrap().await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dropped_request_releases_run() {
        let binder = person_binder();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let slow: Arc<dyn Validator> = Arc::new(crate::validation::AsyncFnValidator::new(
            "slow",
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    ValidationOutcome::Invalid
                }
                .boxed()
            },
        ));
        binder.node_at("email").unwrap().set_value(Some(Value::from("a@x.com"))).unwrap();
        let model = binder.model().field("email").unwrap();

        let request = binder.request_validation(&model, Arc::clone(&slow)).unwrap();
        assert!(binder.validating());
        drop(request);
        assert!(!binder.validating());
        assert!(binder.inner.pending.is_empty());

        // One of two waiters leaving keeps the shared run alive
        let a = binder.request_validation(&model, Arc::clone(&slow)).unwrap();
        let b = binder.request_validation(&model, Arc::clone(&slow)).unwrap();
        drop(a);
        assert!(binder.validating());
        assert_eq!(b.await.len(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!binder.validating());
        assert!(binder.inner.pending.is_empty());
    }

    #[tokio::test]
    async fn request_validation_rejects_foreign_models() {
        let a = person_binder();
        let b = person_binder();
        let validator: Arc<dyn Validator> =
            Arc::new(FnValidator::new("x", |_, _| ValidationOutcome::Valid));
        let err = a.request_validation(&b.model(), validator).err().unwrap();
        assert!(matches!(err, BinderError::UnknownBinder { .. }));
    }

    #[tokio::test]
    async fn empty_optional_values_skip_validators() {
        let binder = person_binder();
        let always_bad: Arc<dyn Validator> =
            Arc::new(FnValidator::new("bad", |_, _| ValidationOutcome::Invalid));
        let email = binder.node_at("email").unwrap();
        email.set_validators(vec![Arc::clone(&always_bad)]);

        assert!(email.validate().await.is_empty());

        email.set_value(Some(Value::from("x"))).unwrap();
        assert_eq!(email.validate().await.len(), 1);
    }

    #[tokio::test]
    async fn panicking_validator_becomes_an_error() {
        let binder = person_binder();
        binder.read(Value::from(json!({"name": "Ada", "email": "a"})));
        let email = binder.node_at("email").unwrap();
        email.add_validator(Arc::new(FnValidator::new("boom", |_, _| panic!("validator bug"))));

        let errors = email.validate().await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "boom");
    }

    #[tokio::test]
    async fn submit_blocks_on_client_errors() {
        let binder = person_binder();
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let result = binder
            .submit_to(|_| async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<_, SubmitFailure>(())
            })
            .await;

        assert!(matches!(result, Err(BinderError::ValidationFailed { .. })));
        assert!(!called.load(Ordering::SeqCst));
        assert_eq!(binder.node_at("name").unwrap().own_errors().len(), 1);
    }

    #[tokio::test]
    async fn submit_attaches_server_violations() {
        let binder = person_binder();
        binder.read(Value::from(json!({"name": "Ada", "email": "taken@x.com"})));

        let result = binder
            .submit_to(|value| async move {
                assert_eq!(value.to_json()["email"], json!("taken@x.com"));
                Err::<(), _>(SubmitFailure::Validation(vec![ServerViolation {
                    property: "email".to_string(),
                    message: "already registered".to_string(),
                }]))
            })
            .await;

        assert!(matches!(result, Err(BinderError::ServerRejected { count: 1 })));
        let email = binder.node_at("email").unwrap();
        assert_eq!(email.own_errors()[0].message, "already registered");
        assert!(binder.root().own_errors().is_empty());
        assert!(!binder.submitting());
    }

    #[tokio::test]
    async fn submit_uses_configured_hook() {
        let submitted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&submitted);
        let config = BinderConfig::new().on_submit(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<(), SubmitFailure>(()) }.boxed()
        });
        let binder =
            Binder::with_config(person_schema(), TypeRef::named("Person"), config).unwrap();
        binder.read(Value::from(json!({"name": "Ada", "email": ""})));

        binder.submit().await.unwrap();
        assert_eq!(submitted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn server_violation_accepts_parameter_name() {
        let violation: ServerViolation =
            serde_json::from_str(r#"{"parameterName": "items[0].name", "message": "bad"}"#)
                .unwrap();
        assert_eq!(violation.property, "items[0].name");
    }
}
