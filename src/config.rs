//! Binder configuration
//!
//! Hooks and policies supplied when a binder is created:
//! - `on_change`: re-render hook, called after every root value replacement
//!   and after validation errors are redistributed
//! - `on_submit`: endpoint used by [`crate::Binder::submit`]
//! - `skip_empty_optional`: skip validators on empty, non-required nodes

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::binder::SubmitFailure;
use crate::value::Value;

/// Receives the previous root value, `None` for validation-only updates
pub type ChangeHook = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

pub type SubmitHook =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<(), SubmitFailure>> + Send + Sync>;

#[derive(Clone)]
pub struct BinderConfig {
    pub on_change: Option<ChangeHook>,
    pub on_submit: Option<SubmitHook>,
    /// When set, an optional node with a blank value only runs validators
    /// that opt into empty values (`Required` and friends)
    pub skip_empty_optional: bool,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            on_change: None,
            on_submit: None,
            skip_empty_optional: true,
        }
    }
}

impl BinderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(hook));
        self
    }

    pub fn on_submit<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> BoxFuture<'static, Result<(), SubmitFailure>> + Send + Sync + 'static,
    {
        self.on_submit = Some(Arc::new(hook));
        self
    }

    pub fn skip_empty_optional(mut self, skip: bool) -> Self {
        self.skip_empty_optional = skip;
        self
    }
}

impl fmt::Debug for BinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderConfig")
            .field("on_change", &self.on_change.is_some())
            .field("on_submit", &self.on_submit.is_some())
            .field("skip_empty_optional", &self.skip_empty_optional)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn defaults() {
        let config = BinderConfig::default();
        assert!(config.skip_empty_optional);
        assert!(config.on_change.is_none());
        assert!(config.on_submit.is_none());
    }

    #[test]
    fn builder_installs_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let config = BinderConfig::new()
            .on_change(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .skip_empty_optional(false);

        (config.on_change.as_ref().unwrap())(None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!config.skip_empty_optional);
        assert!(format!("{:?}", config).contains("on_change: true"));
    }
}
