//! Imperative form facade
//!
//! [`Form`] is a cheap handle over one form's state store, baseline
//! snapshot, field registry and validation pipeline. Every state change goes
//! through [`FormMessage`] dispatch; once the form is torn down dispatch is a
//! no-op, so late asynchronous completions never write.

mod events;
mod field;
mod submit;

pub use events::{BlurInput, ChangeInput, InputEvent, InputKind, SelectOption};
pub use field::{truthy, FieldHelpers, FieldMeta, FieldOptions, FieldProps, FieldSpec};
pub use submit::SubmitOutcome;

use crate::config::{FormConfig, FormOptions};
use crate::error::{FormError, FormResult};
use crate::hooks::{ResetHandler, SubmitHandler};
use crate::path::{get_in, set_in};
use crate::registry::FieldRegistry;
use crate::state::{form_reducer, FormMessage, FormState, InitialState, ResetState, StateTransform};
use crate::validation::{count_errors, has_errors, FieldValidator, ValidationPipeline};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Token gating whether asynchronous work may still commit state
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Flip to not-live; returns true on the first call only
    fn revoke(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// New values for `set_values`: a full replacement or a transform of the current values
pub enum ValuesUpdate {
    Replace(Value),
    Transform(Box<dyn FnOnce(&Value) -> Value + Send>),
}

impl ValuesUpdate {
    pub fn transform<F>(f: F) -> Self
    where
        F: FnOnce(&Value) -> Value + Send + 'static,
    {
        ValuesUpdate::Transform(Box::new(f))
    }

    fn apply(self, current: &Value) -> Value {
        match self {
            ValuesUpdate::Replace(values) => values,
            ValuesUpdate::Transform(f) => f(current),
        }
    }
}

impl From<Value> for ValuesUpdate {
    fn from(values: Value) -> Self {
        ValuesUpdate::Replace(values)
    }
}

impl fmt::Debug for ValuesUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuesUpdate::Replace(values) => f.debug_tuple("Replace").field(values).finish(),
            ValuesUpdate::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

struct FormInner {
    state: watch::Sender<Arc<FormState>>,
    baseline: Mutex<InitialState>,
    registry: Mutex<FieldRegistry>,
    liveness: Liveness,
    pipeline: ValidationPipeline,
    on_submit: Arc<dyn SubmitHandler>,
    on_reset: Option<Arc<dyn ResetHandler>>,
    options: FormOptions,
    initial_valid: Option<bool>,
    validation_seq: AtomicU64,
}

/// Handle to a single form
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("state", &self.state())
            .field("live", &self.is_live())
            .field("pipeline", &self.inner.pipeline)
            .field("options", &self.inner.options)
            .finish()
    }
}

impl Form {
    /// Build a form, rejecting value trees of the wrong shape
    pub fn new(config: FormConfig) -> FormResult<Self> {
        config.check()?;
        let pipeline = config.pipeline();
        let FormConfig {
            initial,
            on_submit,
            on_reset,
            initial_valid,
            options,
            ..
        } = config;

        let (state, _) = watch::channel(Arc::new(FormState::from_initial(&initial)));
        Ok(Self {
            inner: Arc::new(FormInner {
                state,
                baseline: Mutex::new(initial),
                registry: Mutex::new(FieldRegistry::new()),
                liveness: Liveness::new(),
                pipeline,
                on_submit,
                on_reset,
                options,
                initial_valid,
                validation_seq: AtomicU64::new(0),
            }),
        })
    }

    // === Lifecycle ===

    /// Validate the initial values when `validate_on_mount` is set
    pub async fn mount(&self) -> FormResult<()> {
        if self.inner.options.validate_on_mount {
            let values = self.initial_values();
            self.run_validation(&values).await?;
        }
        Ok(())
    }

    /// Apply a new baseline supplied by the consumer.
    ///
    /// Changed values reset the form when `enable_reinitialize` is set and
    /// are re-validated when `validate_on_mount` is set. Changed errors,
    /// touched or status replace both the baseline entry and the state, but
    /// only with `enable_reinitialize`.
    pub async fn reinitialize(&self, next: InitialState) -> FormResult<()> {
        let options = self.inner.options;
        let current = self.baseline().clone();
        let values_changed = current.values != next.values;

        if values_changed && options.enable_reinitialize {
            tracing::debug!("initial values changed, resetting form");
            self.baseline().values = next.values.clone();
            self.reset_form(None).await?;
        }

        if options.enable_reinitialize {
            if current.errors != next.errors {
                self.baseline().errors = next.errors.clone();
                self.dispatch(FormMessage::SetErrors(next.errors));
            }
            if current.touched != next.touched {
                self.baseline().touched = next.touched.clone();
                self.dispatch(FormMessage::SetTouched(next.touched));
            }
            if current.status != next.status {
                self.baseline().status = next.status.clone();
                self.dispatch(FormMessage::SetStatus(next.status));
            }
        }

        if values_changed && options.validate_on_mount {
            let values = self.initial_values();
            self.run_validation(&values).await?;
        }
        Ok(())
    }

    /// Stop all further state commits. Idempotent.
    pub fn teardown(&self) {
        if self.inner.liveness.revoke() {
            tracing::debug!("form torn down");
        }
    }

    pub fn is_live(&self) -> bool {
        self.inner.liveness.is_live()
    }

    /// Liveness token for bindings that outlive a single call
    pub fn liveness(&self) -> Liveness {
        self.inner.liveness.clone()
    }

    /// Receiver notified on every committed state change
    pub fn subscribe(&self) -> watch::Receiver<Arc<FormState>> {
        self.inner.state.subscribe()
    }

    pub fn options(&self) -> FormOptions {
        self.inner.options
    }

    // === Projections ===

    /// Current state snapshot
    pub fn state(&self) -> Arc<FormState> {
        Arc::clone(&self.inner.state.borrow())
    }

    pub fn values(&self) -> Value {
        self.state().values.clone()
    }

    pub fn errors(&self) -> Value {
        self.state().errors.clone()
    }

    pub fn touched(&self) -> Value {
        self.state().touched.clone()
    }

    pub fn status(&self) -> Option<Value> {
        self.state().status.clone()
    }

    pub fn initial_values(&self) -> Value {
        self.baseline().values.clone()
    }

    pub fn initial_errors(&self) -> Value {
        self.baseline().errors.clone()
    }

    pub fn initial_touched(&self) -> Value {
        self.baseline().touched.clone()
    }

    pub fn initial_status(&self) -> Option<Value> {
        self.baseline().status.clone()
    }

    /// Values differ from the baseline
    pub fn dirty(&self) -> bool {
        let values = self.values();
        values != self.baseline().values
    }

    /// The declared initial validity while pristine, otherwise "no errors"
    pub fn is_valid(&self) -> bool {
        match self.inner.initial_valid {
            Some(valid) if !self.dirty() => valid,
            _ => !has_errors(&self.state().errors),
        }
    }

    // === Field registry ===

    /// Register a mounted field, replacing any previous registration
    pub fn register_field(&self, path: impl Into<String>, validator: Option<Arc<dyn FieldValidator>>) {
        self.registry().register(path, validator);
    }

    pub fn unregister_field(&self, path: &str) {
        self.registry().unregister(path);
    }

    // === Validation ===

    /// Run every validation source against `values` without committing
    pub async fn run_all_validations(&self, values: &Value) -> FormResult<Value> {
        let fields = self.registry().validated();
        let errors = self.inner.pipeline.run_all(&fields, values).await?;
        tracing::debug!(fields = fields.len(), errors = count_errors(&errors), "validation run finished");
        Ok(errors)
    }

    /// Validate `values` (the current values when `None`) and commit the errors
    pub async fn validate_form(&self, values: Option<Value>) -> FormResult<Value> {
        let values = values.unwrap_or_else(|| self.values());
        self.run_validation(&values).await
    }

    /// Validate a single field and commit its error.
    ///
    /// A synchronous field validator commits without touching
    /// `is_validating`. Without a field validator the schema is consulted
    /// for that path; without either nothing happens.
    pub async fn validate_field(&self, path: &str) -> FormResult<Option<Value>> {
        let validator = self.registry().validator(path);
        if let Some(validator) = validator {
            let value = get_in(&self.state().values, path).cloned().unwrap_or(Value::Null);
            let check = validator.validate(&value);
            let deferred = check.is_pending();
            if deferred {
                self.dispatch(FormMessage::SetValidating(true));
            }
            let outcome = check.resolve().await;
            let message = match outcome {
                Ok(message) => message,
                Err(err) => {
                    if deferred {
                        self.dispatch(FormMessage::SetValidating(false));
                    }
                    tracing::warn!(field = %path, error = %format!("{err:#}"), "field validator failed");
                    return Err(FormError::Validator(
                        err.context(format!("validating field `{path}`")),
                    ));
                }
            };
            let error = message.filter(|m| !m.is_empty()).map(Value::String);
            self.commit_field_error(path, error.clone());
            if deferred {
                self.dispatch(FormMessage::SetValidating(false));
            }
            return Ok(error);
        }

        if self.inner.pipeline.has_schema() {
            self.dispatch(FormMessage::SetValidating(true));
            let values = self.values();
            let outcome = self.inner.pipeline.run_schema(&values, Some(path)).await;
            let errors = match outcome {
                Ok(errors) => errors,
                Err(err) => {
                    self.dispatch(FormMessage::SetValidating(false));
                    return Err(err);
                }
            };
            let error = get_in(&errors, path)
                .filter(|e| !matches!(e, Value::String(s) if s.is_empty()))
                .cloned();
            self.commit_field_error(path, error.clone());
            self.dispatch(FormMessage::SetValidating(false));
            return Ok(error);
        }

        Ok(None)
    }

    // === Setters ===

    /// Replace the values, validating the new values unless disabled
    pub async fn set_values(
        &self,
        update: impl Into<ValuesUpdate>,
        should_validate: Option<bool>,
    ) -> FormResult<()> {
        let values = update.into().apply(&self.state().values);
        self.dispatch(FormMessage::SetValues(values.clone()));
        if should_validate.unwrap_or(self.inner.options.validate_on_change) {
            self.run_validation(&values).await?;
        }
        Ok(())
    }

    pub async fn set_field_value(
        &self,
        path: &str,
        value: Value,
        should_validate: Option<bool>,
    ) -> FormResult<()> {
        let values = set_in(&self.state().values, path, value.clone());
        self.dispatch(FormMessage::SetFieldValue {
            path: path.to_string(),
            value,
        });
        if should_validate.unwrap_or(self.inner.options.validate_on_change) {
            self.run_validation(&values).await?;
        }
        Ok(())
    }

    pub async fn set_touched(&self, touched: Value, should_validate: Option<bool>) -> FormResult<()> {
        self.dispatch(FormMessage::SetTouched(touched));
        if should_validate.unwrap_or(self.inner.options.validate_on_blur) {
            let values = self.values();
            self.run_validation(&values).await?;
        }
        Ok(())
    }

    pub async fn set_field_touched(
        &self,
        path: &str,
        touched: bool,
        should_validate: Option<bool>,
    ) -> FormResult<()> {
        self.dispatch(FormMessage::SetFieldTouched {
            path: path.to_string(),
            touched,
        });
        if should_validate.unwrap_or(self.inner.options.validate_on_blur) {
            let values = self.values();
            self.run_validation(&values).await?;
        }
        Ok(())
    }

    pub fn set_errors(&self, errors: Value) {
        self.dispatch(FormMessage::SetErrors(errors));
    }

    /// Set or clear (`None`) the error at `path`
    pub fn set_field_error(&self, path: &str, error: Option<&str>) {
        self.commit_field_error(path, error.map(|e| Value::String(e.to_string())));
    }

    pub fn set_status(&self, status: Option<Value>) {
        self.dispatch(FormMessage::SetStatus(status));
    }

    pub fn set_submitting(&self, is_submitting: bool) {
        self.dispatch(FormMessage::SetSubmitting(is_submitting));
    }

    /// Replace the whole state with `transform(&state)`.
    ///
    /// The transform runs on a snapshot outside the state lock, so it may
    /// read the form. A commit that lands while it runs is overwritten.
    pub fn set_form_state<F>(&self, transform: F)
    where
        F: FnOnce(&FormState) -> FormState,
    {
        let snapshot = self.state();
        let next = transform(&snapshot);
        if !Arc::ptr_eq(&snapshot, &self.state()) {
            tracing::debug!("state changed during set_form_state, overwriting");
        }
        self.dispatch(FormMessage::SetFormState(StateTransform::new(move |_| next)));
    }

    /// Reset state and baseline.
    ///
    /// Fields present in `next` override the baseline. When an `on_reset`
    /// hook is configured it runs first; if it fails nothing is reset.
    pub async fn reset_form(&self, next: Option<ResetState>) -> FormResult<()> {
        let baseline = self.baseline().clone();
        let (snapshot, state) = next.unwrap_or_default().resolve(&baseline);

        if let Some(on_reset) = &self.inner.on_reset {
            on_reset
                .reset(self.values(), self.clone())
                .resolve()
                .await
                .map_err(FormError::ResetRejected)?;
        }

        if !self.is_live() {
            tracing::debug!("form torn down during reset hook, skipping reset");
            return Ok(());
        }
        *self.baseline() = snapshot;
        tracing::debug!(live = self.is_live(), "resetting form");
        self.dispatch(FormMessage::Reset(state));
        Ok(())
    }

    // === Internals ===

    pub(crate) fn dispatch(&self, message: FormMessage) {
        let kind = message.kind();
        if !self.is_live() {
            tracing::trace!(kind, "form torn down, dropping message");
            return;
        }
        tracing::trace!(kind, "dispatch");
        self.inner.state.send_if_modified(|state| {
            let next = form_reducer(state, message);
            if Arc::ptr_eq(state, &next) {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Full validation run with `is_validating` bookkeeping and commit
    pub(crate) async fn run_validation(&self, values: &Value) -> FormResult<Value> {
        let seq = self.inner.validation_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(seq, "validation started");
        self.dispatch(FormMessage::SetValidating(true));

        let outcome = self.run_all_validations(values).await;
        if let Ok(errors) = &outcome {
            let latest = self.inner.validation_seq.load(Ordering::SeqCst);
            if latest != seq && self.is_live() {
                tracing::debug!(seq, latest, "committing errors from a superseded validation run");
            }
            self.dispatch(FormMessage::SetErrors(errors.clone()));
        }
        self.dispatch(FormMessage::SetValidating(false));
        outcome
    }

    fn commit_field_error(&self, path: &str, error: Option<Value>) {
        self.dispatch(FormMessage::SetFieldError {
            path: path.to_string(),
            error,
        });
    }

    fn baseline(&self) -> MutexGuard<'_, InitialState> {
        self.inner.baseline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry(&self) -> MutexGuard<'_, FieldRegistry> {
        self.inner.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hooks::{
        async_reset_handler, async_submit_handler, reset_handler, submit_handler, MockResetHandler,
    };
    use crate::validation::{
        async_field_validator, async_form_validator, field_validator, MaybeAsync, MockSchema,
        ValidationFailure,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::{oneshot, Notify};
    use tokio_test::{assert_err, assert_ok};

    pub(crate) fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    pub(crate) fn form_with(values: Value) -> Form {
        init_tracing();
        Form::new(FormConfig::new(values, submit_handler(|_, _| Ok(())))).unwrap()
    }

    pub(crate) fn required() -> Arc<dyn FieldValidator> {
        field_validator(|v| match v {
            Value::String(s) if !s.is_empty() => None,
            _ => Some("Required".to_string()),
        })
    }

    mod construction {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_initial_state_from_config() {
            let form = Form::new(
                FormConfig::new(json!({"a": 1}), submit_handler(|_, _| Ok(())))
                    .initial_errors(json!({"a": "bad"}))
                    .initial_status(json!("draft")),
            )
            .unwrap();
            let state = form.state();
            assert_eq!(state.values, json!({"a": 1}));
            assert_eq!(state.errors, json!({"a": "bad"}));
            assert_eq!(state.touched, json!({}));
            assert_eq!(state.status, Some(json!("draft")));
            assert_eq!(state.submit_count, 0);
            assert!(!form.dirty());
        }

        #[test]
        fn test_invalid_shape_is_rejected() {
            let err = Form::new(FormConfig::new(json!(42), submit_handler(|_, _| Ok(())))).unwrap_err();
            assert!(matches!(err, FormError::InvalidConfig { .. }));
        }

        #[test]
        fn test_debug_shows_liveness() {
            let form = form_with(json!({}));
            assert!(format!("{:?}", form).contains("live: true"));
        }
    }

    mod liveness {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_teardown_is_idempotent_and_blocks_writes() {
            let form = form_with(json!({"a": 1}));
            let token = form.liveness();
            form.teardown();
            form.teardown();
            assert!(!token.is_live());

            form.set_status(Some(json!("late")));
            form.set_field_error("a", Some("late"));
            assert!(form.status().is_none());
            assert_eq!(form.errors(), json!({}));
        }

        #[tokio::test]
        async fn test_subscribers_see_commits() {
            let form = form_with(json!({"a": 1}));
            let mut rx = form.subscribe();
            form.set_status(Some(json!("saved")));
            assert_ok!(rx.changed().await);
            assert_eq!(rx.borrow().status, Some(json!("saved")));
        }

        #[tokio::test]
        async fn test_equal_errors_do_not_notify() {
            let form = form_with(json!({}));
            let mut rx = form.subscribe();
            rx.borrow_and_update();
            form.set_errors(json!({}));
            assert!(!rx.has_changed().unwrap());
        }

        #[tokio::test]
        async fn test_validation_after_teardown_does_not_commit() {
            let form = form_with(json!({"email": ""}));
            form.register_field("email", Some(required()));
            form.teardown();
            let errors = form.validate_form(None).await.unwrap();
            assert_eq!(errors, json!({"email": "Required"}));
            assert_eq!(form.errors(), json!({}));
            assert!(!form.state().is_validating);
        }
    }

    mod setters {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_set_field_value_validates_new_values() {
            let form = form_with(json!({"email": ""}));
            form.register_field("email", Some(required()));
            assert_ok!(form.set_field_value("email", json!("a@b.com"), None).await);
            assert_eq!(form.values(), json!({"email": "a@b.com"}));
            assert_eq!(form.errors(), json!({}));
            assert!(form.dirty());

            assert_ok!(form.set_field_value("email", json!(""), None).await);
            assert_eq!(form.errors(), json!({"email": "Required"}));
        }

        #[tokio::test]
        async fn test_should_validate_override() {
            let form = form_with(json!({"email": "x"}));
            form.register_field("email", Some(required()));
            assert_ok!(form.set_field_value("email", json!(""), Some(false)).await);
            assert_eq!(form.errors(), json!({}));
        }

        #[tokio::test]
        async fn test_validate_on_change_disabled() {
            let form = Form::new(
                FormConfig::new(json!({"email": "x"}), submit_handler(|_, _| Ok(())))
                    .validate_on_change(false),
            )
            .unwrap();
            form.register_field("email", Some(required()));
            assert_ok!(form.set_values(json!({"email": ""}), None).await);
            assert_eq!(form.errors(), json!({}));
            assert_ok!(form.set_values(json!({"email": ""}), Some(true)).await);
            assert_eq!(form.errors(), json!({"email": "Required"}));
        }

        #[tokio::test]
        async fn test_set_values_transform() {
            let form = form_with(json!({"count": 1}));
            let update = ValuesUpdate::transform(|v| json!({"count": v["count"].as_i64().unwrap_or(0) + 1}));
            assert_ok!(form.set_values(update, None).await);
            assert_eq!(form.values(), json!({"count": 2}));
        }

        #[tokio::test]
        async fn test_set_field_touched_validates_on_blur() {
            let form = form_with(json!({"name": ""}));
            form.register_field("name", Some(required()));
            assert_ok!(form.set_field_touched("name", true, None).await);
            assert_eq!(form.touched(), json!({"name": true}));
            assert_eq!(form.errors(), json!({"name": "Required"}));
        }

        #[tokio::test]
        async fn test_set_touched_without_validation() {
            let form = form_with(json!({"name": ""}));
            form.register_field("name", Some(required()));
            assert_ok!(form.set_touched(json!({"name": true}), Some(false)).await);
            assert_eq!(form.touched(), json!({"name": true}));
            assert_eq!(form.errors(), json!({}));
        }

        #[test]
        fn test_sync_setters() {
            let form = form_with(json!({}));
            form.set_errors(json!({"a": "bad"}));
            form.set_field_error("b.c", Some("worse"));
            assert_eq!(form.errors(), json!({"a": "bad", "b": {"c": "worse"}}));
            form.set_field_error("a", None);
            assert_eq!(form.errors(), json!({"b": {"c": "worse"}}));

            form.set_submitting(true);
            assert!(form.state().is_submitting);

            form.set_form_state(|s| FormState {
                submit_count: 7,
                ..s.clone()
            });
            assert_eq!(form.state().submit_count, 7);
        }

        #[test]
        fn test_set_form_state_transform_may_read_form() {
            let form = form_with(json!({"a": 1}));
            let reader = form.clone();
            form.set_form_state(|s| FormState {
                status: Some(reader.values()),
                submit_count: reader.state().submit_count + 1,
                ..s.clone()
            });
            assert_eq!(form.status(), Some(json!({"a": 1})));
            assert_eq!(form.state().submit_count, 1);
        }
    }

    mod validity {
        use super::*;

        #[tokio::test]
        async fn test_valid_after_reset_invalid_after_field_error() {
            let form = form_with(json!({"a": ""}));
            form.set_errors(json!({"a": "Required"}));
            assert!(!form.is_valid());

            assert_ok!(form.reset_form(Some(ResetState::default())).await);
            assert!(form.is_valid());

            form.set_field_error("a", Some("message"));
            assert!(!form.is_valid());
        }

        #[test]
        fn test_empty_leaves_do_not_count() {
            let form = form_with(json!({}));
            form.set_errors(json!({"a": "", "b": null, "c": {}}));
            assert!(form.is_valid());
        }

        #[tokio::test]
        async fn test_initial_valid_applies_while_pristine() {
            let form = Form::new(
                FormConfig::new(json!({"a": 1}), submit_handler(|_, _| Ok(()))).initial_valid(false),
            )
            .unwrap();
            assert!(!form.is_valid());
            assert_ok!(form.set_field_value("a", json!(2), None).await);
            assert!(form.is_valid());
        }
    }

    mod validation {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_empty_pipeline_yields_empty_tree() {
            let form = form_with(json!({"a": ""}));
            assert_eq!(form.run_all_validations(&json!({"a": ""})).await.unwrap(), json!({}));
        }

        #[tokio::test]
        async fn test_unregistered_field_keeps_prior_error() {
            let form = form_with(json!({"email": ""}));
            form.register_field("email", Some(required()));
            assert_ok!(form.validate_form(None).await);
            assert_eq!(form.errors(), json!({"email": "Required"}));

            form.unregister_field("email");
            let fresh = form.run_all_validations(&form.values()).await.unwrap();
            assert_eq!(fresh, json!({}));
            assert_eq!(form.errors(), json!({"email": "Required"}));

            assert_ok!(form.validate_form(None).await);
            assert_eq!(form.errors(), json!({}));
        }

        #[tokio::test]
        async fn test_validate_field_sync_commits_without_flicker() {
            let form = form_with(json!({"email": ""}));
            form.register_field("email", Some(required()));

            let error = form.validate_field("email").await.unwrap();
            assert_eq!(error, Some(json!("Required")));
            assert_eq!(form.errors(), json!({"email": "Required"}));
            assert!(!form.state().is_validating);
        }

        #[tokio::test]
        async fn test_validate_field_async_toggles_validating() {
            let gate = Arc::new(Notify::new());
            let form = form_with(json!({"username": "taken"}));
            let validator_gate = gate.clone();
            form.register_field(
                "username",
                Some(async_field_validator(move |v: Value| {
                    let gate = validator_gate.clone();
                    async move {
                        gate.notified().await;
                        Ok::<_, anyhow::Error>((v == json!("taken")).then(|| "Taken".to_string()))
                    }
                })),
            );

            let task = tokio::spawn({
                let form = form.clone();
                async move { form.validate_field("username").await }
            });
            while !form.state().is_validating {
                tokio::task::yield_now().await;
            }
            gate.notify_one();
            let error = task.await.unwrap().unwrap();
            assert_eq!(error, Some(json!("Taken")));
            assert!(!form.state().is_validating);
            assert_eq!(form.errors(), json!({"username": "Taken"}));
        }

        #[tokio::test]
        async fn test_validate_field_clears_error() {
            let form = form_with(json!({"email": "a@b.com"}));
            form.set_errors(json!({"email": "Required", "other": "x"}));
            form.register_field("email", Some(required()));
            assert_eq!(form.validate_field("email").await.unwrap(), None);
            assert_eq!(form.errors(), json!({"other": "x"}));
        }

        #[tokio::test]
        async fn test_validate_field_falls_back_to_schema() {
            let mut schema = MockSchema::new();
            schema
                .expect_validate_at()
                .withf(|path, _| path == "email")
                .times(1)
                .returning(|_, _| {
                    Err(ValidationFailure::aggregate(
                        "invalid",
                        vec![
                            ValidationFailure::at("email", "Invalid email"),
                            ValidationFailure::at("name", "Required"),
                        ],
                    )
                    .into())
                });
            let form = Form::new(
                FormConfig::new(json!({"email": "nope", "name": ""}), submit_handler(|_, _| Ok(())))
                    .validation_schema(Arc::new(schema)),
            )
            .unwrap();
            let error = form.validate_field("email").await.unwrap();
            assert_eq!(error, Some(json!("Invalid email")));
            assert_eq!(form.errors(), json!({"email": "Invalid email"}));
            assert!(!form.state().is_validating);
        }

        #[tokio::test]
        async fn test_validate_field_without_sources_is_noop() {
            let form = form_with(json!({"a": ""}));
            assert_eq!(form.validate_field("a").await.unwrap(), None);
            assert_eq!(form.errors(), json!({}));
        }

        #[tokio::test]
        async fn test_validator_crash_unwinds_validating() {
            let form = form_with(json!({"a": 1}));
            form.register_field(
                "a",
                Some(async_field_validator(|_| async {
                    Err::<Option<String>, _>(anyhow::anyhow!("service down"))
                })),
            );
            let err = assert_err!(form.validate_form(None).await);
            assert!(err.is_validation_crash());
            assert!(!form.state().is_validating);

            let err = assert_err!(form.validate_field("a").await);
            assert!(matches!(err, FormError::Validator(_)));
            assert!(!form.state().is_validating);
        }

        #[tokio::test]
        async fn test_last_run_to_resolve_wins() {
            init_tracing();
            let gates: Arc<Mutex<HashMap<i64, oneshot::Receiver<()>>>> = Arc::new(Mutex::new(HashMap::new()));
            let (first_tx, first_rx) = oneshot::channel();
            let (second_tx, second_rx) = oneshot::channel();
            gates.lock().unwrap().insert(1, first_rx);
            gates.lock().unwrap().insert(2, second_rx);

            let validator_gates = gates.clone();
            let validate = async_form_validator(move |values: Value, _| {
                let key = values["a"].as_i64().unwrap_or_default();
                let gate = validator_gates.lock().unwrap().remove(&key);
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    Ok::<_, anyhow::Error>(Some(json!({"a": format!("seen {key}")})))
                }
            });
            let form = Form::new(
                FormConfig::new(json!({"a": 0}), submit_handler(|_, _| Ok(()))).validate(validate),
            )
            .unwrap();

            let older = tokio::spawn({
                let form = form.clone();
                async move { form.set_field_value("a", json!(1), None).await }
            });
            let newer = tokio::spawn({
                let form = form.clone();
                async move { form.set_field_value("a", json!(2), None).await }
            });

            second_tx.send(()).unwrap();
            newer.await.unwrap().unwrap();
            assert_eq!(form.errors(), json!({"a": "seen 2"}));

            first_tx.send(()).unwrap();
            older.await.unwrap().unwrap();
            assert_eq!(form.values(), json!({"a": 2}));
            assert_eq!(form.errors(), json!({"a": "seen 1"}));
        }
    }

    mod lifecycle {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_mount_validates_when_enabled() {
            let form = Form::new(
                FormConfig::new(json!({"email": ""}), submit_handler(|_, _| Ok(())))
                    .validate(crate::validation::form_validator(|v, _| {
                        (v["email"] == json!("")).then(|| json!({"email": "Required"}))
                    }))
                    .validate_on_mount(true),
            )
            .unwrap();
            assert_ok!(form.mount().await);
            assert_eq!(form.errors(), json!({"email": "Required"}));
        }

        #[tokio::test]
        async fn test_mount_without_flag_does_nothing() {
            let form = form_with(json!({"email": ""}));
            form.register_field("email", Some(required()));
            assert_ok!(form.mount().await);
            assert_eq!(form.errors(), json!({}));
        }

        #[tokio::test]
        async fn test_reinitialize_resets_to_new_values() {
            let form = Form::new(
                FormConfig::new(json!({"a": 1}), submit_handler(|_, _| Ok(()))).enable_reinitialize(true),
            )
            .unwrap();
            assert_ok!(form.set_field_value("a", json!(5), None).await);
            assert!(form.dirty());

            assert_ok!(form.reinitialize(InitialState::new(json!({"a": 2}))).await);
            assert_eq!(form.values(), json!({"a": 2}));
            assert_eq!(form.initial_values(), json!({"a": 2}));
            assert!(!form.dirty());
        }

        #[tokio::test]
        async fn test_reinitialize_disabled_keeps_state() {
            let form = form_with(json!({"a": 1}));
            assert_ok!(
                form.reinitialize(InitialState::new(json!({"a": 2})).with_errors(json!({"a": "x"})))
                    .await
            );
            assert_eq!(form.values(), json!({"a": 1}));
            assert_eq!(form.initial_values(), json!({"a": 1}));
            assert_eq!(form.errors(), json!({}));
        }

        #[tokio::test]
        async fn test_reinitialize_replaces_errors_touched_status() {
            let form = Form::new(
                FormConfig::new(json!({"a": 1}), submit_handler(|_, _| Ok(()))).enable_reinitialize(true),
            )
            .unwrap();
            let next = InitialState::new(json!({"a": 1}))
                .with_errors(json!({"a": "server says no"}))
                .with_touched(json!({"a": true}))
                .with_status(json!("loaded"));
            assert_ok!(form.reinitialize(next).await);
            assert_eq!(form.errors(), json!({"a": "server says no"}));
            assert_eq!(form.touched(), json!({"a": true}));
            assert_eq!(form.status(), Some(json!("loaded")));
            assert_eq!(form.initial_errors(), json!({"a": "server says no"}));
            assert_eq!(form.initial_status(), Some(json!("loaded")));
        }

        #[tokio::test]
        async fn test_reset_form_with_values_updates_baseline() {
            let form = form_with(json!({"a": 1}));
            form.set_submitting(true);
            assert_ok!(form.reset_form(Some(ResetState::values(json!({"a": 3})))).await);
            let state = form.state();
            assert_eq!(state.values, json!({"a": 3}));
            assert!(!state.is_submitting);
            assert_eq!(form.initial_values(), json!({"a": 3}));
            assert!(!form.dirty());
        }

        #[tokio::test]
        async fn test_reset_hook_runs_with_current_values() {
            let mut hook = MockResetHandler::new();
            hook.expect_reset()
                .withf(|values, _| values == &json!({"a": 9}))
                .times(1)
                .returning(|_, _| MaybeAsync::Ready(Ok(())));
            let form = Form::new(
                FormConfig::new(json!({"a": 1}), submit_handler(|_, _| Ok(()))).on_reset(Arc::new(hook)),
            )
            .unwrap();
            assert_ok!(form.set_field_value("a", json!(9), None).await);
            assert_ok!(form.reset_form(None).await);
            assert_eq!(form.values(), json!({"a": 1}));
        }

        #[tokio::test]
        async fn test_reset_hook_failure_leaves_form_untouched() {
            let form = Form::new(
                FormConfig::new(json!({"a": 1}), submit_handler(|_, _| Ok(())))
                    .on_reset(reset_handler(|_, _| Err(anyhow::anyhow!("unsaved changes")))),
            )
            .unwrap();
            assert_ok!(form.set_field_value("a", json!(2), None).await);
            let err = assert_err!(form.reset_form(Some(ResetState::values(json!({"a": 5})))).await);
            assert!(matches!(err, FormError::ResetRejected(_)));
            assert_eq!(form.values(), json!({"a": 2}));
            assert_eq!(form.initial_values(), json!({"a": 1}));
        }

        fn gated_reset_form() -> (Form, Arc<Notify>, Arc<Notify>) {
            init_tracing();
            let started = Arc::new(Notify::new());
            let release = Arc::new(Notify::new());
            let (s, r) = (started.clone(), release.clone());
            let form = Form::new(
                FormConfig::new(json!({"a": 1}), submit_handler(|_, _| Ok(()))).on_reset(
                    async_reset_handler(move |_, _| {
                        let (started, release) = (s.clone(), r.clone());
                        async move {
                            started.notify_one();
                            release.notified().await;
                            Ok::<_, anyhow::Error>(())
                        }
                    }),
                ),
            )
            .unwrap();
            (form, started, release)
        }

        #[tokio::test]
        async fn test_deferred_reset_hook_holds_reset_until_resolved() {
            let (form, started, release) = gated_reset_form();
            assert_ok!(form.set_field_value("a", json!(7), None).await);
            let task = tokio::spawn({
                let form = form.clone();
                async move { form.reset_form(Some(ResetState::values(json!({"a": 3})))).await }
            });

            started.notified().await;
            assert_eq!(form.values(), json!({"a": 7}));
            assert_eq!(form.initial_values(), json!({"a": 1}));

            release.notify_one();
            assert_ok!(task.await.unwrap());
            assert_eq!(form.values(), json!({"a": 3}));
            assert_eq!(form.initial_values(), json!({"a": 3}));
        }

        #[tokio::test]
        async fn test_teardown_during_deferred_reset_hook_skips_reset() {
            let (form, started, release) = gated_reset_form();
            assert_ok!(form.set_field_value("a", json!(7), None).await);
            let updates = form.subscribe();
            let task = tokio::spawn({
                let form = form.clone();
                async move { form.reset_form(None).await }
            });

            started.notified().await;
            form.teardown();
            release.notify_one();

            assert_ok!(task.await.unwrap());
            assert!(!updates.has_changed().unwrap());
            assert_eq!(form.values(), json!({"a": 7}));
            assert_eq!(form.initial_values(), json!({"a": 1}));
        }

        #[tokio::test]
        async fn test_submit_handler_may_drive_the_form() {
            let form = Form::new(FormConfig::new(
                json!({"a": 1}),
                async_submit_handler(|values, form: Form| async move {
                    form.set_status(Some(json!({"sent": values["a"].clone()})));
                    Ok::<_, anyhow::Error>(())
                }),
            ))
            .unwrap();
            assert_eq!(form.submit_form().await.unwrap(), SubmitOutcome::Submitted);
            assert_eq!(form.status(), Some(json!({"sent": 1})));
        }
    }
}
