//! Validator seams for field-level and whole-form validation

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A result that is either available now or produced later.
///
/// Validators and handlers return this so the engine can tell synchronous
/// work (no `is_validating` flicker, no submit bookkeeping) from deferred work.
pub enum MaybeAsync<T> {
    /// Result computed synchronously
    Ready(T),
    /// Result still being computed
    Pending(BoxFuture<'static, T>),
}

impl<T> MaybeAsync<T> {
    /// Wrap a future as a pending result
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        MaybeAsync::Pending(future.boxed())
    }

    /// Returns true if the result is deferred
    pub fn is_pending(&self) -> bool {
        matches!(self, MaybeAsync::Pending(_))
    }

    /// Wait for the result
    pub async fn resolve(self) -> T {
        match self {
            MaybeAsync::Ready(value) => value,
            MaybeAsync::Pending(future) => future.await,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MaybeAsync<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeAsync::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            MaybeAsync::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Outcome of a single field check: `Ok(None)` means valid, `Err` is a crash
pub type FieldCheck = MaybeAsync<anyhow::Result<Option<String>>>;

/// Outcome of a whole-form check: `Ok(None)` means no errors
pub type FormCheck = MaybeAsync<anyhow::Result<Option<Value>>>;

/// Validator attached to a single registered field
pub trait FieldValidator: Send + Sync {
    /// Validate the current value at the field's path (`null` when absent)
    fn validate(&self, value: &Value) -> FieldCheck;
}

/// Whole-form validator, optionally scoped to one field
pub trait FormValidator: Send + Sync {
    /// Validate `values`, returning a sparse error tree
    fn validate(&self, values: &Value, field: Option<&str>) -> FormCheck;
}

struct SyncField<F>(F);

impl<F> FieldValidator for SyncField<F>
where
    F: Fn(&Value) -> Option<String> + Send + Sync,
{
    fn validate(&self, value: &Value) -> FieldCheck {
        MaybeAsync::Ready(Ok((self.0)(value)))
    }
}

struct AsyncField<F>(F);

impl<F, Fut> FieldValidator for AsyncField<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Option<String>>> + Send + 'static,
{
    fn validate(&self, value: &Value) -> FieldCheck {
        MaybeAsync::pending((self.0)(value.clone()))
    }
}

struct SyncForm<F>(F);

impl<F> FormValidator for SyncForm<F>
where
    F: Fn(&Value, Option<&str>) -> Option<Value> + Send + Sync,
{
    fn validate(&self, values: &Value, field: Option<&str>) -> FormCheck {
        MaybeAsync::Ready(Ok((self.0)(values, field)))
    }
}

struct AsyncForm<F>(F);

impl<F, Fut> FormValidator for AsyncForm<F>
where
    F: Fn(Value, Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
{
    fn validate(&self, values: &Value, field: Option<&str>) -> FormCheck {
        MaybeAsync::pending((self.0)(values.clone(), field.map(str::to_string)))
    }
}

/// Build a synchronous field validator from a closure returning a message
pub fn field_validator<F>(f: F) -> Arc<dyn FieldValidator>
where
    F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(SyncField(f))
}

/// Build an asynchronous field validator
pub fn async_field_validator<F, Fut>(f: F) -> Arc<dyn FieldValidator>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<String>>> + Send + 'static,
{
    Arc::new(AsyncField(f))
}

/// Build a synchronous whole-form validator
pub fn form_validator<F>(f: F) -> Arc<dyn FormValidator>
where
    F: Fn(&Value, Option<&str>) -> Option<Value> + Send + Sync + 'static,
{
    Arc::new(SyncForm(f))
}

/// Build an asynchronous whole-form validator
pub fn async_form_validator<F, Fut>(f: F) -> Arc<dyn FormValidator>
where
    F: Fn(Value, Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
{
    Arc::new(AsyncForm(f))
}
