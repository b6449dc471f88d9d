//! Consumer callbacks: submit handler and reset hook

use crate::form::Form;
use crate::validation::MaybeAsync;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a consumer hook; `Pending` work is awaited by the engine
pub type HookCheck = MaybeAsync<anyhow::Result<()>>;

/// Trait for submit handlers, enabling mocking in tests.
///
/// A `Ready` result means the handler manages `is_submitting` itself; a
/// `Pending` result hands the flag back to the engine once it settles.
#[cfg_attr(test, mockall::automock)]
pub trait SubmitHandler: Send + Sync {
    /// Called with the validated values and a handle to the form
    fn submit(&self, values: Value, form: Form) -> HookCheck;
}

/// Trait for reset hooks, enabling mocking in tests
#[cfg_attr(test, mockall::automock)]
pub trait ResetHandler: Send + Sync {
    /// Called with the values being discarded, before the reset commits
    fn reset(&self, values: Value, form: Form) -> HookCheck;
}

struct SyncSubmit<F>(F);
struct AsyncSubmit<F>(F);
struct SyncReset<F>(F);
struct AsyncReset<F>(F);

impl<F> SubmitHandler for SyncSubmit<F>
where
    F: Fn(Value, Form) -> anyhow::Result<()> + Send + Sync,
{
    fn submit(&self, values: Value, form: Form) -> HookCheck {
        MaybeAsync::Ready((self.0)(values, form))
    }
}

impl<F, Fut> SubmitHandler for AsyncSubmit<F>
where
    F: Fn(Value, Form) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn submit(&self, values: Value, form: Form) -> HookCheck {
        MaybeAsync::pending((self.0)(values, form))
    }
}

impl<F> ResetHandler for SyncReset<F>
where
    F: Fn(Value, Form) -> anyhow::Result<()> + Send + Sync,
{
    fn reset(&self, values: Value, form: Form) -> HookCheck {
        MaybeAsync::Ready((self.0)(values, form))
    }
}

impl<F, Fut> ResetHandler for AsyncReset<F>
where
    F: Fn(Value, Form) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn reset(&self, values: Value, form: Form) -> HookCheck {
        MaybeAsync::pending((self.0)(values, form))
    }
}

/// Build a synchronous submit handler
pub fn submit_handler<F>(f: F) -> Arc<dyn SubmitHandler>
where
    F: Fn(Value, Form) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(SyncSubmit(f))
}

/// Build an asynchronous submit handler
pub fn async_submit_handler<F, Fut>(f: F) -> Arc<dyn SubmitHandler>
where
    F: Fn(Value, Form) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(AsyncSubmit(f))
}

pub fn reset_handler<F>(f: F) -> Arc<dyn ResetHandler>
where
    F: Fn(Value, Form) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(SyncReset(f))
}

pub fn async_reset_handler<F, Fut>(f: F) -> Arc<dyn ResetHandler>
where
    F: Fn(Value, Form) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(AsyncReset(f))
}
