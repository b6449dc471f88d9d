//! Form reducer: the closed message set and its transitions

use super::form_state::FormState;
use crate::path::{remove_in, set_in, set_nested_values};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Whole-state transform used by `SetFormState`
pub struct StateTransform(Box<dyn FnOnce(&FormState) -> FormState + Send>);

impl StateTransform {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&FormState) -> FormState + Send + 'static,
    {
        Self(Box::new(f))
    }

    fn apply(self, state: &FormState) -> FormState {
        (self.0)(state)
    }
}

impl fmt::Debug for StateTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateTransform(..)")
    }
}

/// Messages accepted by the reducer
#[derive(Debug)]
pub enum FormMessage {
    SubmitAttempt,
    SubmitFailure,
    SubmitSuccess,
    SetValidating(bool),
    SetSubmitting(bool),
    SetValues(Value),
    SetTouched(Value),
    SetErrors(Value),
    SetStatus(Option<Value>),
    SetFieldValue { path: String, value: Value },
    SetFieldTouched { path: String, touched: bool },
    /// `None` or `null` clears the error at `path`
    SetFieldError { path: String, error: Option<Value> },
    Reset(FormState),
    SetFormState(StateTransform),
}

impl FormMessage {
    /// Message name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            FormMessage::SubmitAttempt => "submit_attempt",
            FormMessage::SubmitFailure => "submit_failure",
            FormMessage::SubmitSuccess => "submit_success",
            FormMessage::SetValidating(_) => "set_validating",
            FormMessage::SetSubmitting(_) => "set_submitting",
            FormMessage::SetValues(_) => "set_values",
            FormMessage::SetTouched(_) => "set_touched",
            FormMessage::SetErrors(_) => "set_errors",
            FormMessage::SetStatus(_) => "set_status",
            FormMessage::SetFieldValue { .. } => "set_field_value",
            FormMessage::SetFieldTouched { .. } => "set_field_touched",
            FormMessage::SetFieldError { .. } => "set_field_error",
            FormMessage::Reset(_) => "reset",
            FormMessage::SetFormState(_) => "set_form_state",
        }
    }
}

/// Apply `message` to `state`, producing the next state.
///
/// `SetErrors` with a structurally equal tree returns `state` itself so
/// subscribers can skip the update.
pub fn form_reducer(state: &Arc<FormState>, message: FormMessage) -> Arc<FormState> {
    let current = state.as_ref();
    let next = match message {
        FormMessage::SetErrors(errors) => {
            if current.errors == errors {
                return Arc::clone(state);
            }
            FormState {
                errors,
                ..current.clone()
            }
        }
        FormMessage::SetValues(values) => FormState {
            values,
            ..current.clone()
        },
        FormMessage::SetTouched(touched) => FormState {
            touched,
            ..current.clone()
        },
        FormMessage::SetStatus(status) => FormState {
            status,
            ..current.clone()
        },
        FormMessage::SetValidating(is_validating) => FormState {
            is_validating,
            ..current.clone()
        },
        FormMessage::SetSubmitting(is_submitting) => FormState {
            is_submitting,
            ..current.clone()
        },
        FormMessage::SetFieldValue { path, value } => FormState {
            values: set_in(&current.values, &path, value),
            ..current.clone()
        },
        FormMessage::SetFieldTouched { path, touched } => FormState {
            touched: set_in(&current.touched, &path, Value::Bool(touched)),
            ..current.clone()
        },
        FormMessage::SetFieldError { path, error } => {
            let errors = match error {
                None | Some(Value::Null) => remove_in(&current.errors, &path),
                Some(error) => set_in(&current.errors, &path, error),
            };
            FormState {
                errors,
                ..current.clone()
            }
        }
        FormMessage::SubmitAttempt => FormState {
            touched: set_nested_values(&current.values, &Value::Bool(true)),
            is_submitting: true,
            submit_count: current.submit_count.saturating_add(1),
            ..current.clone()
        },
        FormMessage::SubmitSuccess | FormMessage::SubmitFailure => FormState {
            is_submitting: false,
            ..current.clone()
        },
        FormMessage::Reset(next) => next,
        FormMessage::SetFormState(transform) => transform.apply(current),
    };
    Arc::new(next)
}
