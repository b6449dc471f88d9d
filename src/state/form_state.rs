//! Form state record and baseline snapshots

use crate::path::empty_tree;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The canonical state of a form.
///
/// Produced only by the reducer; never mutated in place once published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    /// Current field values
    pub values: Value,
    /// Sparse error tree mirroring `values`
    pub errors: Value,
    /// Sparse tree of touched flags
    pub touched: Value,
    /// Opaque consumer payload
    pub status: Option<Value>,
    pub is_submitting: bool,
    pub is_validating: bool,
    /// Incremented once per submit attempt
    pub submit_count: u32,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            values: empty_tree(),
            errors: empty_tree(),
            touched: empty_tree(),
            status: None,
            is_submitting: false,
            is_validating: false,
            submit_count: 0,
        }
    }
}

impl FormState {
    /// Initial state built from a baseline snapshot
    pub fn from_initial(initial: &InitialState) -> Self {
        Self {
            values: initial.values.clone(),
            errors: initial.errors.clone(),
            touched: initial.touched.clone(),
            status: initial.status.clone(),
            ..Self::default()
        }
    }
}

/// Baseline values used for `dirty` and the `initial_*` projections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialState {
    pub values: Value,
    #[serde(default = "empty_tree")]
    pub errors: Value,
    #[serde(default = "empty_tree")]
    pub touched: Value,
    #[serde(default)]
    pub status: Option<Value>,
}

impl InitialState {
    /// Baseline with the given values and empty errors/touched
    pub fn new(values: Value) -> Self {
        Self {
            values,
            errors: empty_tree(),
            touched: empty_tree(),
            status: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_touched(mut self, touched: Value) -> Self {
        self.touched = touched;
        self
    }

    pub fn with_status(mut self, status: Value) -> Self {
        self.status = Some(status);
        self
    }
}

impl Default for InitialState {
    fn default() -> Self {
        Self::new(empty_tree())
    }
}

/// Partial state for `reset_form`.
///
/// Absent values/errors/touched/status fall back to the baseline; flags
/// default to false and the submit count to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetState {
    pub values: Option<Value>,
    pub errors: Option<Value>,
    pub touched: Option<Value>,
    pub status: Option<Value>,
    pub is_submitting: Option<bool>,
    pub is_validating: Option<bool>,
    pub submit_count: Option<u32>,
}

impl ResetState {
    /// Reset to new values, everything else from the baseline
    pub fn values(values: Value) -> Self {
        Self {
            values: Some(values),
            ..Self::default()
        }
    }

    /// Resolve against the baseline, yielding the new baseline and state
    pub fn resolve(self, baseline: &InitialState) -> (InitialState, FormState) {
        let snapshot = InitialState {
            values: self.values.unwrap_or_else(|| baseline.values.clone()),
            errors: self.errors.unwrap_or_else(|| baseline.errors.clone()),
            touched: self.touched.unwrap_or_else(|| baseline.touched.clone()),
            status: self.status.or_else(|| baseline.status.clone()),
        };
        let state = FormState {
            is_submitting: self.is_submitting.unwrap_or(false),
            is_validating: self.is_validating.unwrap_or(false),
            submit_count: self.submit_count.unwrap_or(0),
            ..FormState::from_initial(&snapshot)
        };
        (snapshot, state)
    }
}
