//! Configuration handling for forms

use crate::error::{FormError, FormResult};
use crate::hooks::{ResetHandler, SubmitHandler};
use crate::path::{empty_tree, is_container};
use crate::state::InitialState;
use crate::validation::{FormValidator, Schema, ValidationPipeline};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Validation trigger policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Validate after value changes
    pub validate_on_change: bool,
    /// Validate after touched changes
    pub validate_on_blur: bool,
    /// Validate the initial values on mount
    pub validate_on_mount: bool,
    /// Reset the form when new initial values arrive
    pub enable_reinitialize: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            validate_on_blur: true,
            validate_on_mount: false,
            enable_reinitialize: false,
        }
    }
}

impl FormOptions {
    /// Parse options from JSON; missing keys take their defaults
    pub fn from_json_str(content: &str) -> FormResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load options from a JSON file, or defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> FormResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "form options file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> FormResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything a form is built from
#[derive(Clone)]
pub struct FormConfig {
    pub(crate) initial: InitialState,
    pub(crate) on_submit: Arc<dyn SubmitHandler>,
    pub(crate) on_reset: Option<Arc<dyn ResetHandler>>,
    pub(crate) validate: Option<Arc<dyn FormValidator>>,
    pub(crate) schema: Option<Arc<dyn Schema>>,
    pub(crate) initial_valid: Option<bool>,
    pub(crate) options: FormOptions,
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("initial", &self.initial)
            .field("on_reset", &self.on_reset.is_some())
            .field("validate", &self.validate.is_some())
            .field("schema", &self.schema.is_some())
            .field("initial_valid", &self.initial_valid)
            .field("options", &self.options)
            .finish()
    }
}

impl FormConfig {
    pub fn new(initial_values: Value, on_submit: Arc<dyn SubmitHandler>) -> Self {
        Self {
            initial: InitialState::new(initial_values),
            on_submit,
            on_reset: None,
            validate: None,
            schema: None,
            initial_valid: None,
            options: FormOptions::default(),
        }
    }

    pub fn initial_errors(mut self, errors: Value) -> Self {
        self.initial.errors = errors;
        self
    }

    pub fn initial_touched(mut self, touched: Value) -> Self {
        self.initial.touched = touched;
        self
    }

    pub fn initial_status(mut self, status: Value) -> Self {
        self.initial.status = Some(status);
        self
    }

    /// Hook run before every reset
    pub fn on_reset(mut self, handler: Arc<dyn ResetHandler>) -> Self {
        self.on_reset = Some(handler);
        self
    }

    /// Whole-form validate function
    pub fn validate(mut self, validator: Arc<dyn FormValidator>) -> Self {
        self.validate = Some(validator);
        self
    }

    pub fn validation_schema(mut self, schema: Arc<dyn Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Validity reported while the form is not dirty
    pub fn initial_valid(mut self, valid: bool) -> Self {
        self.initial_valid = Some(valid);
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.options.validate_on_change = enabled;
        self
    }

    pub fn validate_on_blur(mut self, enabled: bool) -> Self {
        self.options.validate_on_blur = enabled;
        self
    }

    pub fn validate_on_mount(mut self, enabled: bool) -> Self {
        self.options.validate_on_mount = enabled;
        self
    }

    pub fn enable_reinitialize(mut self, enabled: bool) -> Self {
        self.options.enable_reinitialize = enabled;
        self
    }

    /// Verify the value trees have a usable shape
    pub fn check(&self) -> FormResult<()> {
        if !is_container(&self.initial.values) {
            return Err(FormError::invalid_config(
                "initial values must be an object or array",
            ));
        }
        if !self.initial.errors.is_object() {
            return Err(FormError::invalid_config("initial errors must be an object"));
        }
        if !self.initial.touched.is_object() {
            return Err(FormError::invalid_config("initial touched must be an object"));
        }
        Ok(())
    }

    pub(crate) fn pipeline(&self) -> ValidationPipeline {
        ValidationPipeline::new(self.schema.clone(), self.validate.clone())
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self::new(
            empty_tree(),
            crate::hooks::submit_handler(|_, _| Ok(())),
        )
    }
}
