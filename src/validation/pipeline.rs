//! Validation pipeline: field, schema and function validation joined and merged

use super::merge::merge_all;
use super::schema::{run_schema, Schema};
use super::validator::FormValidator;
use crate::error::{FormError, FormResult};
use crate::path::{empty_tree, get_in, set_in};
use crate::registry::RegisteredValidator;
use futures::future::join_all;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Runs the three validation sources and merges their error trees
#[derive(Clone, Default)]
pub struct ValidationPipeline {
    schema: Option<Arc<dyn Schema>>,
    validate: Option<Arc<dyn FormValidator>>,
}

impl fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("schema", &self.schema.is_some())
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

impl ValidationPipeline {
    pub fn new(schema: Option<Arc<dyn Schema>>, validate: Option<Arc<dyn FormValidator>>) -> Self {
        Self { schema, validate }
    }

    /// Check if a schema validator is configured
    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    /// Run field, schema and function validation together and merge.
    ///
    /// All three sources settle before anything is combined; merge order is
    /// field < schema < function regardless of completion order. A crash in
    /// any source fails the whole run.
    pub async fn run_all(&self, fields: &[RegisteredValidator], values: &Value) -> FormResult<Value> {
        let (field_errors, schema_errors, function_errors) = tokio::join!(
            run_field_level(fields, values),
            self.run_schema(values, None),
            self.run_validate(values, None),
        );

        let field_errors = field_errors?;
        let schema_errors = schema_errors?;
        let function_errors = function_errors?;
        Ok(merge_all([&field_errors, &schema_errors, &function_errors]))
    }

    /// Run only the schema, optionally scoped to `field`
    pub async fn run_schema(&self, values: &Value, field: Option<&str>) -> FormResult<Value> {
        match &self.schema {
            Some(schema) => run_schema(schema.as_ref(), values, field).await,
            None => Ok(empty_tree()),
        }
    }

    /// Run only the whole-form validate function
    pub async fn run_validate(&self, values: &Value, field: Option<&str>) -> FormResult<Value> {
        let Some(validate) = &self.validate else {
            return Ok(empty_tree());
        };

        match validate.validate(values, field).resolve().await {
            Ok(Some(Value::Null)) | Ok(None) => Ok(empty_tree()),
            Ok(Some(errors)) => Ok(errors),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "validate function failed");
                Err(FormError::Validator(err))
            }
        }
    }
}

/// Run every registered field validator against its current value
pub async fn run_field_level(fields: &[RegisteredValidator], values: &Value) -> FormResult<Value> {
    if fields.is_empty() {
        return Ok(empty_tree());
    }

    let checks = fields.iter().map(|(path, validator)| {
        let value = get_in(values, path).cloned().unwrap_or(Value::Null);
        validator.validate(&value).resolve()
    });
    let results = join_all(checks).await;

    let mut errors = empty_tree();
    for ((path, _), result) in fields.iter().zip(results) {
        match result {
            Ok(Some(message)) if !message.is_empty() => {
                errors = set_in(&errors, path, Value::String(message));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(field = %path, error = %format!("{err:#}"), "field validator failed");
                return Err(FormError::Validator(err.context(format!("validating field `{path}`"))));
            }
        }
    }
    Ok(errors)
}
