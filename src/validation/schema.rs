//! Pluggable schema validation contract
//!
//! The engine does not define a schema language. A schema only has to
//! report failures as [`ValidationFailure`] so they can be told apart from
//! a misconfigured schema, which is re-raised.

use crate::error::{FormError, FormResult};
use crate::path::{empty_tree, get_in, set_in};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A recognized schema validation failure.
///
/// Either a single failure at `path`, or an aggregate whose `inner` list
/// carries one failure per offending path.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationFailure {
    /// Field path the failure applies to
    pub path: Option<String>,
    /// Human readable message
    pub message: String,
    /// Nested failures, one per offending path
    #[serde(default)]
    pub inner: Vec<ValidationFailure>,
}

impl ValidationFailure {
    /// A failure at a single path
    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
            inner: Vec::new(),
        }
    }

    /// An aggregate failure wrapping per-path failures
    pub fn aggregate(message: impl Into<String>, inner: Vec<ValidationFailure>) -> Self {
        Self {
            path: None,
            message: message.into(),
            inner,
        }
    }

    /// Translate into a sparse error tree keyed by path.
    ///
    /// The first message reported for a path wins. Failures without a path
    /// have nowhere to go and are skipped.
    pub fn to_error_tree(&self) -> Value {
        let mut errors = empty_tree();
        if self.inner.is_empty() {
            if let Some(path) = &self.path {
                errors = set_in(&errors, path, Value::String(self.message.clone()));
            }
            return errors;
        }

        for failure in &self.inner {
            let Some(path) = &failure.path else {
                continue;
            };
            if get_in(&errors, path).is_none() {
                errors = set_in(&errors, path, Value::String(failure.message.clone()));
            }
        }
        errors
    }
}

/// Errors a schema may raise
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The values failed validation
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
    /// Anything else: a broken or misconfigured schema
    #[error("{0:#}")]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for SchemaError {
    fn from(err: anyhow::Error) -> Self {
        SchemaError::Other(err)
    }
}

/// Trait for schema validators, enabling mocking in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Schema: Send + Sync {
    /// Validate the whole values tree
    async fn validate(&self, values: &Value) -> Result<(), SchemaError>;

    /// Validate a single field; defaults to validating the whole tree
    async fn validate_at(&self, path: &str, values: &Value) -> Result<(), SchemaError> {
        let _ = path;
        self.validate(values).await
    }
}

/// Copy of `values` with every empty string replaced by `null`
pub fn prepare_for_validation(values: &Value) -> Value {
    match values {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), prepare_for_validation(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(prepare_for_validation).collect()),
        Value::String(s) if s.is_empty() => Value::Null,
        other => other.clone(),
    }
}

/// Run `schema` against `values`, optionally scoped to `field`
pub async fn run_schema(schema: &dyn Schema, values: &Value, field: Option<&str>) -> FormResult<Value> {
    let prepared = prepare_for_validation(values);
    let outcome = match field {
        Some(path) => schema.validate_at(path, &prepared).await,
        None => schema.validate(&prepared).await,
    };

    match outcome {
        Ok(()) => Ok(empty_tree()),
        Err(SchemaError::Invalid(failure)) => Ok(failure.to_error_tree()),
        Err(SchemaError::Other(err)) => {
            tracing::warn!(error = %format!("{err:#}"), "schema raised a non-validation error");
            Err(FormError::Schema(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    mod failure {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_single_failure_at_path() {
            let failure = ValidationFailure::at("user.email", "Invalid email");
            assert_eq!(failure.to_error_tree(), json!({"user": {"email": "Invalid email"}}));
        }

        #[test]
        fn test_aggregate_first_message_per_path_wins() {
            let failure = ValidationFailure::aggregate(
                "2 errors",
                vec![
                    ValidationFailure::at("name", "Required"),
                    ValidationFailure::at("name", "Too short"),
                    ValidationFailure::at("tags[1]", "Unknown tag"),
                ],
            );
            assert_eq!(
                failure.to_error_tree(),
                json!({"name": "Required", "tags": [null, "Unknown tag"]})
            );
        }

        #[test]
        fn test_pathless_failure_is_skipped() {
            let failure = ValidationFailure {
                path: None,
                message: "broken".to_string(),
                inner: Vec::new(),
            };
            assert_eq!(failure.to_error_tree(), json!({}));
        }

        #[test]
        fn test_deserialize_without_inner() {
            let failure: ValidationFailure =
                serde_json::from_str(r#"{"path": "a", "message": "m"}"#).unwrap();
            assert_eq!(failure, ValidationFailure::at("a", "m"));
        }
    }

    mod prepare {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_empty_strings_become_null() {
            let values = json!({"a": "", "b": "x", "c": {"d": ""}, "e": ["", "y", {"f": ""}]});
            assert_eq!(
                prepare_for_validation(&values),
                json!({"a": null, "b": "x", "c": {"d": null}, "e": [null, "y", {"f": null}]})
            );
        }
    }

    mod run {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_passing_schema_yields_empty_tree() {
            let mut schema = MockSchema::new();
            schema.expect_validate().times(1).returning(|_| Ok(()));
            let errors = run_schema(&schema, &json!({"a": 1}), None).await.unwrap();
            assert_eq!(errors, json!({}));
        }

        #[tokio::test]
        async fn test_schema_sees_prepared_values() {
            let mut schema = MockSchema::new();
            schema
                .expect_validate()
                .withf(|values| values == &json!({"email": null}))
                .times(1)
                .returning(|_| Err(ValidationFailure::at("email", "Required").into()));
            let errors = run_schema(&schema, &json!({"email": ""}), None).await.unwrap();
            assert_eq!(errors, json!({"email": "Required"}));
        }

        #[tokio::test]
        async fn test_field_scope_uses_validate_at() {
            let mut schema = MockSchema::new();
            schema.expect_validate().times(0);
            schema
                .expect_validate_at()
                .withf(|path, _| path == "email")
                .times(1)
                .returning(|_, _| Err(ValidationFailure::at("email", "Invalid").into()));
            let errors = run_schema(&schema, &json!({"email": "x"}), Some("email"))
                .await
                .unwrap();
            assert_eq!(errors, json!({"email": "Invalid"}));
        }

        #[tokio::test]
        async fn test_configuration_error_is_raised() {
            let mut schema = MockSchema::new();
            schema
                .expect_validate()
                .returning(|_| Err(anyhow::anyhow!("unknown rule `emial`").into()));
            let err = run_schema(&schema, &json!({}), None).await.unwrap_err();
            assert!(matches!(err, FormError::Schema(_)));
        }
    }
}
