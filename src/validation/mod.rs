//! Validation layer
//!
//! Three independent sources feed one combined error tree: per-field
//! validators from the registry, an optional schema, and an optional
//! whole-form validate function.

mod merge;
mod pipeline;
mod schema;
mod validator;

pub use merge::{count_errors, has_errors, merge_all, merge_errors};
pub use pipeline::{run_field_level, ValidationPipeline};
pub use schema::{prepare_for_validation, run_schema, Schema, SchemaError, ValidationFailure};
pub use validator::{
    async_field_validator, async_form_validator, field_validator, form_validator, FieldCheck,
    FieldValidator, FormCheck, FormValidator, MaybeAsync,
};

#[cfg(test)]
pub use schema::MockSchema;
