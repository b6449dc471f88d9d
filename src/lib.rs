//! Form Engine - form state and validation for nested records
//!
//! Tracks values, touched flags, error messages and the submission
//! lifecycle of a form, and merges errors from per-field validators, a
//! pluggable schema and a whole-form validate function.
//!
//! ```no_run
//! use form_engine::{field_validator, submit_handler, Form, FormConfig, SubmitOutcome};
//! use serde_json::json;
//!
//! # async fn run() -> form_engine::FormResult<()> {
//! let form = Form::new(FormConfig::new(
//!     json!({"email": ""}),
//!     submit_handler(|values, _| {
//!         println!("submitting {values}");
//!         Ok(())
//!     }),
//! ))?;
//! form.register_field(
//!     "email",
//!     Some(field_validator(|v| {
//!         v.as_str().filter(|s| !s.is_empty()).is_none().then(|| "Required".to_string())
//!     })),
//! );
//! assert_eq!(form.submit_form().await?, SubmitOutcome::Rejected);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod form;
pub mod hooks;
pub mod path;
pub mod registry;
pub mod state;
pub mod validation;

pub use config::{FormConfig, FormOptions};
pub use error::{FormError, FormResult};
pub use form::{
    BlurInput, ChangeInput, FieldHelpers, FieldMeta, FieldOptions, FieldProps, FieldSpec, Form,
    InputEvent, InputKind, Liveness, SelectOption, SubmitOutcome, ValuesUpdate,
};
pub use hooks::{
    async_reset_handler, async_submit_handler, reset_handler, submit_handler, ResetHandler,
    SubmitHandler,
};
pub use path::{get_in, remove_in, set_in, set_nested_values, Path, Seg};
pub use state::{FormMessage, FormState, InitialState, ResetState};
pub use validation::{
    async_field_validator, async_form_validator, field_validator, form_validator, FieldValidator,
    FormValidator, MaybeAsync, Schema, SchemaError, ValidationFailure,
};
