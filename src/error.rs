//! Error types for form engine operations

use thiserror::Error;

/// Result type alias for form engine operations
pub type FormResult<T> = Result<T, FormError>;

/// Errors surfaced by the form engine.
///
/// Invalid input is never an error: field messages are recorded in the
/// form's `errors` tree. These variants cover broken validators, rejected
/// handlers and bad configuration.
#[derive(Debug, Error)]
pub enum FormError {
    /// A field, form or schema validator crashed instead of reporting messages
    #[error("validator failed: {0:#}")]
    Validator(anyhow::Error),

    /// The schema raised something other than a validation failure
    #[error("schema configuration error: {0:#}")]
    Schema(anyhow::Error),

    /// The submit handler rejected
    #[error("submit handler rejected: {0:#}")]
    SubmitRejected(anyhow::Error),

    /// The reset hook rejected; the reset was not applied
    #[error("reset hook rejected: {0:#}")]
    ResetRejected(anyhow::Error),

    /// Construction-time configuration is not usable
    #[error("invalid form configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration
        message: String,
    },

    /// Form options could not be parsed
    #[error("failed to parse form options: {0}")]
    Options(#[from] serde_json::Error),

    /// Form options file could not be read
    #[error("failed to read form options: {0}")]
    Io(#[from] std::io::Error),
}

impl FormError {
    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        FormError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for errors raised by validation rather than submission
    pub fn is_validation_crash(&self) -> bool {
        matches!(self, FormError::Validator(_) | FormError::Schema(_))
    }
}
