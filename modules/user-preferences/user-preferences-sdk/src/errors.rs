//! Error types for the user preferences SDK.

use thiserror::Error;

/// A single rejected field in a preference write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum PreferencesError {
    #[error("Unknown preference key '{0}'")]
    UnknownKey(String),

    #[error("Validation failed for {} field(s)", violations.len())]
    Validation { violations: Vec<FieldViolation> },

    #[error("Internal error")]
    Internal,
}

impl PreferencesError {
    #[must_use]
    pub fn unknown_key(key: impl Into<String>) -> Self {
        Self::UnknownKey(key.into())
    }

    #[must_use]
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }
}
