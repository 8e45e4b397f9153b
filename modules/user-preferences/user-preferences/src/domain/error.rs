use user_preferences_sdk::{FieldViolation, PreferencesError, UnknownPreferenceKey};

use super::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown preference key '{0}'")]
    UnknownKey(String),

    #[error("Validation failed: {}", format_violations(violations))]
    Validation { violations: Vec<FieldViolation> },

    #[error("Preference registry fault: {0}")]
    Registry(RegistryError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl DomainError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![FieldViolation::new(field, message)],
        }
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<RegistryError> for DomainError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Invalid { field, message } => Self::Validation {
                violations: vec![FieldViolation { field, message }],
            },
            other => Self::Registry(other),
        }
    }
}

impl From<UnknownPreferenceKey> for DomainError {
    fn from(e: UnknownPreferenceKey) -> Self {
        Self::UnknownKey(e.0)
    }
}

impl From<DomainError> for PreferencesError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnknownKey(key) => Self::unknown_key(key),
            DomainError::Validation { violations } => Self::validation(violations),
            DomainError::Registry(_) | DomainError::Database(_) => Self::internal(),
        }
    }
}
