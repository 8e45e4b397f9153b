//! `UserPreferencesApi` trait definition.
//!
//! This trait defines the public API for the user preferences module.
//! Every method is scoped to a single user identity.

use async_trait::async_trait;

use crate::errors::PreferencesError;
use crate::models::{PreferenceEntry, PreferenceKey, PreferenceValue, UserId};

/// Public API trait for the user preferences module.
///
/// Reads never fail because of stored data the registry cannot interpret;
/// such values are reported through logs and replaced by the key's default.
#[async_trait]
pub trait UserPreferencesApi: Send + Sync {
    /// Effective value of one preference. Returns the default when the user
    /// never overrode it.
    async fn get(
        &self,
        user: UserId,
        key: PreferenceKey,
    ) -> Result<PreferenceValue, PreferencesError>;

    /// Every registered preference, in declaration order.
    async fn get_all(&self, user: UserId) -> Result<Vec<PreferenceEntry>, PreferencesError>;

    /// Store an override. Setting a key to its default removes the override.
    async fn set(
        &self,
        user: UserId,
        key: PreferenceKey,
        value: PreferenceValue,
    ) -> Result<(), PreferencesError>;

    /// Validate and apply several overrides at once. Nothing is written
    /// unless every entry is valid.
    async fn set_many(
        &self,
        user: UserId,
        entries: Vec<PreferenceEntry>,
    ) -> Result<(), PreferencesError>;

    /// Drop the override for `key`, reverting it to the default.
    async fn reset(&self, user: UserId, key: PreferenceKey) -> Result<(), PreferencesError>;
}
