//! User Preferences Module Implementation
//!
//! Typed per-user preferences: a fixed registry of keys with defaults and
//! value domains, persisted as sparse overrides. The public API is defined in
//! `user-preferences-sdk` and re-exported here.

pub use user_preferences_sdk::{
    FieldViolation, PreferenceEntry, PreferenceKey, PreferenceValue, PreferencesError, UserId,
    UserPreferencesApi,
};

pub mod module;
pub use module::UserPreferencesModule;

pub mod config;
pub use config::UserPreferencesConfig;

pub mod local_client;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
