//! User Preferences SDK
//!
//! This crate provides the public API for the user-preferences module:
//! - `UserPreferencesApi` trait for in-process consumers
//! - Model types (`PreferenceKey`, `PreferenceValue`, `PreferenceEntry`, `UserId`)
//! - Error type (`PreferencesError`)
//!
//! ```ignore
//! let client: Arc<dyn UserPreferencesApi> = module.client()?;
//! let per_page = client.get(user, PreferenceKey::CgItemsPerPage).await?;
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::UserPreferencesApi;
pub use errors::{FieldViolation, PreferencesError};
pub use models::{PreferenceEntry, PreferenceKey, PreferenceValue, UnknownPreferenceKey, UserId};
