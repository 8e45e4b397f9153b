use async_trait::async_trait;
use std::sync::Arc;
use user_preferences_sdk::{
    PreferenceEntry, PreferenceKey, PreferenceValue, PreferencesError, UserId,
    UserPreferencesApi,
};

use crate::domain::service::Service;

/// In-process implementation of [`UserPreferencesApi`] backed by the domain service.
pub struct LocalClient {
    service: Arc<Service>,
}

impl LocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UserPreferencesApi for LocalClient {
    async fn get(
        &self,
        user: UserId,
        key: PreferenceKey,
    ) -> Result<PreferenceValue, PreferencesError> {
        self.service.get(user, key).await.map_err(Into::into)
    }

    async fn get_all(&self, user: UserId) -> Result<Vec<PreferenceEntry>, PreferencesError> {
        self.service.get_all(user).await.map_err(Into::into)
    }

    async fn set(
        &self,
        user: UserId,
        key: PreferenceKey,
        value: PreferenceValue,
    ) -> Result<(), PreferencesError> {
        self.service.set(user, key, value).await.map_err(Into::into)
    }

    async fn set_many(
        &self,
        user: UserId,
        entries: Vec<PreferenceEntry>,
    ) -> Result<(), PreferencesError> {
        self.service
            .set_many(user, &entries)
            .await
            .map_err(Into::into)
    }

    async fn reset(&self, user: UserId, key: PreferenceKey) -> Result<(), PreferencesError> {
        self.service.reset(user, key).await.map_err(Into::into)
    }
}
