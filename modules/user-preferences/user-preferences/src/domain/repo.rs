use async_trait::async_trait;
use user_preferences_sdk::{PreferenceKey, UserId};

/// A persisted override row. `key` is kept as stored so rows left behind by
/// retired keys can still be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPreference {
    pub user: UserId,
    pub key: String,
    pub raw: Option<String>,
}

/// Pending change to one (user, key) row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceWrite {
    Upsert {
        key: PreferenceKey,
        raw: Option<String>,
    },
    Delete {
        key: PreferenceKey,
    },
}

impl PreferenceWrite {
    #[must_use]
    pub fn key(&self) -> PreferenceKey {
        match self {
            Self::Upsert { key, .. } | Self::Delete { key } => *key,
        }
    }
}

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn find(
        &self,
        user: UserId,
        key: PreferenceKey,
    ) -> anyhow::Result<Option<StoredPreference>>;

    async fn list_for_user(&self, user: UserId) -> anyhow::Result<Vec<StoredPreference>>;

    /// Apply all writes in a single transaction.
    async fn apply(&self, user: UserId, writes: Vec<PreferenceWrite>) -> anyhow::Result<()>;
}
