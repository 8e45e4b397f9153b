use user_preferences_sdk::UserId;

use crate::domain::repo::StoredPreference;

use super::entity;

impl From<entity::Model> for StoredPreference {
    fn from(entity: entity::Model) -> Self {
        Self {
            user: UserId::new(entity.user_id),
            key: entity.key,
            raw: entity.value,
        }
    }
}
