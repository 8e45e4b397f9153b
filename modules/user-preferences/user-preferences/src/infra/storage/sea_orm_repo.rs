use async_trait::async_trait;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait, sea_query::OnConflict,
};
use user_preferences_sdk::{PreferenceKey, UserId};

use crate::domain::repo::{PreferenceRepository, PreferenceWrite, StoredPreference};

use super::entity::{self, Entity as PrefsEntity};

pub struct SeaOrmPreferenceRepository {
    db: DatabaseConnection,
}

impl SeaOrmPreferenceRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PreferenceRepository for SeaOrmPreferenceRepository {
    async fn find(
        &self,
        user: UserId,
        key: PreferenceKey,
    ) -> anyhow::Result<Option<StoredPreference>> {
        let result = PrefsEntity::find_by_id((user.as_uuid(), key.as_str().to_owned()))
            .one(&self.db)
            .await?;

        Ok(result.map(Into::into))
    }

    async fn list_for_user(&self, user: UserId) -> anyhow::Result<Vec<StoredPreference>> {
        let rows = PrefsEntity::find()
            .filter(entity::Column::UserId.eq(user.as_uuid()))
            .order_by_asc(entity::Column::Key)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn apply(&self, user: UserId, writes: Vec<PreferenceWrite>) -> anyhow::Result<()> {
        let txn = self.db.begin().await?;

        for write in writes {
            match write {
                PreferenceWrite::Upsert { key, raw } => {
                    let active_model = entity::ActiveModel {
                        user_id: ActiveValue::Set(user.as_uuid()),
                        key: ActiveValue::Set(key.as_str().to_owned()),
                        value: ActiveValue::Set(raw),
                    };

                    PrefsEntity::insert(active_model)
                        .on_conflict(
                            OnConflict::columns([entity::Column::UserId, entity::Column::Key])
                                .update_column(entity::Column::Value)
                                .to_owned(),
                        )
                        .exec_without_returning(&txn)
                        .await?;
                }
                PreferenceWrite::Delete { key } => {
                    PrefsEntity::delete_by_id((user.as_uuid(), key.as_str().to_owned()))
                        .exec(&txn)
                        .await?;
                }
            }
        }

        txn.commit().await?;
        Ok(())
    }
}
