#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Test support utilities for `user_preferences` integration tests.

#![allow(dead_code)] // Support module provides utilities that may not all be used

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectOptions, Database, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use user_preferences::UserId;
use user_preferences::domain::service::{Service, ServiceConfig};
use user_preferences::infra::storage::SeaOrmPreferenceRepository;
use user_preferences::infra::storage::entity;
use user_preferences::infra::storage::migrations::Migrator;

/// Fresh in-memory SQLite database with migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn inmem_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

#[must_use]
pub fn new_user() -> UserId {
    UserId::new(Uuid::new_v4())
}

pub struct TestContext {
    pub db: DatabaseConnection,
    pub service: Arc<Service>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(ServiceConfig::default()).await
    }

    pub async fn with_config(config: ServiceConfig) -> Self {
        let db = inmem_db().await;
        let repo = Arc::new(SeaOrmPreferenceRepository::new(db.clone()));
        let service = Arc::new(Service::new(repo, config));
        Self { db, service }
    }

    /// Number of override rows stored for `user`.
    pub async fn row_count(&self, user: UserId) -> u64 {
        entity::Entity::find()
            .filter(entity::Column::UserId.eq(user.as_uuid()))
            .count(&self.db)
            .await
            .expect("Failed to count rows")
    }

    pub async fn raw_value(&self, user: UserId, key: &str) -> Option<Option<String>> {
        entity::Entity::find_by_id((user.as_uuid(), key.to_owned()))
            .one(&self.db)
            .await
            .expect("Failed to load row")
            .map(|row| row.value)
    }

    /// Writes a row bypassing validation, as legacy or hand-edited data would.
    pub async fn seed_raw(&self, user: UserId, key: &str, raw: Option<&str>) {
        entity::ActiveModel {
            user_id: ActiveValue::Set(user.as_uuid()),
            key: ActiveValue::Set(key.to_owned()),
            value: ActiveValue::Set(raw.map(ToOwned::to_owned)),
        }
        .insert(&self.db)
        .await
        .expect("Failed to seed row");
    }
}
