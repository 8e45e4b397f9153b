use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserPrefs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserPrefs::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserPrefs::Key).string_len(32).not_null())
                    .col(ColumnDef::new(UserPrefs::Value).text().null())
                    .primary_key(
                        Index::create()
                            .col(UserPrefs::UserId)
                            .col(UserPrefs::Key),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserPrefs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserPrefs {
    Table,
    UserId,
    Key,
    Value,
}
