//! Create user meta table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserMeta::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserMeta::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserMeta::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UserMeta::MetaKey).string_len(255).not_null())
                    .col(ColumnDef::new(UserMeta::MetaValue).text().not_null())
                    .to_owned(),
            )
            .await?;

        // Index: meta_key (paging through one key across users)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_meta_key")
                    .table(UserMeta::Table)
                    .col(UserMeta::MetaKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_meta_user_key")
                    .table(UserMeta::Table)
                    .col(UserMeta::UserId)
                    .col(UserMeta::MetaKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserMeta::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserMeta {
    Table,
    Id,
    UserId,
    MetaKey,
    MetaValue,
}
