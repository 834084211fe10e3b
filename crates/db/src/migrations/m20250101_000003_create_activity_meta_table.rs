//! Create activity meta table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityMeta::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityMeta::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityMeta::ActivityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityMeta::MetaKey)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityMeta::MetaValue).text().not_null())
                    .to_owned(),
            )
            .await?;

        // Unique index: (activity_id, meta_key) - target of the count upsert
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_meta_activity_key")
                    .table(ActivityMeta::Table)
                    .col(ActivityMeta::ActivityId)
                    .col(ActivityMeta::MetaKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityMeta::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivityMeta {
    Table,
    Id,
    ActivityId,
    MetaKey,
    MetaValue,
}
