//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::ItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::SecondaryItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::ComponentName)
                            .string_len(75)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::ComponentAction)
                            .string_len(75)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::DateNotified)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::IsNew)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, is_new) - unread notifications
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_user_is_new")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .col(Notification::IsNew)
                    .to_owned(),
            )
            .await?;

        // Index: item_id (cleanup when the parent goes away)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_item_id")
                    .table(Notification::Table)
                    .col(Notification::ItemId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    UserId,
    ItemId,
    SecondaryItemId,
    ComponentName,
    ComponentAction,
    DateNotified,
    IsNew,
}
