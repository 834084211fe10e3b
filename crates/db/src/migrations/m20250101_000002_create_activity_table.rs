//! Create activity table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Activity::Component).string_len(75).not_null())
                    .col(
                        ColumnDef::new(Activity::ActivityType)
                            .string_len(75)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Activity::Action).text().not_null())
                    .col(ColumnDef::new(Activity::Content).text().not_null())
                    .col(
                        ColumnDef::new(Activity::PrimaryLink)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activity::ItemId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Activity::SecondaryItemId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Activity::HideSitewide)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Activity::DateRecorded)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (component, item_id) - reactions of a parent
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_component_item")
                    .table(Activity::Table)
                    .col(Activity::Component)
                    .col(Activity::ItemId)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, activity_type) - a user's reactions
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_user_type")
                    .table(Activity::Table)
                    .col(Activity::UserId)
                    .col(Activity::ActivityType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    UserId,
    Component,
    ActivityType,
    Action,
    Content,
    PrimaryLink,
    ItemId,
    SecondaryItemId,
    HideSitewide,
    DateRecorded,
}
