//! Create site option table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SiteOption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SiteOption::OptionName)
                            .string_len(191)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SiteOption::OptionValue).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SiteOption::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SiteOption {
    Table,
    OptionName,
    OptionValue,
}
