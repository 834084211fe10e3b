//! Database migrations.
//!
//! Schema for the activity tables the reactions live in.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_activity_table;
mod m20250101_000003_create_activity_meta_table;
mod m20250101_000004_create_user_meta_table;
mod m20250101_000005_create_site_option_table;
mod m20250101_000006_create_notification_table;
mod m20250101_000007_add_reaction_unique_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_activity_table::Migration),
            Box::new(m20250101_000003_create_activity_meta_table::Migration),
            Box::new(m20250101_000004_create_user_meta_table::Migration),
            Box::new(m20250101_000005_create_site_option_table::Migration),
            Box::new(m20250101_000006_create_notification_table::Migration),
            Box::new(m20250101_000007_add_reaction_unique_index::Migration),
        ]
    }
}
