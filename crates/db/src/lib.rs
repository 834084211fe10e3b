//! Database layer for the reactions service.
//!
//! Owns the activity-stream schema reactions are stored in: activities,
//! activity and user metadata, site options, users and notifications.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use reactions_common::{AppError, Config, config::DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = connect_options(&config.database);
    opt.sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Pool options for a database config.
///
/// `SQLite` connections wait up to `busy_timeout_ms` for the write lock
/// instead of failing with `SQLITE_BUSY` when writers overlap.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
    let mut opt = ConnectOptions::new(&config.url);

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .map_sqlx_sqlite_opts(move |opts| opts.busy_timeout(busy_timeout));

    opt
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
