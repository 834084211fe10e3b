//! Test utilities for database operations.
//!
//! Provides an in-memory `SQLite` database with the schema applied, plus
//! helpers for seeding users, activities and legacy favorites.

use std::sync::Arc;

use chrono::Utc;
use reactions_common::config::DatabaseConfig;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Set,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{activity, user, user_meta};
use crate::migrations::Migrator;

/// A throwaway database with all migrations applied.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory database.
    ///
    /// The pool is pinned to one connection: every `sqlite::memory:`
    /// connection would otherwise open its own empty database.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Open a database at `url` with a pool of `max_connections`, with the
    /// same pool options the server uses.
    ///
    /// Use a file-backed `SQLite` URL to exercise writers racing on
    /// separate connections.
    pub async fn open(url: &str, max_connections: u32) -> Result<Self, DbErr> {
        let mut opt = crate::connect_options(&DatabaseConfig {
            url: url.to_string(),
            max_connections,
            min_connections: 1,
            busy_timeout_ms: 5_000,
        });
        opt.sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!(url, max_connections, "Opened test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Get a shared handle to the connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Insert a user. Its API token is `token-{login}`.
    pub async fn create_user(&self, login: &str, is_admin: bool) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            login: Set(login.to_string()),
            display_name: Set(capitalize(login)),
            api_token: Set(Some(format!("token-{login}"))),
            is_admin: Set(is_admin),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a plain activity update.
    pub async fn create_activity(
        &self,
        user_id: i64,
        content: &str,
    ) -> Result<activity::Model, DbErr> {
        activity::ActiveModel {
            user_id: Set(user_id),
            component: Set("activity".to_string()),
            activity_type: Set("activity_update".to_string()),
            action: Set(String::new()),
            content: Set(content.to_string()),
            primary_link: Set(String::new()),
            item_id: Set(0),
            secondary_item_id: Set(0),
            hide_sitewide: Set(false),
            date_recorded: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Store a legacy favorites list for a user.
    pub async fn set_legacy_favorites(&self, user_id: i64, ids: &[i64]) -> Result<(), DbErr> {
        let value = serde_json::to_string(ids).map_err(|e| DbErr::Custom(e.to_string()))?;
        user_meta::ActiveModel {
            user_id: Set(user_id),
            meta_key: Set("bp_favorite_activities".to_string()),
            meta_value: Set(value),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
        .map(|_| ())
    }

    /// Count all rows of an entity.
    pub async fn count<E: EntityTrait>(&self, entity: E) -> Result<u64, DbErr>
    where
        E::Model: Sync,
    {
        let _ = entity;
        E::find().count(self.conn.as_ref()).await
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
