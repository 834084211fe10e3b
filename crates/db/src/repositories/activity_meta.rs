//! Activity metadata repository.

use std::sync::Arc;

use crate::entities::{ActivityMeta, activity_meta};
use reactions_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
    sea_query::{Expr, OnConflict},
};

/// Repository for per-activity key-value metadata.
#[derive(Clone)]
pub struct ActivityMetaRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityMetaRepository {
    /// Create a new activity meta repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get a metadata value.
    pub async fn get(&self, activity_id: i64, key: &str) -> AppResult<Option<String>> {
        self.get_in(self.db.as_ref(), activity_id, key).await
    }

    /// Get a metadata value on the given connection.
    pub async fn get_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        activity_id: i64,
        key: &str,
    ) -> AppResult<Option<String>> {
        ActivityMeta::find()
            .filter(activity_meta::Column::ActivityId.eq(activity_id))
            .filter(activity_meta::Column::MetaKey.eq(key))
            .one(conn)
            .await
            .map(|m| m.map(|m| m.meta_value))
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or replace a metadata value.
    pub async fn upsert<C: ConnectionTrait>(
        &self,
        conn: &C,
        activity_id: i64,
        key: &str,
        value: &str,
    ) -> AppResult<()> {
        let model = activity_meta::ActiveModel {
            activity_id: Set(activity_id),
            meta_key: Set(key.to_string()),
            meta_value: Set(value.to_string()),
            ..Default::default()
        };

        ActivityMeta::insert(model)
            .on_conflict(
                OnConflict::columns([
                    activity_meta::Column::ActivityId,
                    activity_meta::Column::MetaKey,
                ])
                .update_column(activity_meta::Column::MetaValue)
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a single metadata key.
    pub async fn delete_key<C: ConnectionTrait>(
        &self,
        conn: &C,
        activity_id: i64,
        key: &str,
    ) -> AppResult<u64> {
        ActivityMeta::delete_many()
            .filter(activity_meta::Column::ActivityId.eq(activity_id))
            .filter(activity_meta::Column::MetaKey.eq(key))
            .exec(conn)
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every metadata key of an activity.
    pub async fn delete_all<C: ConnectionTrait>(&self, conn: &C, activity_id: i64) -> AppResult<u64> {
        ActivityMeta::delete_many()
            .filter(activity_meta::Column::ActivityId.eq(activity_id))
            .exec(conn)
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get `(activity_id, value)` pairs for `key`, highest numeric value first.
    ///
    /// Activities without the key are not returned.
    pub async fn ranked_by_numeric_value(
        &self,
        key: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<(i64, i64)>> {
        let rows = ActivityMeta::find()
            .filter(activity_meta::Column::MetaKey.eq(key))
            .order_by(Expr::cust("CAST(meta_value AS INTEGER)"), sea_orm::Order::Desc)
            .order_by_desc(activity_meta::Column::ActivityId)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|m| m.meta_value.parse().ok().map(|v| (m.activity_id, v)))
            .collect())
    }
}
