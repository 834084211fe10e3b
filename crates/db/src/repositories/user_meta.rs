//! User metadata repository.

use std::sync::Arc;

use crate::entities::{UserMeta, user_meta};
use reactions_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};

/// Repository for per-user key-value metadata.
#[derive(Clone)]
pub struct UserMetaRepository {
    db: Arc<DatabaseConnection>,
}

impl UserMetaRepository {
    /// Create a new user meta repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get a metadata value.
    pub async fn get(&self, user_id: i64, key: &str) -> AppResult<Option<String>> {
        UserMeta::find()
            .filter(user_meta::Column::UserId.eq(user_id))
            .filter(user_meta::Column::MetaKey.eq(key))
            .one(self.db.as_ref())
            .await
            .map(|m| m.map(|m| m.meta_value))
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or replace a metadata value.
    pub async fn set(&self, user_id: i64, key: &str, value: &str) -> AppResult<()> {
        let model = user_meta::ActiveModel {
            user_id: Set(user_id),
            meta_key: Set(key.to_string()),
            meta_value: Set(value.to_string()),
            ..Default::default()
        };

        UserMeta::insert(model)
            .on_conflict(
                OnConflict::columns([user_meta::Column::UserId, user_meta::Column::MetaKey])
                    .update_column(user_meta::Column::MetaValue)
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the users holding `key`.
    pub async fn count_by_key(&self, key: &str) -> AppResult<u64> {
        UserMeta::find()
            .filter(user_meta::Column::MetaKey.eq(key))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get one page of rows holding `key`, in insertion order.
    pub async fn find_page_by_key(
        &self,
        key: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<user_meta::Model>> {
        UserMeta::find()
            .filter(user_meta::Column::MetaKey.eq(key))
            .order_by_asc(user_meta::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
