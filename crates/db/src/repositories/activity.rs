//! Activity repository.

use std::sync::Arc;

use crate::entities::{Activity, activity};
use reactions_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

/// Component tag carried by every reaction row.
pub const REACTIONS_COMPONENT: &str = "reactions";

/// Activity repository for database operations.
///
/// Methods taking a `conn` run on whatever connection they are given, so
/// callers can group them in one transaction.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Start a transaction on the underlying connection.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an activity by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<activity::Model>> {
        self.find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find an activity by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
    ) -> AppResult<Option<activity::Model>> {
        Activity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Take the write lock on an activity row for the rest of the transaction.
    ///
    /// Issues a no-op update so the lock is taken by the first statement of
    /// the transaction: a row lock on Postgres, the database write lock on
    /// `SQLite`. Returns `false` when the activity does not exist.
    pub async fn lock<C: ConnectionTrait>(&self, conn: &C, id: i64) -> AppResult<bool> {
        Activity::update_many()
            .col_expr(
                activity::Column::ItemId,
                Expr::col(activity::Column::ItemId).into(),
            )
            .filter(activity::Column::Id.eq(id))
            .exec(conn)
            .await
            .map(|r| r.rows_affected > 0)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a reaction row unless the same user already left that reaction
    /// on `parent_id`.
    ///
    /// Returns the stored row and whether this call created it.
    pub async fn insert_reaction<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: activity::ActiveModel,
        parent_id: i64,
        activity_type: &str,
        user_id: i64,
    ) -> AppResult<(activity::Model, bool)> {
        let inserted = Activity::insert(model)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = self
            .find_reaction(conn, parent_id, activity_type, user_id)
            .await?
            .ok_or_else(|| AppError::Database("Reaction row missing after insert".to_string()))?;

        Ok((row, inserted > 0))
    }

    /// Delete an activity by ID. Returns the number of deleted rows.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: i64) -> AppResult<u64> {
        Activity::delete_by_id(id)
            .exec(conn)
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the reaction of `activity_type` left by `user_id` on `parent_id`.
    pub async fn find_reaction<C: ConnectionTrait>(
        &self,
        conn: &C,
        parent_id: i64,
        activity_type: &str,
        user_id: i64,
    ) -> AppResult<Option<activity::Model>> {
        Activity::find()
            .filter(activity::Column::Component.eq(REACTIONS_COMPONENT))
            .filter(activity::Column::ItemId.eq(parent_id))
            .filter(activity::Column::ActivityType.eq(activity_type))
            .filter(activity::Column::UserId.eq(user_id))
            .order_by_asc(activity::Column::Id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the reactions left on `parent_id`.
    pub async fn count_reactions<C: ConnectionTrait>(
        &self,
        conn: &C,
        parent_id: i64,
    ) -> AppResult<u64> {
        Activity::find()
            .filter(activity::Column::Component.eq(REACTIONS_COMPONENT))
            .filter(activity::Column::ItemId.eq(parent_id))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every reaction left on `parent_id`.
    pub async fn delete_reactions_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        parent_id: i64,
    ) -> AppResult<u64> {
        Activity::delete_many()
            .filter(activity::Column::Component.eq(REACTIONS_COMPONENT))
            .filter(activity::Column::ItemId.eq(parent_id))
            .exec(conn)
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the reactions left on `parent_id`, oldest first.
    pub async fn find_reactions(&self, parent_id: i64) -> AppResult<Vec<activity::Model>> {
        Activity::find()
            .filter(activity::Column::Component.eq(REACTIONS_COMPONENT))
            .filter(activity::Column::ItemId.eq(parent_id))
            .order_by_asc(activity::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the distinct parent IDs `user_id` reacted to, newest parent first.
    ///
    /// With `activity_type` set only reactions of that type are considered.
    pub async fn find_reacted_parent_ids(
        &self,
        user_id: i64,
        activity_type: Option<&str>,
    ) -> AppResult<Vec<i64>> {
        let mut query = Activity::find()
            .select_only()
            .column(activity::Column::ItemId)
            .distinct()
            .filter(activity::Column::Component.eq(REACTIONS_COMPONENT))
            .filter(activity::Column::UserId.eq(user_id));

        if let Some(t) = activity_type {
            query = query.filter(activity::Column::ActivityType.eq(t));
        }

        query
            .order_by_desc(activity::Column::ItemId)
            .into_tuple::<i64>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Keep the IDs from `ids` that name existing activities.
    pub async fn filter_existing_ids(&self, ids: &[i64]) -> AppResult<Vec<activity::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Activity::find()
            .filter(activity::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(activity::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
