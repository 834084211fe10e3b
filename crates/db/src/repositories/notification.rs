//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use reactions_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the notification raised for one reaction.
    pub async fn delete_for_reaction(
        &self,
        component_name: &str,
        item_id: i64,
        secondary_item_id: i64,
        component_action: &str,
    ) -> AppResult<u64> {
        Notification::delete_many()
            .filter(notification::Column::ComponentName.eq(component_name))
            .filter(notification::Column::ItemId.eq(item_id))
            .filter(notification::Column::SecondaryItemId.eq(secondary_item_id))
            .filter(notification::Column::ComponentAction.eq(component_action))
            .exec(self.db.as_ref())
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete all notifications of a component about `item_id`.
    pub async fn delete_by_item(&self, component_name: &str, item_id: i64) -> AppResult<u64> {
        Notification::delete_many()
            .filter(notification::Column::ComponentName.eq(component_name))
            .filter(notification::Column::ItemId.eq(item_id))
            .exec(self.db.as_ref())
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's unread notifications of a component, newest first.
    pub async fn find_unread_by_user(
        &self,
        user_id: i64,
        component_name: &str,
    ) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ComponentName.eq(component_name))
            .filter(notification::Column::IsNew.eq(true))
            .order_by_desc(notification::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a user's notifications about `item_id` as read.
    pub async fn mark_read_by_item(
        &self,
        user_id: i64,
        component_name: &str,
        item_id: i64,
    ) -> AppResult<u64> {
        Notification::update_many()
            .col_expr(notification::Column::IsNew, Expr::value(false))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ComponentName.eq(component_name))
            .filter(notification::Column::ItemId.eq(item_id))
            .exec(self.db.as_ref())
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
