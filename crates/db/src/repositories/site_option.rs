//! Site option repository.

use std::sync::Arc;

use crate::entities::{SiteOption, site_option};
use reactions_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};

/// Repository for site-wide options.
#[derive(Clone)]
pub struct SiteOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SiteOptionRepository {
    /// Create a new site option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get an option value.
    pub async fn get(&self, name: &str) -> AppResult<Option<String>> {
        SiteOption::find_by_id(name.to_string())
            .one(self.db.as_ref())
            .await
            .map(|m| m.map(|m| m.option_value))
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or replace an option value.
    pub async fn set(&self, name: &str, value: &str) -> AppResult<()> {
        let model = site_option::ActiveModel {
            option_name: Set(name.to_string()),
            option_value: Set(value.to_string()),
        };

        SiteOption::insert(model)
            .on_conflict(
                OnConflict::column(site_option::Column::OptionName)
                    .update_column(site_option::Column::OptionValue)
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
