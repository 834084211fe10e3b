//! Site option entity (key-value settings store).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "site_option")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub option_name: String,

    #[sea_orm(column_type = "Text")]
    pub option_value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
