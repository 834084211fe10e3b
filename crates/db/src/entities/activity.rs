//! Activity entity (activity-stream rows, reactions included).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The acting user
    pub user_id: i64,

    /// Owning component (`activity`, `groups`, `reactions`, ...)
    pub component: String,

    /// Activity type (`activity_update`, `bp_activity_reaction_like`, ...)
    pub activity_type: String,

    /// Rendered action string
    #[sea_orm(column_type = "Text")]
    pub action: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub primary_link: String,

    /// For reactions: the reacted activity
    pub item_id: i64,

    /// For reactions: the author of the reacted activity
    pub secondary_item_id: i64,

    #[sea_orm(default_value = false)]
    pub hide_sitewide: bool,

    pub date_recorded: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activity_meta::Entity")]
    Meta,
}

impl Related<super::activity_meta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meta.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
