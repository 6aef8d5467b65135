//! Blacklist entry: `blocker_id` blocked `blocked_id`

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member_blocks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub blocker_id: i64,

    pub blocked_id: i64,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::BlockerId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Blocker,

    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::BlockedId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Blocked,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Blocker.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
