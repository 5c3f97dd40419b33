//! Story highlight entity (permanent curated story sets).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "story_highlight")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(nullable)]
    pub cover_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::story::Entity> for Entity {
    fn to() -> RelationDef {
        super::story_highlight_item::Relation::Story.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::story_highlight_item::Relation::Highlight.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
