//! Story entity (24 hour soft expiry).

use chrono::{DateTime, Duration, FixedOffset};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How long a story stays active after creation.
pub const STORY_LIFETIME_HOURS: i64 = 24;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "story")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub author_id: String,

    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    #[sea_orm(nullable)]
    pub video_url: Option<String>,

    #[sea_orm(nullable)]
    pub caption: Option<String>,

    /// Display duration in seconds
    pub duration: i32,

    pub background_color: String,

    pub created_at: DateTimeWithTimeZone,

    /// Fixed at creation: `created_at + 24h`
    #[sea_orm(indexed)]
    pub expires_at: DateTimeWithTimeZone,
}

impl Model {
    /// Expiry for a story created at `created_at`.
    #[must_use]
    pub fn expiry_for(created_at: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        created_at + Duration::hours(STORY_LIFETIME_HOURS)
    }

    /// Active while `now < expires_at`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<FixedOffset>) -> bool {
        now < self.expires_at
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(has_many = "super::story_view::Entity")]
    Views,
}

impl Related<super::story_view::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Views.def()
    }
}

impl Related<super::story_highlight::Entity> for Entity {
    fn to() -> RelationDef {
        super::story_highlight_item::Relation::Highlight.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::story_highlight_item::Relation::Story.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
