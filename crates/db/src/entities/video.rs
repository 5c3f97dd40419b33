//! Video entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Video category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum VideoCategory {
    #[sea_orm(string_value = "education")]
    Education,
    #[sea_orm(string_value = "entertainment")]
    Entertainment,
    #[sea_orm(string_value = "gaming")]
    Gaming,
    #[sea_orm(string_value = "music")]
    Music,
    #[sea_orm(string_value = "news")]
    News,
    #[sea_orm(string_value = "sports")]
    Sports,
    #[sea_orm(string_value = "technology")]
    Technology,
    #[sea_orm(string_value = "vlogs")]
    Vlogs,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Default for VideoCategory {
    fn default() -> Self {
        Self::Other
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub author_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub video_url: String,

    #[sea_orm(nullable)]
    pub thumbnail_url: Option<String>,

    /// Length in seconds
    pub duration: i32,

    /// View counter, bumped on non-author detail views
    pub views: i64,

    pub category: VideoCategory,

    /// Comma separated
    #[sea_orm(nullable)]
    pub tags: Option<String>,

    #[sea_orm(default_value = true)]
    pub is_public: bool,

    #[sea_orm(default_value = true)]
    pub allow_comments: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Trimmed, non-empty tags.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
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
    #[sea_orm(has_many = "super::video_like::Entity")]
    Likes,
    #[sea_orm(has_many = "super::video_comment::Entity")]
    Comments,
}

impl Related<super::video_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl Related<super::video_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::playlist::Entity> for Entity {
    fn to() -> RelationDef {
        super::playlist_video::Relation::Playlist.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::playlist_video::Relation::Video.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
