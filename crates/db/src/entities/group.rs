//! Group entity (user communities).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who can see a group and how joining works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum GroupPrivacy {
    /// Listed, readable by anyone, joining is approved immediately.
    #[sea_orm(string_value = "public")]
    Public,
    /// Listed, content visible to approved members only, joins need approval.
    #[sea_orm(string_value = "private")]
    Private,
    /// Unlisted, otherwise like private.
    #[sea_orm(string_value = "secret")]
    Secret,
}

impl Default for GroupPrivacy {
    fn default() -> Self {
        Self::Public
    }
}

impl GroupPrivacy {
    /// Whether joining skips the approval step.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// The creator; cannot leave or be removed
    #[sea_orm(indexed)]
    pub admin_id: String,

    #[sea_orm(nullable)]
    pub cover_url: Option<String>,

    pub privacy: GroupPrivacy,

    #[sea_orm(column_type = "Text", nullable)]
    pub rules: Option<String>,

    #[sea_orm(nullable)]
    pub category: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AdminId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Admin,
    #[sea_orm(has_many = "super::group_membership::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::group_post::Entity")]
    Posts,
}

impl Related<super::group_membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::group_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
