//! Create group, membership and group post tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Group::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Group::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Group::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Group::Description).text())
                    .col(ColumnDef::new(Group::AdminId).string_len(32).not_null())
                    .col(ColumnDef::new(Group::CoverUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Group::Privacy)
                            .string_len(20)
                            .not_null()
                            .default("public"),
                    )
                    .col(ColumnDef::new(Group::Rules).text())
                    .col(ColumnDef::new(Group::Category).string_len(50))
                    .col(
                        ColumnDef::new(Group::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Group::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_admin")
                            .from(Group::Table, Group::AdminId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupMembership::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupMembership::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupMembership::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupMembership::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GroupMembership::Role)
                            .string_len(20)
                            .not_null()
                            .default("member"),
                    )
                    .col(
                        ColumnDef::new(GroupMembership::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(GroupMembership::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(GroupMembership::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_membership_group")
                            .from(GroupMembership::Table, GroupMembership::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_membership_user")
                            .from(GroupMembership::Table, GroupMembership::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (group_id, user_id) - one membership per user per group
        manager
            .create_index(
                Index::create()
                    .name("idx_group_membership_group_user")
                    .table(GroupMembership::Table)
                    .col(GroupMembership::GroupId)
                    .col(GroupMembership::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_membership_user")
                    .table(GroupMembership::Table)
                    .col(GroupMembership::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupPost::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupPost::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupPost::Content).text().not_null())
                    .col(ColumnDef::new(GroupPost::ImageUrl).string_len(1024))
                    .col(
                        ColumnDef::new(GroupPost::IsPinned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GroupPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(GroupPost::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_group")
                            .from(GroupPost::Table, GroupPost::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_author")
                            .from(GroupPost::Table, GroupPost::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (group_id, is_pinned, created_at) - pinned-first feed
        manager
            .create_index(
                Index::create()
                    .name("idx_group_post_feed")
                    .table(GroupPost::Table)
                    .col(GroupPost::GroupId)
                    .col(GroupPost::IsPinned)
                    .col(GroupPost::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupPostLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupPostLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupPostLike::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupPostLike::PostId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GroupPostLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_like_user")
                            .from(GroupPostLike::Table, GroupPostLike::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_like_post")
                            .from(GroupPostLike::Table, GroupPostLike::PostId)
                            .to(GroupPost::Table, GroupPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_post_like_user_post")
                    .table(GroupPostLike::Table)
                    .col(GroupPostLike::UserId)
                    .col(GroupPostLike::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupPostComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupPostComment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupPostComment::PostId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GroupPostComment::AuthorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupPostComment::Content).text().not_null())
                    .col(
                        ColumnDef::new(GroupPostComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_comment_post")
                            .from(GroupPostComment::Table, GroupPostComment::PostId)
                            .to(GroupPost::Table, GroupPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_comment_author")
                            .from(GroupPostComment::Table, GroupPostComment::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            GroupPostComment::Table.into_iden(),
            GroupPostLike::Table.into_iden(),
            GroupPost::Table.into_iden(),
            GroupMembership::Table.into_iden(),
            Group::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
    Name,
    Description,
    AdminId,
    CoverUrl,
    Privacy,
    Rules,
    Category,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupMembership {
    Table,
    Id,
    GroupId,
    UserId,
    Role,
    Status,
    JoinedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupPost {
    Table,
    Id,
    GroupId,
    AuthorId,
    Content,
    ImageUrl,
    IsPinned,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupPostLike {
    Table,
    Id,
    UserId,
    PostId,
    CreatedAt,
}

#[derive(Iden)]
enum GroupPostComment {
    Table,
    Id,
    PostId,
    AuthorId,
    Content,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
