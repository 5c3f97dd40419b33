//! Create story, story_view and highlight tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Story::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Story::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Story::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Story::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(Story::VideoUrl).string_len(1024))
                    .col(ColumnDef::new(Story::Caption).string_len(200))
                    .col(ColumnDef::new(Story::Duration).integer().not_null().default(5))
                    .col(ColumnDef::new(Story::BackgroundColor).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Story::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Story::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_author")
                            .from(Story::Table, Story::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (author_id, expires_at) - active story lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_story_author_expires_at")
                    .table(Story::Table)
                    .col(Story::AuthorId)
                    .col(Story::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StoryView::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StoryView::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StoryView::StoryId).string_len(32).not_null())
                    .col(ColumnDef::new(StoryView::ViewerId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(StoryView::ViewedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_view_story")
                            .from(StoryView::Table, StoryView::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_view_viewer")
                            .from(StoryView::Table, StoryView::ViewerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (story_id, viewer_id) - one view record per viewer
        manager
            .create_index(
                Index::create()
                    .name("idx_story_view_story_viewer")
                    .table(StoryView::Table)
                    .col(StoryView::StoryId)
                    .col(StoryView::ViewerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StoryHighlight::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StoryHighlight::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StoryHighlight::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(StoryHighlight::Title).string_len(50).not_null())
                    .col(ColumnDef::new(StoryHighlight::CoverUrl).string_len(1024))
                    .col(
                        ColumnDef::new(StoryHighlight::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_highlight_user")
                            .from(StoryHighlight::Table, StoryHighlight::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StoryHighlightItem::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StoryHighlightItem::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StoryHighlightItem::HighlightId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StoryHighlightItem::StoryId)
                            .string_len(32)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_highlight_item_highlight")
                            .from(StoryHighlightItem::Table, StoryHighlightItem::HighlightId)
                            .to(StoryHighlight::Table, StoryHighlight::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_highlight_item_story")
                            .from(StoryHighlightItem::Table, StoryHighlightItem::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_story_highlight_item_pair")
                    .table(StoryHighlightItem::Table)
                    .col(StoryHighlightItem::HighlightId)
                    .col(StoryHighlightItem::StoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoryHighlightItem::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StoryHighlight::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StoryView::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Story::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
    AuthorId,
    ImageUrl,
    VideoUrl,
    Caption,
    Duration,
    BackgroundColor,
    CreatedAt,
    ExpiresAt,
}

#[derive(Iden)]
enum StoryView {
    Table,
    Id,
    StoryId,
    ViewerId,
    ViewedAt,
}

#[derive(Iden)]
enum StoryHighlight {
    Table,
    Id,
    UserId,
    Title,
    CoverUrl,
    CreatedAt,
}

#[derive(Iden)]
enum StoryHighlightItem {
    Table,
    Id,
    HighlightId,
    StoryId,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
