//! Create video, playlist and their join/engagement tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Video::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Video::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Video::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Video::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Video::Description).text())
                    .col(ColumnDef::new(Video::VideoUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(Video::ThumbnailUrl).string_len(1024))
                    .col(ColumnDef::new(Video::Duration).integer().not_null().default(0))
                    .col(ColumnDef::new(Video::Views).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Video::Category)
                            .string_len(20)
                            .not_null()
                            .default("other"),
                    )
                    .col(ColumnDef::new(Video::Tags).string_len(500))
                    .col(ColumnDef::new(Video::IsPublic).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Video::AllowComments)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Video::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Video::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_author")
                            .from(Video::Table, Video::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_video_author_created_at")
                    .table(Video::Table)
                    .col(Video::AuthorId)
                    .col(Video::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VideoLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VideoLike::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(VideoLike::VideoId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(VideoLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_like_user")
                            .from(VideoLike::Table, VideoLike::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_like_video")
                            .from(VideoLike::Table, VideoLike::VideoId)
                            .to(Video::Table, Video::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_video_like_user_video")
                    .table(VideoLike::Table)
                    .col(VideoLike::UserId)
                    .col(VideoLike::VideoId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VideoComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoComment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VideoComment::VideoId).string_len(32).not_null())
                    .col(ColumnDef::new(VideoComment::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(VideoComment::ParentId).string_len(32))
                    .col(ColumnDef::new(VideoComment::Content).text().not_null())
                    .col(
                        ColumnDef::new(VideoComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_comment_video")
                            .from(VideoComment::Table, VideoComment::VideoId)
                            .to(Video::Table, Video::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_comment_author")
                            .from(VideoComment::Table, VideoComment::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_comment_parent")
                            .from(VideoComment::Table, VideoComment::ParentId)
                            .to(VideoComment::Table, VideoComment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_video_comment_video_created_at")
                    .table(VideoComment::Table)
                    .col(VideoComment::VideoId)
                    .col(VideoComment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Playlist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Playlist::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Playlist::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Playlist::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Playlist::Description).text())
                    .col(
                        ColumnDef::new(Playlist::IsPublic)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Playlist::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Playlist::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_user")
                            .from(Playlist::Table, Playlist::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlaylistVideo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlaylistVideo::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlaylistVideo::PlaylistId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PlaylistVideo::VideoId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PlaylistVideo::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_video_playlist")
                            .from(PlaylistVideo::Table, PlaylistVideo::PlaylistId)
                            .to(Playlist::Table, Playlist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_video_video")
                            .from(PlaylistVideo::Table, PlaylistVideo::VideoId)
                            .to(Video::Table, Video::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_playlist_video_pair")
                    .table(PlaylistVideo::Table)
                    .col(PlaylistVideo::PlaylistId)
                    .col(PlaylistVideo::VideoId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            PlaylistVideo::Table.into_iden(),
            Playlist::Table.into_iden(),
            VideoComment::Table.into_iden(),
            VideoLike::Table.into_iden(),
            Video::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(Iden)]
enum Video {
    Table,
    Id,
    AuthorId,
    Title,
    Description,
    VideoUrl,
    ThumbnailUrl,
    Duration,
    Views,
    Category,
    Tags,
    IsPublic,
    AllowComments,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum VideoLike {
    Table,
    Id,
    UserId,
    VideoId,
    CreatedAt,
}

#[derive(Iden)]
enum VideoComment {
    Table,
    Id,
    VideoId,
    AuthorId,
    ParentId,
    Content,
    CreatedAt,
}

#[derive(Iden)]
enum Playlist {
    Table,
    Id,
    UserId,
    Title,
    Description,
    IsPublic,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PlaylistVideo {
    Table,
    Id,
    PlaylistId,
    VideoId,
    AddedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
