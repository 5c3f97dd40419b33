//! Video repository (videos, video likes and video comments).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use super::{GroupedCount, contains_pattern, counts_by_key};
use crate::entities::{
    Video, VideoComment, VideoLike,
    video::{self, VideoCategory},
    video_comment, video_like,
};
use crate::map_insert_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};
use universe_common::{AppError, AppResult};

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a video by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<video::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {id}")))
    }

    /// Find videos by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<video::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Video::find()
            .filter(video::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a video.
    pub async fn create(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a video.
    pub async fn update(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a video.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Video::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Public videos, newest first.
    pub async fn find_public(&self, limit: u64) -> AppResult<Vec<video::Model>> {
        Video::find()
            .filter(video::Column::IsPublic.eq(true))
            .order_by_desc(video::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Public videos uploaded since `since`, most viewed first.
    pub async fn find_trending(
        &self,
        since: DateTime<FixedOffset>,
        limit: u64,
    ) -> AppResult<Vec<video::Model>> {
        Video::find()
            .filter(video::Column::IsPublic.eq(true))
            .filter(video::Column::CreatedAt.gte(since))
            .order_by_desc(video::Column::Views)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Public videos in a category, newest first.
    pub async fn find_by_category(
        &self,
        category: VideoCategory,
        limit: u64,
    ) -> AppResult<Vec<video::Model>> {
        Video::find()
            .filter(video::Column::IsPublic.eq(true))
            .filter(video::Column::Category.eq(category))
            .order_by_desc(video::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Public videos in the same category as `video`, excluding it.
    pub async fn find_related(
        &self,
        video: &video::Model,
        limit: u64,
    ) -> AppResult<Vec<video::Model>> {
        Video::find()
            .filter(video::Column::IsPublic.eq(true))
            .filter(video::Column::Category.eq(video.category))
            .filter(video::Column::Id.ne(video.id.as_str()))
            .order_by_desc(video::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Case-insensitive search over title, description and tags of public videos.
    pub async fn search(&self, query: &str, limit: u64) -> AppResult<Vec<video::Model>> {
        let pattern = contains_pattern(query);

        let matches = Condition::any()
            .add(Expr::expr(Func::lower(Expr::col(video::Column::Title))).like(&pattern))
            .add(Expr::expr(Func::lower(Expr::col(video::Column::Description))).like(&pattern))
            .add(Expr::expr(Func::lower(Expr::col(video::Column::Tags))).like(&pattern));

        Video::find()
            .filter(video::Column::IsPublic.eq(true))
            .filter(matches)
            .order_by_desc(video::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Videos uploaded by a user, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<video::Model>> {
        Video::find()
            .filter(video::Column::AuthorId.eq(author_id))
            .order_by_desc(video::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the view counter atomically.
    pub async fn increment_views(&self, id: &str) -> AppResult<()> {
        Video::update_many()
            .col_expr(video::Column::Views, Expr::col(video::Column::Views).add(1))
            .filter(video::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find the like a user left on a video.
    pub async fn find_like(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> AppResult<Option<video_like::Model>> {
        VideoLike::find()
            .filter(video_like::Column::UserId.eq(user_id))
            .filter(video_like::Column::VideoId.eq(video_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a like. Returns `Conflict` when the pair already exists.
    pub async fn create_like(&self, model: video_like::ActiveModel) -> AppResult<video_like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, "video like"))
    }

    /// Remove a like by pair.
    pub async fn delete_like(&self, user_id: &str, video_id: &str) -> AppResult<bool> {
        let result = VideoLike::delete_many()
            .filter(video_like::Column::UserId.eq(user_id))
            .filter(video_like::Column::VideoId.eq(video_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count likes on a video.
    pub async fn count_likes(&self, video_id: &str) -> AppResult<u64> {
        VideoLike::find()
            .filter(video_like::Column::VideoId.eq(video_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Like counts keyed by video ID.
    pub async fn count_likes_by_videos(
        &self,
        video_ids: &[String],
    ) -> AppResult<HashMap<String, i64>> {
        if video_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = VideoLike::find()
            .select_only()
            .column_as(video_like::Column::VideoId, "key")
            .column_as(video_like::Column::Id.count(), "count")
            .filter(video_like::Column::VideoId.is_in(video_ids.to_vec()))
            .group_by(video_like::Column::VideoId)
            .into_model::<GroupedCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(counts_by_key(rows))
    }

    /// Find a comment by ID.
    pub async fn find_comment(&self, id: &str) -> AppResult<Option<video_comment::Model>> {
        VideoComment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a comment.
    pub async fn create_comment(
        &self,
        model: video_comment::ActiveModel,
    ) -> AppResult<video_comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every comment on a video, oldest first.
    pub async fn find_comments(&self, video_id: &str) -> AppResult<Vec<video_comment::Model>> {
        VideoComment::find()
            .filter(video_comment::Column::VideoId.eq(video_id))
            .order_by_asc(video_comment::Column::CreatedAt)
            .order_by_asc(video_comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
