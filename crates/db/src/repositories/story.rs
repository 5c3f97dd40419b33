//! Story repository (stories and their view records).

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::entities::{Story, StoryView, story, story_view};
use crate::map_insert_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use universe_common::{AppError, AppResult};

/// Story repository for database operations.
#[derive(Clone)]
pub struct StoryRepository {
    db: Arc<DatabaseConnection>,
}

impl StoryRepository {
    /// Create a new story repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a story by ID, regardless of expiry.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<story::Model>> {
        Story::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a story by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<story::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Story {id}")))
    }

    /// Find stories by IDs, regardless of expiry, oldest first.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<story::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Story::find()
            .filter(story::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(story::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a story.
    pub async fn create(&self, model: story::ActiveModel) -> AppResult<story::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a story.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Story::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Stories by any of `author_ids` still active at `now`, oldest first.
    pub async fn find_active_by_authors(
        &self,
        author_ids: &[String],
        now: DateTime<FixedOffset>,
    ) -> AppResult<Vec<story::Model>> {
        if author_ids.is_empty() {
            return Ok(vec![]);
        }

        Story::find()
            .filter(story::Column::AuthorId.is_in(author_ids.to_vec()))
            .filter(story::Column::ExpiresAt.gt(now))
            .order_by_asc(story::Column::CreatedAt)
            .order_by_asc(story::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every story a user has posted, expired or not, newest first.
    pub async fn find_all_by_author(&self, author_id: &str) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(story::Column::AuthorId.eq(author_id))
            .order_by_desc(story::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the view record for a viewer.
    pub async fn find_view(
        &self,
        story_id: &str,
        viewer_id: &str,
    ) -> AppResult<Option<story_view::Model>> {
        StoryView::find()
            .filter(story_view::Column::StoryId.eq(story_id))
            .filter(story_view::Column::ViewerId.eq(viewer_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a view record. Returns `Conflict` when the viewer already has one.
    pub async fn create_view(
        &self,
        model: story_view::ActiveModel,
    ) -> AppResult<story_view::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, "story view"))
    }

    /// Count distinct viewers of a story.
    pub async fn count_views(&self, story_id: &str) -> AppResult<u64> {
        StoryView::find()
            .filter(story_view::Column::StoryId.eq(story_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
