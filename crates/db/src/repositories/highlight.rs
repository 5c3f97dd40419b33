//! Story highlight repository.

use std::sync::Arc;

use crate::entities::{StoryHighlight, StoryHighlightItem, story_highlight, story_highlight_item};
use crate::map_insert_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use universe_common::{AppError, AppResult};

/// Highlight repository for database operations.
#[derive(Clone)]
pub struct HighlightRepository {
    db: Arc<DatabaseConnection>,
}

impl HighlightRepository {
    /// Create a new highlight repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a highlight by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<story_highlight::Model> {
        StoryHighlight::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Highlight {id}")))
    }

    /// Highlights owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<story_highlight::Model>> {
        StoryHighlight::find()
            .filter(story_highlight::Column::UserId.eq(user_id))
            .order_by_desc(story_highlight::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a highlight.
    pub async fn create(
        &self,
        model: story_highlight::ActiveModel,
    ) -> AppResult<story_highlight::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a highlight and its item links. The stories themselves stay.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        StoryHighlight::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Link a story into a highlight. Returns `Conflict` for duplicates.
    pub async fn add_item(
        &self,
        model: story_highlight_item::ActiveModel,
    ) -> AppResult<story_highlight_item::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, "highlight item"))
    }

    /// IDs of the stories in a highlight.
    pub async fn story_ids(&self, highlight_id: &str) -> AppResult<Vec<String>> {
        StoryHighlightItem::find()
            .select_only()
            .column(story_highlight_item::Column::StoryId)
            .filter(story_highlight_item::Column::HighlightId.eq(highlight_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
