//! Playlist repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Playlist, PlaylistVideo, Video, playlist, playlist_video, video};
use crate::map_insert_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use universe_common::{AppError, AppResult};

/// Playlist repository for database operations.
#[derive(Clone)]
pub struct PlaylistRepository {
    db: Arc<DatabaseConnection>,
}

impl PlaylistRepository {
    /// Create a new playlist repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a playlist by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<playlist::Model> {
        Playlist::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {id}")))
    }

    /// Create a playlist.
    pub async fn create(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a playlist.
    pub async fn update(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a playlist.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Playlist::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Playlists owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<playlist::Model>> {
        Playlist::find()
            .filter(playlist::Column::UserId.eq(user_id))
            .order_by_desc(playlist::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Public playlists owned by anyone but `user_id`, newest first.
    pub async fn find_public_excluding(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<playlist::Model>> {
        Playlist::find()
            .filter(playlist::Column::IsPublic.eq(true))
            .filter(playlist::Column::UserId.ne(user_id))
            .order_by_desc(playlist::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add a video. Returns `Conflict` when it is already in the playlist.
    pub async fn add_video(
        &self,
        model: playlist_video::ActiveModel,
    ) -> AppResult<playlist_video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, "playlist entry"))
    }

    /// Remove a video. Returns whether an entry was removed.
    pub async fn remove_video(&self, playlist_id: &str, video_id: &str) -> AppResult<bool> {
        let result = PlaylistVideo::delete_many()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_video::Column::VideoId.eq(video_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Videos in a playlist in the order they were added.
    pub async fn find_videos(&self, playlist_id: &str) -> AppResult<Vec<video::Model>> {
        let ids: Vec<String> = PlaylistVideo::find()
            .select_only()
            .column(playlist_video::Column::VideoId)
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(playlist_video::Column::AddedAt)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut by_id: HashMap<String, video::Model> = Video::find()
            .filter(video::Column::Id.is_in(ids.clone()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::video::VideoCategory;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_video(id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            author_id: "alice".to_string(),
            title: format!("video {id}"),
            description: None,
            video_url: "https://cdn.example.com/v.mp4".to_string(),
            thumbnail_url: None,
            duration: 60,
            views: 0,
            category: VideoCategory::Other,
            tags: None,
            is_public: true,
            allow_comments: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_videos_keeps_added_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! { "video_id" => sea_orm::Value::from("v2") },
                    maplit::btreemap! { "video_id" => sea_orm::Value::from("v1") },
                ]])
                .append_query_results([[create_test_video("v1"), create_test_video("v2")]])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let videos = repo.find_videos("pl1").await.unwrap();

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "v2");
        assert_eq!(videos[1].id, "v1");
    }

    #[tokio::test]
    async fn test_remove_video_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        assert!(!repo.remove_video("pl1", "v1").await.unwrap());
    }
}
