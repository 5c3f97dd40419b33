//! Playlist service.

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{playlist, playlist_video, video},
    repositories::{PlaylistRepository, VideoRepository},
};
use validator::Validate;

/// How many public playlists of other users are shown next to the caller's own.
const PUBLIC_PLAYLIST_LIMIT: u64 = 10;

const fn default_true() -> bool {
    true
}

/// Input for creating a playlist.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistInput {
    #[validate(
        length(min = 1, max = 100),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub title: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub is_public: bool,
}

/// Input for editing a playlist. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditPlaylistInput {
    #[validate(
        length(min = 1, max = 100),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub title: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub is_public: Option<bool>,
}

/// The caller's playlists plus a few public ones from others.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistOverview {
    pub playlists: Vec<playlist::Model>,
    pub public_playlists: Vec<playlist::Model>,
}

/// A playlist and its videos in the order they were added.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub playlist: playlist::Model,
    pub videos: Vec<video::Model>,
    pub is_owner: bool,
}

/// Result of adding a video to a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistAddResult {
    pub added: bool,
    pub already_present: bool,
}

/// Playlist service for business logic.
#[derive(Clone)]
pub struct PlaylistService {
    playlist_repo: PlaylistRepository,
    video_repo: VideoRepository,
    id_gen: IdGenerator,
}

impl PlaylistService {
    /// Create a new playlist service.
    #[must_use]
    pub const fn new(playlist_repo: PlaylistRepository, video_repo: VideoRepository) -> Self {
        Self {
            playlist_repo,
            video_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// The caller's playlists and up to ten public playlists of other users.
    pub async fn my_playlists(&self, user_id: &str) -> AppResult<PlaylistOverview> {
        let playlists = self.playlist_repo.find_by_user(user_id).await?;
        let public_playlists = self
            .playlist_repo
            .find_public_excluding(user_id, PUBLIC_PLAYLIST_LIMIT)
            .await?;
        Ok(PlaylistOverview {
            playlists,
            public_playlists,
        })
    }

    /// Create a playlist.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreatePlaylistInput,
    ) -> AppResult<playlist::Model> {
        input.validate()?;

        let model = playlist::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            is_public: Set(input.is_public),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.playlist_repo.create(model).await
    }

    /// Open a playlist. Private playlists are visible to their owner only.
    pub async fn detail(&self, viewer_id: &str, playlist_id: &str) -> AppResult<PlaylistDetail> {
        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;
        let is_owner = playlist.user_id == viewer_id;
        if !playlist.is_public && !is_owner {
            return Err(AppError::Forbidden("This playlist is private".to_string()));
        }

        let videos = self.playlist_repo.find_videos(&playlist.id).await?;
        Ok(PlaylistDetail {
            playlist,
            videos,
            is_owner,
        })
    }

    /// Edit a playlist.
    pub async fn edit(
        &self,
        user_id: &str,
        playlist_id: &str,
        input: EditPlaylistInput,
    ) -> AppResult<playlist::Model> {
        input.validate()?;

        let playlist = self.owned_playlist(user_id, playlist_id).await?;
        let mut active: playlist::ActiveModel = playlist.into();

        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(is_public) = input.is_public {
            active.is_public = Set(is_public);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.playlist_repo.update(active).await
    }

    /// Delete a playlist. The videos are untouched.
    pub async fn delete(&self, user_id: &str, playlist_id: &str) -> AppResult<()> {
        let playlist = self.owned_playlist(user_id, playlist_id).await?;
        self.playlist_repo.delete(&playlist.id).await
    }

    /// Append a video to a playlist.
    pub async fn add_video(
        &self,
        user_id: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> AppResult<PlaylistAddResult> {
        let playlist = self.owned_playlist(user_id, playlist_id).await?;
        let video = self.video_repo.get_by_id(video_id).await?;

        let model = playlist_video::ActiveModel {
            id: Set(self.id_gen.generate()),
            playlist_id: Set(playlist.id),
            video_id: Set(video.id),
            added_at: Set(Utc::now().into()),
        };

        match self.playlist_repo.add_video(model).await {
            Ok(_) => Ok(PlaylistAddResult {
                added: true,
                already_present: false,
            }),
            Err(e) if e.is_conflict() => Ok(PlaylistAddResult {
                added: false,
                already_present: true,
            }),
            Err(e) => Err(e),
        }
    }

    /// Remove a video from a playlist. Returns whether it was there.
    pub async fn remove_video(
        &self,
        user_id: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> AppResult<bool> {
        let playlist = self.owned_playlist(user_id, playlist_id).await?;
        self.playlist_repo.remove_video(&playlist.id, video_id).await
    }

    async fn owned_playlist(&self, user_id: &str, playlist_id: &str) -> AppResult<playlist::Model> {
        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;
        if playlist.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only modify your own playlists".to_string(),
            ));
        }
        Ok(playlist)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::empty_db;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use universe_db::entities::video::VideoCategory;

    fn create_test_playlist(id: &str, owner: &str, is_public: bool) -> playlist::Model {
        playlist::Model {
            id: id.to_string(),
            user_id: owner.to_string(),
            title: "Watch later".to_string(),
            description: None,
            is_public,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_video(id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            author_id: "carol".to_string(),
            title: "Clip".to_string(),
            description: None,
            video_url: "https://cdn.example.com/v.mp4".to_string(),
            thumbnail_url: None,
            duration: 30,
            views: 0,
            category: VideoCategory::Music,
            tags: None,
            is_public: true,
            allow_comments: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(playlists: Arc<DatabaseConnection>, videos: Arc<DatabaseConnection>) -> PlaylistService {
        PlaylistService::new(PlaylistRepository::new(playlists), VideoRepository::new(videos))
    }

    #[tokio::test]
    async fn test_private_playlist_forbidden_for_others() {
        let playlists = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_playlist("p1", "bob", false)]])
                .into_connection(),
        );

        let result = service(playlists, empty_db()).detail("alice", "p1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_private_playlist_visible_to_owner() {
        let playlists = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_playlist("p1", "bob", false)]])
                .append_query_results([[maplit::btreemap! {
                    "video_id" => sea_orm::Value::from("v1"),
                }]])
                .append_query_results([[create_test_video("v1")]])
                .into_connection(),
        );

        let detail = service(playlists, empty_db()).detail("bob", "p1").await.unwrap();
        assert!(detail.is_owner);
        assert_eq!(detail.videos.len(), 1);
    }

    #[tokio::test]
    async fn test_add_video_by_non_owner_forbidden() {
        let playlists = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_playlist("p1", "bob", true)]])
                .into_connection(),
        );

        let result = service(playlists, empty_db())
            .add_video("alice", "p1", "v1")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_add_video_reports_added() {
        let playlists = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_playlist("p1", "bob", true)]])
                .append_query_results([[playlist_video::Model {
                    id: "pv1".to_string(),
                    playlist_id: "p1".to_string(),
                    video_id: "v1".to_string(),
                    added_at: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let videos = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_video("v1")]])
                .into_connection(),
        );

        let result = service(playlists, videos).add_video("bob", "p1", "v1").await.unwrap();
        assert_eq!(
            result,
            PlaylistAddResult {
                added: true,
                already_present: false
            }
        );
    }

    #[tokio::test]
    async fn test_remove_missing_video_returns_false() {
        let playlists = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_playlist("p1", "bob", true)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let removed = service(playlists, empty_db())
            .remove_video("bob", "p1", "v9")
            .await
            .unwrap();
        assert!(!removed);
    }
}
