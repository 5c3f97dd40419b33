//! Story highlights: permanent collections of a user's stories.

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{story, story_highlight, story_highlight_item},
    repositories::{HighlightRepository, StoryRepository, UserRepository},
};
use validator::Validate;

/// Input for creating a highlight.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHighlightInput {
    #[validate(
        length(min = 1, max = 50),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub title: String,

    #[validate(url)]
    pub cover_url: Option<String>,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub story_ids: Vec<String>,
}

/// A highlight with its stories. Expiry does not apply here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightDetail {
    pub highlight: story_highlight::Model,
    pub stories: Vec<story::Model>,
}

/// Highlight service for business logic.
#[derive(Clone)]
pub struct HighlightService {
    highlight_repo: HighlightRepository,
    story_repo: StoryRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl HighlightService {
    /// Create a new highlight service.
    #[must_use]
    pub const fn new(
        highlight_repo: HighlightRepository,
        story_repo: StoryRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            highlight_repo,
            story_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a highlight from some of the owner's stories.
    ///
    /// Every story must belong to the owner. Expired stories are allowed.
    pub async fn create(
        &self,
        owner_id: &str,
        input: CreateHighlightInput,
    ) -> AppResult<HighlightDetail> {
        input.validate()?;

        let mut story_ids = input.story_ids;
        story_ids.sort();
        story_ids.dedup();

        let stories = self.story_repo.find_by_ids(&story_ids).await?;
        if stories.len() != story_ids.len() {
            return Err(AppError::NotFound("Story".to_string()));
        }
        if stories.iter().any(|s| s.author_id != owner_id) {
            return Err(AppError::Forbidden(
                "Highlights can only contain your own stories".to_string(),
            ));
        }

        let model = story_highlight::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(owner_id.to_string()),
            title: Set(input.title.trim().to_string()),
            cover_url: Set(input.cover_url),
            created_at: Set(Utc::now().into()),
        };
        let highlight = self.highlight_repo.create(model).await?;

        for story in &stories {
            let item = story_highlight_item::ActiveModel {
                id: Set(self.id_gen.generate()),
                highlight_id: Set(highlight.id.clone()),
                story_id: Set(story.id.clone()),
            };
            self.highlight_repo.add_item(item).await?;
        }

        tracing::debug!(highlight = %highlight.id, stories = stories.len(), "Highlight created");
        Ok(HighlightDetail { highlight, stories })
    }

    /// A highlight and its stories, oldest first.
    pub async fn get(&self, highlight_id: &str) -> AppResult<HighlightDetail> {
        let highlight = self.highlight_repo.get_by_id(highlight_id).await?;
        let story_ids = self.highlight_repo.story_ids(&highlight.id).await?;
        let stories = self.story_repo.find_by_ids(&story_ids).await?;
        Ok(HighlightDetail { highlight, stories })
    }

    /// Highlights owned by `username`, newest first.
    pub async fn list(&self, username: &str) -> AppResult<Vec<story_highlight::Model>> {
        let user = self.user_repo.get_by_username(username).await?;
        self.highlight_repo.find_by_user(&user.id).await
    }

    /// Delete a highlight. The stories themselves are kept.
    pub async fn delete(&self, user_id: &str, highlight_id: &str) -> AppResult<()> {
        let highlight = self.highlight_repo.get_by_id(highlight_id).await?;
        if highlight.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own highlights".to_string(),
            ));
        }
        self.highlight_repo.delete(&highlight.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::empty_db;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn expired_story(id: &str, author: &str) -> story::Model {
        let created = Utc::now().fixed_offset() - Duration::days(3);
        story::Model {
            id: id.to_string(),
            author_id: author.to_string(),
            image_url: Some("https://cdn.example.com/s.png".to_string()),
            video_url: None,
            caption: None,
            duration: 5,
            background_color: String::new(),
            created_at: created,
            expires_at: story::Model::expiry_for(created),
        }
    }

    fn highlight(id: &str, owner: &str) -> story_highlight::Model {
        story_highlight::Model {
            id: id.to_string(),
            user_id: owner.to_string(),
            title: "Trip".to_string(),
            cover_url: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(highlights: Arc<DatabaseConnection>, stories: Arc<DatabaseConnection>) -> HighlightService {
        HighlightService::new(
            HighlightRepository::new(highlights),
            StoryRepository::new(stories),
            UserRepository::new(empty_db()),
        )
    }

    fn input(story_ids: &[&str]) -> CreateHighlightInput {
        CreateHighlightInput {
            title: "Trip".to_string(),
            cover_url: None,
            story_ids: story_ids.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_with_foreign_story_forbidden() {
        let stories = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[expired_story("s1", "bob")]])
                .into_connection(),
        );

        let result = service(empty_db(), stories).create("alice", input(&["s1"])).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_accepts_expired_stories() {
        let stories = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[expired_story("s1", "alice")]])
                .into_connection(),
        );
        let highlights = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[highlight("h1", "alice")]])
                .append_query_results([[story_highlight_item::Model {
                    id: "i1".to_string(),
                    highlight_id: "h1".to_string(),
                    story_id: "s1".to_string(),
                }]])
                .into_connection(),
        );

        let detail = service(highlights, stories)
            .create("alice", input(&["s1", "s1"]))
            .await
            .unwrap();

        assert_eq!(detail.highlight.id, "h1");
        assert_eq!(detail.stories.len(), 1);
    }

    #[tokio::test]
    async fn test_create_missing_story_not_found() {
        let stories = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story::Model>::new()])
                .into_connection(),
        );

        let result = service(empty_db(), stories).create("alice", input(&["nope"])).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_others_highlight_forbidden() {
        let highlights = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[highlight("h1", "bob")]])
                .into_connection(),
        );

        let result = service(highlights, empty_db()).delete("alice", "h1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
