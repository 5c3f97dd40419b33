//! Story service: ephemeral content with a 24 hour lifetime.
//!
//! Expiry is evaluated at read time against `expires_at`. Expired stories stay
//! in storage until their author deletes them.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{story, story_view},
    repositories::{FollowingRepository, StoryRepository, UserRepository},
};
use validator::Validate;

use crate::services::directory::{UserDirectory, UserSummary, summary_or_unknown};

/// Background used when none (or plain black) is given.
pub const DEFAULT_BACKGROUND: &str = "linear-gradient(135deg, #667eea 0%, #764ba2 100%)";

/// Display duration used when none is given, in seconds.
pub const DEFAULT_DURATION: i32 = 5;

fn default_duration() -> i32 {
    DEFAULT_DURATION
}

/// Input for creating a story.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryInput {
    #[validate(url)]
    pub image_url: Option<String>,

    #[validate(url)]
    pub video_url: Option<String>,

    #[validate(length(max = 200))]
    pub caption: Option<String>,

    #[serde(default = "default_duration")]
    #[validate(range(min = 3, max = 15))]
    pub duration: i32,

    #[serde(default)]
    #[validate(custom(function = "universe_common::validation::validate_background"))]
    pub background_color: String,
}

/// A user with at least one active story.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryUser {
    pub user: UserSummary,
    pub latest_story: story::Model,
    pub story_count: usize,
    pub is_own: bool,
}

/// What a viewer sees when opening a story.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryViewing {
    pub story: story::Model,
    pub author: UserSummary,
    /// The author's active stories, oldest first.
    pub user_stories: Vec<story::Model>,
    pub views_count: u64,
}

/// Story service for business logic.
#[derive(Clone)]
pub struct StoryService {
    story_repo: StoryRepository,
    following_repo: FollowingRepository,
    user_repo: UserRepository,
    directory: UserDirectory,
    id_gen: IdGenerator,
}

impl StoryService {
    /// Create a new story service.
    #[must_use]
    pub const fn new(
        story_repo: StoryRepository,
        following_repo: FollowingRepository,
        user_repo: UserRepository,
        directory: UserDirectory,
    ) -> Self {
        Self {
            story_repo,
            following_repo,
            user_repo,
            directory,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a story. It expires 24 hours after creation.
    pub async fn create(&self, author_id: &str, input: CreateStoryInput) -> AppResult<story::Model> {
        input.validate()?;

        let caption = input
            .caption
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if input.image_url.is_some() && input.video_url.is_some() {
            return Err(AppError::BadRequest(
                "A story can have an image or a video, not both".to_string(),
            ));
        }
        if input.image_url.is_none() && input.video_url.is_none() && caption.is_none() {
            return Err(AppError::BadRequest(
                "A story needs an image, a video or a caption".to_string(),
            ));
        }

        let background_color = if input.background_color.is_empty()
            || input.background_color.eq_ignore_ascii_case("#000000")
        {
            DEFAULT_BACKGROUND.to_string()
        } else {
            input.background_color
        };

        let created_at = Utc::now().fixed_offset();
        let model = story::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            image_url: Set(input.image_url),
            video_url: Set(input.video_url),
            caption: Set(caption),
            duration: Set(input.duration),
            background_color: Set(background_color),
            created_at: Set(created_at),
            expires_at: Set(story::Model::expiry_for(created_at)),
        };

        let story = self.story_repo.create(model).await?;
        tracing::debug!(story = %story.id, author = %author_id, "Story created");
        Ok(story)
    }

    /// Story rings for the viewer and everyone they follow.
    pub async fn stories_feed(&self, viewer_id: &str) -> AppResult<Vec<StoryUser>> {
        let mut authors = self.following_repo.followee_ids(viewer_id).await?;
        authors.push(viewer_id.to_string());
        self.story_users(viewer_id, &authors).await
    }

    /// Users among `author_ids` with active stories, each with their newest one.
    ///
    /// The viewer comes first, then others by most recent story.
    pub async fn story_users(
        &self,
        viewer_id: &str,
        author_ids: &[String],
    ) -> AppResult<Vec<StoryUser>> {
        let stories = self
            .story_repo
            .find_active_by_authors(author_ids, Utc::now().fixed_offset())
            .await?;

        let grouped = group_by_author(stories);

        let ids: Vec<String> = grouped.keys().cloned().collect();
        let summaries = self.directory.summaries(&ids).await?;

        let mut users: Vec<StoryUser> = grouped
            .into_iter()
            .map(|(author_id, (latest_story, story_count))| StoryUser {
                user: summary_or_unknown(&summaries, &author_id),
                is_own: author_id == viewer_id,
                latest_story,
                story_count,
            })
            .collect();

        users.sort_by(|a, b| {
            b.is_own
                .cmp(&a.is_own)
                .then_with(|| b.latest_story.created_at.cmp(&a.latest_story.created_at))
        });

        Ok(users)
    }

    /// Active stories of `username`, oldest first.
    pub async fn user_stories(&self, username: &str) -> AppResult<Vec<story::Model>> {
        let user = self.user_repo.get_by_username(username).await?;
        self.story_repo
            .find_active_by_authors(&[user.id], Utc::now().fixed_offset())
            .await
    }

    /// Every story `author_id` posted, including expired ones, newest first.
    ///
    /// Used when picking stories for a highlight.
    pub async fn archive(&self, author_id: &str) -> AppResult<Vec<story::Model>> {
        self.story_repo.find_all_by_author(author_id).await
    }

    /// Open a story. Non-owners are recorded as viewers once.
    pub async fn view_story(&self, viewer_id: &str, story_id: &str) -> AppResult<StoryViewing> {
        self.view_story_at(viewer_id, story_id, Utc::now().fixed_offset())
            .await
    }

    async fn view_story_at(
        &self,
        viewer_id: &str,
        story_id: &str,
        now: DateTime<FixedOffset>,
    ) -> AppResult<StoryViewing> {
        let story = self.story_repo.get_by_id(story_id).await?;
        if !story.is_active_at(now) {
            return Err(AppError::NotFound(format!("Story {story_id}")));
        }

        if story.author_id != viewer_id {
            self.record_view(&story.id, viewer_id).await?;
        }

        let user_stories = self
            .story_repo
            .find_active_by_authors(std::slice::from_ref(&story.author_id), now)
            .await?;
        let views_count = self.story_repo.count_views(&story.id).await?;
        let authors = self.directory.summaries(std::slice::from_ref(&story.author_id)).await?;

        Ok(StoryViewing {
            author: summary_or_unknown(&authors, &story.author_id),
            story,
            user_stories,
            views_count,
        })
    }

    async fn record_view(&self, story_id: &str, viewer_id: &str) -> AppResult<()> {
        if self.story_repo.find_view(story_id, viewer_id).await?.is_some() {
            return Ok(());
        }

        let model = story_view::ActiveModel {
            id: Set(self.id_gen.generate()),
            story_id: Set(story_id.to_string()),
            viewer_id: Set(viewer_id.to_string()),
            viewed_at: Set(Utc::now().into()),
        };

        match self.story_repo.create_view(model).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_conflict() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Delete a story. Only its author may do so.
    pub async fn delete_story(&self, user_id: &str, story_id: &str) -> AppResult<()> {
        let story = self.story_repo.get_by_id(story_id).await?;
        if story.author_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own stories".to_string(),
            ));
        }
        self.story_repo.delete(&story.id).await
    }
}

/// Newest story and count per author, from stories sorted oldest first.
fn group_by_author(stories: Vec<story::Model>) -> HashMap<String, (story::Model, usize)> {
    let mut grouped: HashMap<String, (story::Model, usize)> = HashMap::new();
    for s in stories {
        match grouped.get_mut(&s.author_id) {
            Some(entry) => {
                entry.1 += 1;
                entry.0 = s;
            }
            None => {
                grouped.insert(s.author_id.clone(), (s, 1));
            }
        }
    }
    grouped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::{empty_db, user};
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use universe_db::entities::profile;
    use universe_db::repositories::ProfileRepository;

    fn create_test_story(id: &str, author: &str, created: DateTime<FixedOffset>) -> story::Model {
        story::Model {
            id: id.to_string(),
            author_id: author.to_string(),
            image_url: None,
            video_url: None,
            caption: Some("hi".to_string()),
            duration: DEFAULT_DURATION,
            background_color: DEFAULT_BACKGROUND.to_string(),
            created_at: created,
            expires_at: story::Model::expiry_for(created),
        }
    }

    fn input() -> CreateStoryInput {
        CreateStoryInput {
            image_url: None,
            video_url: None,
            caption: Some("hello".to_string()),
            duration: DEFAULT_DURATION,
            background_color: String::new(),
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn service(
        stories: Arc<DatabaseConnection>,
        directory_users: Arc<DatabaseConnection>,
        directory_profiles: Arc<DatabaseConnection>,
    ) -> StoryService {
        StoryService::new(
            StoryRepository::new(stories),
            FollowingRepository::new(empty_db()),
            UserRepository::new(empty_db()),
            UserDirectory::new(
                UserRepository::new(directory_users),
                ProfileRepository::new(directory_profiles),
            ),
        )
    }

    #[test]
    fn test_expiry_window() {
        let created = Utc::now().fixed_offset();
        let s = create_test_story("s1", "bob", created);

        assert!(s.is_active_at(created + Duration::hours(23) + Duration::minutes(59)));
        assert!(!s.is_active_at(created + Duration::hours(24)));
        assert!(!s.is_active_at(created + Duration::hours(30)));
    }

    #[test]
    fn test_group_by_author_keeps_newest() {
        let now = Utc::now().fixed_offset();
        let grouped = group_by_author(vec![
            create_test_story("s1", "bob", now - Duration::hours(3)),
            create_test_story("s2", "carol", now - Duration::hours(2)),
            create_test_story("s3", "bob", now - Duration::hours(1)),
        ]);

        assert_eq!(grouped["bob"].0.id, "s3");
        assert_eq!(grouped["bob"].1, 2);
        assert_eq!(grouped["carol"].1, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_image_and_video() {
        let mut input = input();
        input.image_url = Some("https://cdn.example.com/a.png".to_string());
        input.video_url = Some("https://cdn.example.com/a.mp4".to_string());

        let result = service(empty_db(), empty_db(), empty_db())
            .create("alice", input)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_story() {
        let mut input = input();
        input.caption = Some("   ".to_string());

        let result = service(empty_db(), empty_db(), empty_db())
            .create("alice", input)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_long_duration() {
        let mut input = input();
        input.duration = 20;

        let result = service(empty_db(), empty_db(), empty_db())
            .create("alice", input)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_sets_expiry_and_default_background() {
        let created = Utc::now().fixed_offset();
        let stories = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_story("s1", "alice", created)]])
                .into_connection(),
        );

        let story = service(stories, empty_db(), empty_db())
            .create("alice", input())
            .await
            .unwrap();

        assert_eq!(story.background_color, DEFAULT_BACKGROUND);
        assert_eq!(story.expires_at - story.created_at, Duration::hours(24));
    }

    #[tokio::test]
    async fn test_view_expired_story_not_found() {
        let created = Utc::now().fixed_offset() - Duration::hours(25);
        let stories = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_story("s1", "bob", created)]])
                .into_connection(),
        );

        let result = service(stories, empty_db(), empty_db())
            .view_story("alice", "s1")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_repeat_view_is_not_recorded_twice() {
        let created = Utc::now().fixed_offset() - Duration::hours(1);
        let story = create_test_story("s1", "bob", created);
        let stories = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[story.clone()]])
                .append_query_results([[story_view::Model {
                    id: "v1".to_string(),
                    story_id: "s1".to_string(),
                    viewer_id: "alice".to_string(),
                    viewed_at: created.into(),
                }]])
                .append_query_results([[story]])
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );
        let users = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user("bob", "bob")]])
                .into_connection(),
        );
        let profiles = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let viewing = service(stories, users, profiles)
            .view_story("alice", "s1")
            .await
            .unwrap();

        assert_eq!(viewing.views_count, 1);
        assert_eq!(viewing.user_stories.len(), 1);
        assert_eq!(viewing.author.username, "bob");
    }

    #[tokio::test]
    async fn test_delete_others_story_forbidden() {
        let stories = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_story("s1", "bob", Utc::now().fixed_offset())]])
                .into_connection(),
        );

        let result = service(stories, empty_db(), empty_db())
            .delete_story("alice", "s1")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
