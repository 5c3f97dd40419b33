//! Timeline assembly: the home feed read model.

use serde::Serialize;
use universe_common::AppResult;
use universe_db::repositories::{FollowingRepository, PostRepository, UserRepository};

use crate::services::directory::{UserDirectory, UserSummary};
use crate::services::post::{PostService, PostView};
use crate::services::story::{StoryService, StoryUser};

/// Largest page of posts one request may ask for.
pub const MAX_FEED_LIMIT: u64 = 100;

/// Number of suggested users returned.
const SUGGESTION_LIMIT: u64 = 5;

/// Everything the home page needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub posts: Vec<PostView>,
    pub story_users: Vec<StoryUser>,
    pub suggested_users: Vec<UserSummary>,
}

/// Timeline service for business logic.
#[derive(Clone)]
pub struct TimelineService {
    post_repo: PostRepository,
    following_repo: FollowingRepository,
    user_repo: UserRepository,
    directory: UserDirectory,
    posts: PostService,
    stories: StoryService,
}

impl TimelineService {
    /// Create a new timeline service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        following_repo: FollowingRepository,
        user_repo: UserRepository,
        directory: UserDirectory,
        posts: PostService,
        stories: StoryService,
    ) -> Self {
        Self {
            post_repo,
            following_repo,
            user_repo,
            directory,
            posts,
            stories,
        }
    }

    /// Assemble the feed for `viewer_id`.
    ///
    /// Posts are authored by the viewer or someone they follow, newest first.
    /// `until_id` walks back through older posts, `since_id` fetches newer ones.
    pub async fn feed(
        &self,
        viewer_id: &str,
        limit: u64,
        until_id: Option<&str>,
        since_id: Option<&str>,
    ) -> AppResult<Timeline> {
        let mut authors = self.following_repo.followee_ids(viewer_id).await?;
        authors.push(viewer_id.to_string());

        let posts = self
            .post_repo
            .find_by_authors(&authors, limit.clamp(1, MAX_FEED_LIMIT), until_id, since_id)
            .await?;
        let posts = self.posts.annotate(posts, Some(viewer_id)).await?;

        let story_users = self.stories.story_users(viewer_id, &authors).await?;
        let suggested_users = self.suggested_users(&authors).await?;

        Ok(Timeline {
            posts,
            story_users,
            suggested_users,
        })
    }

    /// Up to five users the viewer does not follow, most followed first.
    ///
    /// Falls back to the newest users when the ranking comes back empty.
    async fn suggested_users(&self, exclude_ids: &[String]) -> AppResult<Vec<UserSummary>> {
        let ranked = self
            .following_repo
            .most_followed(exclude_ids, SUGGESTION_LIMIT)
            .await?;

        if ranked.is_empty() {
            let newest = self
                .user_repo
                .find_newest_excluding(exclude_ids, SUGGESTION_LIMIT)
                .await?;
            let mut result = Vec::with_capacity(newest.len());
            for u in &newest {
                result.push(self.directory.summary_of(u).await?);
            }
            return Ok(result);
        }

        let ids: Vec<String> = ranked.into_iter().map(|r| r.user_id).collect();
        let mut summaries = self.directory.summaries(&ids).await?;
        Ok(ids.iter().filter_map(|id| summaries.remove(id)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::{empty_db, user};
    use crate::services::notification::NotificationService;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use universe_db::entities::{post, profile, story};
    use universe_db::repositories::{
        CommentRepository, NotificationRepository, PostLikeRepository, ProfileRepository,
        StoryRepository,
    };

    struct Dbs {
        posts: Arc<DatabaseConnection>,
        likes: Arc<DatabaseConnection>,
        comments: Arc<DatabaseConnection>,
        following: Arc<DatabaseConnection>,
        stories: Arc<DatabaseConnection>,
        users: Arc<DatabaseConnection>,
        directory_users: Arc<DatabaseConnection>,
        directory_profiles: Arc<DatabaseConnection>,
    }

    fn service(dbs: Dbs) -> TimelineService {
        let directory = UserDirectory::new(
            UserRepository::new(dbs.directory_users),
            ProfileRepository::new(dbs.directory_profiles),
        );
        let posts = PostService::new(
            PostRepository::new(dbs.posts.clone()),
            PostLikeRepository::new(dbs.likes),
            CommentRepository::new(dbs.comments),
            directory.clone(),
            NotificationService::new(NotificationRepository::new(empty_db()), directory.clone()),
        );
        let stories = StoryService::new(
            StoryRepository::new(dbs.stories),
            FollowingRepository::new(empty_db()),
            UserRepository::new(empty_db()),
            directory.clone(),
        );
        TimelineService::new(
            PostRepository::new(dbs.posts),
            FollowingRepository::new(dbs.following),
            UserRepository::new(dbs.users),
            directory,
            posts,
            stories,
        )
    }

    fn create_test_story(id: &str, author: &str, minutes_ago: i64) -> story::Model {
        let created = Utc::now().fixed_offset() - Duration::minutes(minutes_ago);
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

    fn create_test_post(id: &str, author_id: &str, minutes_ago: i64) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            content: format!("post by {author_id}"),
            image_url: None,
            created_at: (Utc::now() - Duration::minutes(minutes_ago)).into(),
            updated_at: None,
        }
    }

    fn grouped_count(key: &str, count: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "key" => sea_orm::Value::from(key),
            "count" => sea_orm::Value::BigInt(Some(count)),
        }
    }

    fn followee_row(id: &str) -> BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "followee_id" => sea_orm::Value::from(id) }
    }

    fn no_rows() -> Vec<BTreeMap<&'static str, sea_orm::Value>> {
        Vec::new()
    }

    #[tokio::test]
    async fn test_feed_with_no_posts_falls_back_to_newest_users() {
        let dbs = Dbs {
            posts: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<post::Model>::new()])
                    .into_connection(),
            ),
            likes: empty_db(),
            comments: empty_db(),
            following: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([no_rows()])
                    .append_query_results([no_rows()])
                    .into_connection(),
            ),
            stories: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<story::Model>::new()])
                    .into_connection(),
            ),
            users: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[user("carol", "carol")]])
                    .into_connection(),
            ),
            directory_users: Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
            directory_profiles: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<profile::Model>::new()])
                    .into_connection(),
            ),
        };

        let timeline = service(dbs).feed("alice", 20, None, None).await.unwrap();

        assert!(timeline.posts.is_empty());
        assert!(timeline.story_users.is_empty());
        assert_eq!(timeline.suggested_users.len(), 1);
        assert_eq!(timeline.suggested_users[0].username, "carol");
    }

    #[tokio::test]
    async fn test_story_users_group_by_author_with_own_first() {
        let dbs = Dbs {
            posts: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<post::Model>::new()])
                    .into_connection(),
            ),
            likes: empty_db(),
            comments: empty_db(),
            following: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[followee_row("bob")]])
                    .append_query_results([[maplit::btreemap! {
                        "user_id" => sea_orm::Value::from("carol"),
                        "follower_count" => sea_orm::Value::BigInt(Some(3)),
                    }]])
                    .into_connection(),
            ),
            stories: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[
                        create_test_story("s1", "bob", 50),
                        create_test_story("s2", "alice", 40),
                        create_test_story("s3", "bob", 10),
                    ]])
                    .into_connection(),
            ),
            users: empty_db(),
            directory_users: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[user("alice", "alice"), user("bob", "bob")]])
                    .append_query_results([[user("carol", "carol")]])
                    .into_connection(),
            ),
            directory_profiles: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<profile::Model>::new()])
                    .append_query_results([Vec::<profile::Model>::new()])
                    .into_connection(),
            ),
        };

        let timeline = service(dbs).feed("alice", 20, None, None).await.unwrap();

        assert_eq!(timeline.story_users.len(), 2);
        assert!(timeline.story_users[0].is_own);
        let bob = &timeline.story_users[1];
        assert_eq!(bob.user.username, "bob");
        assert_eq!(bob.story_count, 2);
        assert_eq!(bob.latest_story.id, "s3");

        assert_eq!(timeline.suggested_users.len(), 1);
        assert_eq!(timeline.suggested_users[0].id, "carol");
    }

    #[tokio::test]
    async fn test_feed_shows_own_and_followed_posts_with_like_state() {
        let posts = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_post("p3", "bob", 5),
                    create_test_post("p2", "alice", 30),
                ]])
                .into_connection(),
        );
        let dbs = Dbs {
            posts: posts.clone(),
            likes: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[grouped_count("p3", 2)]])
                    .append_query_results([[maplit::btreemap! {
                        "post_id" => sea_orm::Value::from("p3"),
                    }]])
                    .into_connection(),
            ),
            comments: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[grouped_count("p2", 1)]])
                    .into_connection(),
            ),
            following: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[followee_row("bob")]])
                    .append_query_results([[maplit::btreemap! {
                        "user_id" => sea_orm::Value::from("carol"),
                        "follower_count" => sea_orm::Value::BigInt(Some(0)),
                    }]])
                    .into_connection(),
            ),
            stories: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<story::Model>::new()])
                    .into_connection(),
            ),
            users: empty_db(),
            directory_users: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[user("alice", "alice"), user("bob", "bob")]])
                    .append_query_results([[user("carol", "carol")]])
                    .into_connection(),
            ),
            directory_profiles: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<profile::Model>::new()])
                    .append_query_results([Vec::<profile::Model>::new()])
                    .into_connection(),
            ),
        };

        let timeline = service(dbs).feed("alice", 20, None, None).await.unwrap();

        let ids: Vec<&str> = timeline.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p3", "p2"]);
        assert!(timeline.posts[0].created_at > timeline.posts[1].created_at);

        let bobs = &timeline.posts[0];
        assert_eq!(bobs.author.username, "bob");
        assert_eq!(bobs.like_count, 2);
        assert_eq!(bobs.comment_count, 0);
        assert!(bobs.liked);

        let own = &timeline.posts[1];
        assert_eq!(own.author.username, "alice");
        assert_eq!(own.like_count, 0);
        assert_eq!(own.comment_count, 1);
        assert!(!own.liked);

        assert_eq!(timeline.suggested_users.len(), 1);
        assert_eq!(timeline.suggested_users[0].id, "carol");

        let log = Arc::try_unwrap(posts).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let select = &log[0].statements()[0];
        assert!(select.sql.contains(r#""post"."author_id" IN ($1, $2)"#));
        let values = &select.values.as_ref().unwrap().0;
        assert!(values.contains(&sea_orm::Value::from("bob")));
        assert!(values.contains(&sea_orm::Value::from("alice")));
        assert!(!values.contains(&sea_orm::Value::from("carol")));
    }
}
