//! Post service: posts, likes and comments.

use chrono::{DateTime, FixedOffset};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{comment, notification::NotificationKind, post, post_like, user},
    repositories::{CommentRepository, PostLikeRepository, PostRepository},
};
use validator::Validate;

use crate::services::directory::{UserDirectory, UserSummary, summary_or_unknown};
use crate::services::notification::NotificationService;

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(
        length(min = 1, max = 5000),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub content: String,

    #[validate(url, length(max = 1024))]
    pub image_url: Option<String>,
}

/// Input for commenting on a post.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(max = 1000))]
    pub content: String,
}

/// A post annotated for a particular viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub author: UserSummary,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub like_count: i64,
    pub comment_count: i64,
    /// Whether the viewer has liked the post. Always false for anonymous viewers.
    pub liked: bool,
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: u64,
}

/// Comment as returned right after it was added.
#[derive(Debug, Clone, Serialize)]
pub struct AddedComment {
    pub author_username: String,
    pub author_avatar: Option<String>,
    pub content: String,
}

/// Result of adding a comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentAdded {
    pub success: bool,
    pub comment: AddedComment,
    pub comment_count: u64,
}

/// A comment with its author, for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub author: UserSummary,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    like_repo: PostLikeRepository,
    comment_repo: CommentRepository,
    directory: UserDirectory,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        like_repo: PostLikeRepository,
        comment_repo: CommentRepository,
        directory: UserDirectory,
        notifications: NotificationService,
    ) -> Self {
        Self {
            post_repo,
            like_repo,
            comment_repo,
            directory,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            content: Set(input.content.trim().to_string()),
            image_url: Set(input.image_url),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        self.post_repo.create(model).await
    }

    /// Get a post annotated for the viewer.
    pub async fn get(&self, post_id: &str, viewer_id: Option<&str>) -> AppResult<PostView> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let mut views = self.annotate(vec![post], viewer_id).await?;
        views
            .pop()
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))
    }

    /// Delete a post. Only the author may delete it.
    pub async fn delete(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        self.post_repo.delete(post_id).await
    }

    /// Like a post, or remove the like if it exists.
    pub async fn toggle_like(&self, user_id: &str, post_id: &str) -> AppResult<LikeToggle> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let liked = if self.like_repo.delete_by_pair(user_id, &post.id).await? {
            false
        } else {
            let model = post_like::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                post_id: Set(post.id.clone()),
                created_at: Set(chrono::Utc::now().into()),
            };
            match self.like_repo.create(model).await {
                Ok(_) => {
                    self.notifications
                        .notify_quietly(
                            &post.author_id,
                            user_id,
                            NotificationKind::Like,
                            Some(&post.id),
                        )
                        .await;
                }
                // A concurrent request inserted the same like first.
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e),
            }
            true
        };

        let like_count = self.like_repo.count_by_post(&post.id).await?;
        Ok(LikeToggle { liked, like_count })
    }

    /// Add a comment to a post.
    pub async fn add_comment(
        &self,
        author: &user::Model,
        post_id: &str,
        input: CommentInput,
    ) -> AppResult<CommentAdded> {
        let content = input.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
        }
        input.validate()?;

        let post = self.post_repo.get_by_id(post_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            author_id: Set(author.id.clone()),
            content: Set(content),
            created_at: Set(chrono::Utc::now().into()),
        };
        let created = self.comment_repo.create(model).await?;

        self.notifications
            .notify_quietly(
                &post.author_id,
                &author.id,
                NotificationKind::Comment,
                Some(&post.id),
            )
            .await;

        let summary = self.directory.summary_of(author).await?;
        let comment_count = self.comment_repo.count_by_post(&post.id).await?;

        Ok(CommentAdded {
            success: true,
            comment: AddedComment {
                author_username: summary.username,
                author_avatar: summary.avatar_url,
                content: created.content,
            },
            comment_count,
        })
    }

    /// Comments on a post, oldest first.
    pub async fn list_comments(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let comments = self.comment_repo.find_by_post(&post.id).await?;

        let author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        let authors = self.directory.summaries(&author_ids).await?;

        Ok(comments
            .into_iter()
            .map(|c| CommentView {
                author: summary_or_unknown(&authors, &c.author_id),
                id: c.id,
                content: c.content,
                created_at: c.created_at,
            })
            .collect())
    }

    /// Attach live counts, author summaries and the viewer's liked flag.
    ///
    /// Input order is preserved.
    pub async fn annotate(
        &self,
        posts: Vec<post::Model>,
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<PostView>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();

        let like_counts = self.like_repo.count_by_posts(&ids).await?;
        let comment_counts = self.comment_repo.count_by_posts(&ids).await?;
        let liked = match viewer_id {
            Some(viewer) => self.like_repo.liked_post_ids(viewer, &ids).await?,
            None => std::collections::HashSet::new(),
        };
        let authors = self.directory.summaries(&author_ids).await?;

        Ok(posts
            .into_iter()
            .map(|p| PostView {
                author: summary_or_unknown(&authors, &p.author_id),
                like_count: like_counts.get(&p.id).copied().unwrap_or(0),
                comment_count: comment_counts.get(&p.id).copied().unwrap_or(0),
                liked: liked.contains(&p.id),
                id: p.id,
                content: p.content,
                image_url: p.image_url,
                created_at: p.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::{empty_db, profile, user};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use universe_db::repositories::{NotificationRepository, ProfileRepository, UserRepository};

    fn create_test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            content: "hello".to_string(),
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn notification_db(target: &str) -> Arc<DatabaseConnection> {
        use universe_db::entities::notification;
        Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[notification::Model {
                    id: "n1".to_string(),
                    target_id: target.to_string(),
                    actor_id: "alice".to_string(),
                    kind: NotificationKind::Like,
                    post_id: Some("p1".to_string()),
                    is_read: false,
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        )
    }

    fn service(
        posts: Arc<DatabaseConnection>,
        likes: Arc<DatabaseConnection>,
        comments: Arc<DatabaseConnection>,
        notifications: Arc<DatabaseConnection>,
        users: Arc<DatabaseConnection>,
        profiles: Arc<DatabaseConnection>,
    ) -> PostService {
        let directory = UserDirectory::new(UserRepository::new(users), ProfileRepository::new(profiles));
        PostService::new(
            PostRepository::new(posts),
            PostLikeRepository::new(likes),
            CommentRepository::new(comments),
            directory.clone(),
            NotificationService::new(NotificationRepository::new(notifications), directory),
        )
    }

    #[tokio::test]
    async fn test_toggle_like_first_call_likes() {
        let posts = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "bob")]])
                .into_connection(),
        );
        let likes = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[post_like::Model {
                    id: "l1".to_string(),
                    user_id: "alice".to_string(),
                    post_id: "p1".to_string(),
                    created_at: Utc::now().into(),
                }]])
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );

        let notifications = notification_db("bob");
        let service = service(posts, likes, empty_db(), notifications.clone(), empty_db(), empty_db());
        let result = service.toggle_like("alice", "p1").await.unwrap();

        assert_eq!(
            result,
            LikeToggle {
                liked: true,
                like_count: 1
            }
        );

        drop(service);
        let log = Arc::try_unwrap(notifications).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let insert = &log[0].statements()[0];
        assert!(insert.sql.starts_with(r#"INSERT INTO "notification""#));
        let values = &insert.values.as_ref().unwrap().0;
        assert!(values.contains(&sea_orm::Value::from("bob")));
        assert!(values.contains(&sea_orm::Value::from("alice")));
        assert!(values.contains(&sea_orm::Value::from("like")));
        assert!(values.contains(&sea_orm::Value::from("p1")));
    }

    #[tokio::test]
    async fn test_toggle_like_second_call_unlikes() {
        let posts = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "bob")]])
                .into_connection(),
        );
        let likes = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[count_row(0)]])
                .into_connection(),
        );

        let service = service(posts, likes, empty_db(), empty_db(), empty_db(), empty_db());
        let result = service.toggle_like("alice", "p1").await.unwrap();

        assert!(!result.liked);
        assert_eq!(result.like_count, 0);
    }

    #[tokio::test]
    async fn test_delete_other_users_post_forbidden() {
        let posts = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "bob")]])
                .into_connection(),
        );

        let service = service(posts, empty_db(), empty_db(), empty_db(), empty_db(), empty_db());
        let result = service.delete("alice", "p1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_add_comment_blank_rejected() {
        let service = service(empty_db(), empty_db(), empty_db(), empty_db(), empty_db(), empty_db());
        let result = service
            .add_comment(
                &user("alice", "alice"),
                "p1",
                CommentInput {
                    content: "   ".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_add_comment_returns_author_and_count() {
        let posts = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "bob")]])
                .into_connection(),
        );
        let comments = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment::Model {
                    id: "c1".to_string(),
                    post_id: "p1".to_string(),
                    author_id: "alice".to_string(),
                    content: "nice".to_string(),
                    created_at: Utc::now().into(),
                }]])
                .append_query_results([[count_row(3)]])
                .into_connection(),
        );
        let profiles = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile("alice", Some("https://cdn.example.com/a.png"))]])
                .into_connection(),
        );

        let service = service(posts, empty_db(), comments, notification_db("bob"), empty_db(), profiles);
        let result = service
            .add_comment(
                &user("alice", "alice"),
                "p1",
                CommentInput {
                    content: " nice ".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.comment.author_username, "alice");
        assert_eq!(
            result.comment.author_avatar.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(result.comment_count, 3);
    }

    #[tokio::test]
    async fn test_annotate_marks_viewer_likes() {
        let likes = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "key" => sea_orm::Value::from("p1"),
                    "count" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .append_query_results([[maplit::btreemap! {
                    "post_id" => sea_orm::Value::from("p1"),
                }]])
                .into_connection(),
        );
        let comments = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                .into_connection(),
        );
        let users = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user("bob", "bob")]])
                .into_connection(),
        );
        let profiles = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<universe_db::entities::profile::Model>::new()])
                .into_connection(),
        );

        let service = service(empty_db(), likes, comments, empty_db(), users, profiles);
        let views = service
            .annotate(
                vec![create_test_post("p1", "bob"), create_test_post("p2", "bob")],
                Some("alice"),
            )
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert!(views[0].liked);
        assert_eq!(views[0].like_count, 1);
        assert!(!views[1].liked);
        assert_eq!(views[1].comment_count, 0);
        assert_eq!(views[0].author.username, "bob");
    }
}
