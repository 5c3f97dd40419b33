//! Following service (the relationship store).

use sea_orm::Set;
use serde::Serialize;
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{following, notification::NotificationKind},
    repositories::{FollowingRepository, UserRepository},
};

use crate::services::directory::{UserDirectory, UserSummary};
use crate::services::notification::NotificationService;

/// Outcome of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowResult {
    /// A new edge was created.
    Followed,
    /// The edge already existed.
    AlreadyFollowing,
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    following_repo: FollowingRepository,
    user_repo: UserRepository,
    directory: UserDirectory,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(
        following_repo: FollowingRepository,
        user_repo: UserRepository,
        directory: UserDirectory,
        notifications: NotificationService,
    ) -> Self {
        Self {
            following_repo,
            user_repo,
            directory,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a user.
    ///
    /// Following an already-followed user is a no-op.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowResult> {
        if follower_id == followee_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        let followee = self.user_repo.get_by_id(followee_id).await?;

        if self
            .following_repo
            .is_following(follower_id, &followee.id)
            .await?
        {
            return Ok(FollowResult::AlreadyFollowing);
        }

        let model = following::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        match self.following_repo.create(model).await {
            Ok(_) => {}
            // Lost a race with an identical request.
            Err(e) if e.is_conflict() => return Ok(FollowResult::AlreadyFollowing),
            Err(e) => return Err(e),
        }

        tracing::debug!(follower = %follower_id, followee = %followee.id, "Follow edge created");

        self.notifications
            .notify_quietly(&followee.id, follower_id, NotificationKind::Follow, None)
            .await;

        Ok(FollowResult::Followed)
    }

    /// Unfollow a user. Missing edges are not an error.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        let removed = self
            .following_repo
            .delete_by_pair(follower_id, followee_id)
            .await?;
        if removed {
            tracing::debug!(follower = %follower_id, followee = %followee_id, "Follow edge removed");
        }
        Ok(())
    }

    /// Whether `follower_id` follows `followee_id`.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.following_repo
            .is_following(follower_id, followee_id)
            .await
    }

    /// Users following `user_id`, most recent first.
    pub async fn followers(&self, user_id: &str) -> AppResult<Vec<UserSummary>> {
        let edges = self.following_repo.find_followers(user_id).await?;
        let ids: Vec<String> = edges.into_iter().map(|e| e.follower_id).collect();
        self.ordered_summaries(&ids).await
    }

    /// Users `user_id` follows, most recent first.
    pub async fn following(&self, user_id: &str) -> AppResult<Vec<UserSummary>> {
        let edges = self.following_repo.find_following(user_id).await?;
        let ids: Vec<String> = edges.into_iter().map(|e| e.followee_id).collect();
        self.ordered_summaries(&ids).await
    }

    async fn ordered_summaries(&self, ids: &[String]) -> AppResult<Vec<UserSummary>> {
        let mut summaries = self.directory.summaries(ids).await?;
        Ok(ids.iter().filter_map(|id| summaries.remove(id)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::{empty_db, user};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use universe_db::entities::notification;
    use universe_db::repositories::{NotificationRepository, ProfileRepository};

    fn edge(follower: &str, followee: &str) -> following::Model {
        following::Model {
            id: format!("{follower}-{followee}"),
            follower_id: follower.to_string(),
            followee_id: followee.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(
        following: Arc<DatabaseConnection>,
        users: Arc<DatabaseConnection>,
        notifications: Arc<DatabaseConnection>,
        directory_users: Arc<DatabaseConnection>,
        directory_profiles: Arc<DatabaseConnection>,
    ) -> FollowingService {
        let directory = UserDirectory::new(
            UserRepository::new(directory_users),
            ProfileRepository::new(directory_profiles),
        );
        FollowingService::new(
            FollowingRepository::new(following),
            UserRepository::new(users),
            directory.clone(),
            NotificationService::new(NotificationRepository::new(notifications), directory),
        )
    }

    #[tokio::test]
    async fn test_follow_self_rejected() {
        let service = service(empty_db(), empty_db(), empty_db(), empty_db(), empty_db());
        let result = service.follow("alice", "alice").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_follow_existing_edge_is_noop() {
        let following = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge("alice", "bob")]])
                .into_connection(),
        );
        let users = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user("bob", "bob")]])
                .into_connection(),
        );

        let service = service(following, users, empty_db(), empty_db(), empty_db());
        let result = service.follow("alice", "bob").await.unwrap();

        assert_eq!(result, FollowResult::AlreadyFollowing);
    }

    #[tokio::test]
    async fn test_follow_creates_edge_and_notifies() {
        let following = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<following::Model>::new()])
                .append_query_results([[edge("alice", "bob")]])
                .into_connection(),
        );
        let users = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user("bob", "bob")]])
                .into_connection(),
        );
        let notifications = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[notification::Model {
                    id: "n1".to_string(),
                    target_id: "bob".to_string(),
                    actor_id: "alice".to_string(),
                    kind: NotificationKind::Follow,
                    post_id: None,
                    is_read: false,
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );

        let service = service(following, users, notifications, empty_db(), empty_db());
        let result = service.follow("alice", "bob").await.unwrap();

        assert_eq!(result, FollowResult::Followed);
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_succeeds() {
        let following = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = service(following, empty_db(), empty_db(), empty_db(), empty_db());
        assert!(service.unfollow("alice", "bob").await.is_ok());
    }

    #[tokio::test]
    async fn test_followers_keep_edge_order() {
        let following = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge("carol", "alice"), edge("bob", "alice")]])
                .into_connection(),
        );
        let users = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user("bob", "bob"), user("carol", "carol")]])
                .into_connection(),
        );
        let profiles = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<universe_db::entities::profile::Model>::new()])
                .into_connection(),
        );

        let service = service(following, empty_db(), empty_db(), users, profiles);
        let followers = service.followers("alice").await.unwrap();

        let names: Vec<&str> = followers.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["carol", "bob"]);
    }
}
