//! Following repository.

use std::sync::Arc;

use crate::entities::{Following, User, following, user};
use crate::map_insert_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use universe_common::{AppError, AppResult};

/// A user ID with the number of follow edges pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct FollowerCount {
    pub user_id: String,
    pub follower_count: i64,
}

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a following relationship by follower and followee.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(follower_id, followee_id).await?.is_some())
    }

    /// Create a new following relationship.
    ///
    /// Returns `Conflict` when the edge already exists.
    pub async fn create(&self, model: following::ActiveModel) -> AppResult<following::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, "follow"))
    }

    /// Delete a following relationship by pair. Returns whether an edge was removed.
    pub async fn delete_by_pair(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let result = Following::delete_many()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// IDs of every user `user_id` follows.
    pub async fn followee_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(user_id))
            .select_only()
            .column(following::Column::FolloweeId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Follow edges where `user_id` is the followee, newest first.
    pub async fn find_followers(&self, user_id: &str) -> AppResult<Vec<following::Model>> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(user_id))
            .order_by_desc(following::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Follow edges where `user_id` is the follower, newest first.
    pub async fn find_following(&self, user_id: &str) -> AppResult<Vec<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(user_id))
            .order_by_desc(following::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count following of a user.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FollowerId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users ranked by follower count, skipping the given IDs.
    ///
    /// Every remaining user is a candidate, including those nobody follows.
    /// Ties go to the most recently joined.
    pub async fn most_followed(
        &self,
        exclude_ids: &[String],
        limit: u64,
    ) -> AppResult<Vec<FollowerCount>> {
        Self::ranking_query(exclude_ids, limit)
            .into_model::<FollowerCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn ranking_query(exclude_ids: &[String], limit: u64) -> Select<User> {
        let mut query = User::find()
            .select_only()
            .column_as(user::Column::Id, "user_id")
            .column_as(following::Column::Id.count(), "follower_count")
            .join(JoinType::LeftJoin, following::Relation::Followee.def().rev());

        if !exclude_ids.is_empty() {
            query = query.filter(user::Column::Id.is_not_in(exclude_ids.to_vec()));
        }

        query
            .group_by(user::Column::Id)
            .group_by(user::Column::CreatedAt)
            .order_by_desc(following::Column::Id.count())
            .order_by_desc(user::Column::CreatedAt)
            .limit(limit)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait};

    fn create_test_following(id: &str, follower_id: &str, followee_id: &str) -> following::Model {
        following::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_following_true() {
        let edge = create_test_following("f1", "alice", "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(repo.is_following("alice", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_following_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<following::Model>::new()])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(!repo.is_following("alice", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_without_edge_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(!repo.delete_by_pair("alice", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_count_followers() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert_eq!(repo.count_followers("bob").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_most_followed_includes_users_without_followers() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "user_id" => sea_orm::Value::from("carol"),
                        "follower_count" => sea_orm::Value::BigInt(Some(3)),
                    },
                    maplit::btreemap! {
                        "user_id" => sea_orm::Value::from("frank"),
                        "follower_count" => sea_orm::Value::BigInt(Some(0)),
                    },
                    maplit::btreemap! {
                        "user_id" => sea_orm::Value::from("eve"),
                        "follower_count" => sea_orm::Value::BigInt(Some(0)),
                    },
                    maplit::btreemap! {
                        "user_id" => sea_orm::Value::from("dave"),
                        "follower_count" => sea_orm::Value::BigInt(Some(0)),
                    },
                ]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let ranked = repo
            .most_followed(&["alice".to_string()], 5)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].user_id, "carol");
        assert_eq!(ranked[0].follower_count, 3);
        assert_eq!(ranked[3].follower_count, 0);
    }

    #[test]
    fn test_ranking_query_starts_from_users() {
        let sql = FollowingRepository::ranking_query(&["alice".to_string()], 5)
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#"FROM "user" LEFT JOIN "following""#));
        assert!(sql.contains(r#""user"."id" NOT IN ('alice')"#));
        assert!(sql.contains(r#"ORDER BY COUNT("following"."id") DESC, "user"."created_at" DESC"#));
        assert!(sql.ends_with("LIMIT 5"));
    }

    #[tokio::test]
    async fn test_followee_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! { "followee_id" => sea_orm::Value::from("bob") },
                    maplit::btreemap! { "followee_id" => sea_orm::Value::from("carol") },
                ]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let ids = repo.followee_ids("alice").await.unwrap();

        assert_eq!(ids, vec!["bob".to_string(), "carol".to_string()]);
    }
}
