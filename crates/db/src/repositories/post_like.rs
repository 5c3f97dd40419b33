//! Post like repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{GroupedCount, counts_by_key};
use crate::entities::{PostLike, post_like};
use crate::map_insert_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect,
};
use universe_common::{AppError, AppResult};

/// Post like repository for database operations.
#[derive(Clone)]
pub struct PostLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLikeRepository {
    /// Create a new post like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the like a user left on a post.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<post_like::Model>> {
        PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a like. Returns `Conflict` when the pair already exists.
    pub async fn create(&self, model: post_like::ActiveModel) -> AppResult<post_like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, "like"))
    }

    /// Remove a like by pair.
    pub async fn delete_by_pair(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let result = PostLike::delete_many()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Like counts keyed by post ID. Posts without likes are absent.
    pub async fn count_by_posts(&self, post_ids: &[String]) -> AppResult<HashMap<String, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = PostLike::find()
            .select_only()
            .column_as(post_like::Column::PostId, "key")
            .column_as(post_like::Column::Id.count(), "count")
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .group_by(post_like::Column::PostId)
            .into_model::<GroupedCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(counts_by_key(rows))
    }

    /// Subset of `post_ids` the user has liked.
    pub async fn liked_post_ids(
        &self,
        user_id: &str,
        post_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = PostLike::find()
            .select_only()
            .column(post_like::Column::PostId)
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ids.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_count_by_posts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "key" => sea_orm::Value::from("p1"),
                    "count" => sea_orm::Value::BigInt(Some(2)),
                }]])
                .into_connection(),
        );

        let repo = PostLikeRepository::new(db);
        let counts = repo
            .count_by_posts(&["p1".to_string(), "p2".to_string()])
            .await
            .unwrap();

        assert_eq!(counts.get("p1"), Some(&2));
        assert_eq!(counts.get("p2"), None);
    }

    #[tokio::test]
    async fn test_liked_post_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "post_id" => sea_orm::Value::from("p1"),
                }]])
                .into_connection(),
        );

        let repo = PostLikeRepository::new(db);
        let liked = repo
            .liked_post_ids("alice", &["p1".to_string(), "p2".to_string()])
            .await
            .unwrap();

        assert!(liked.contains("p1"));
        assert!(!liked.contains("p2"));
    }

    #[tokio::test]
    async fn test_delete_by_pair() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostLikeRepository::new(db);
        assert!(repo.delete_by_pair("alice", "p1").await.unwrap());
    }
}
