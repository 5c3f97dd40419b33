//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use universe_common::{AppError, AppResult};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post. Likes and comments go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Posts written by any of `author_ids`, newest first.
    ///
    /// * `until_id` - Return posts older than this ID (for pagination)
    /// * `since_id` - Return posts newer than this ID
    pub async fn find_by_authors(
        &self,
        author_ids: &[String],
        limit: u64,
        until_id: Option<&str>,
        since_id: Option<&str>,
    ) -> AppResult<Vec<post::Model>> {
        if author_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut condition = Condition::all().add(post::Column::AuthorId.is_in(author_ids.to_vec()));

        if let Some(until) = until_id {
            condition = condition.add(post::Column::Id.lt(until));
        }

        if let Some(since) = since_id {
            condition = condition.add(post::Column::Id.gt(since));
        }

        Post::find()
            .filter(condition)
            .order_by_desc(post::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts by a single author, newest first.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<post::Model>> {
        self.find_by_authors(&[author_id.to_string()], limit, until_id, None)
            .await
    }

    /// Count posts by an author.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

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

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        match repo.get_by_id("missing").await {
            Err(AppError::PostNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected PostNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_authors() {
        let posts = vec![create_test_post("p2", "bob"), create_test_post("p1", "alice")];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([posts])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo
            .find_by_authors(&["alice".to_string(), "bob".to_string()], 50, None, None)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "p2");
    }

    #[tokio::test]
    async fn test_find_by_authors_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = PostRepository::new(db);

        assert!(repo.find_by_authors(&[], 50, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_authors_until_id_pages_backwards() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![create_test_post("p1", "bob")]])
                .into_connection(),
        );

        let repo = PostRepository::new(db.clone());
        let result = repo
            .find_by_authors(&["bob".to_string()], 20, Some("p2"), None)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let stmt = &log[0].statements()[0];
        assert!(stmt.sql.contains(r#""post"."id" < $2"#));
        assert!(stmt.sql.contains(r#"ORDER BY "post"."id" DESC"#));
        assert!(
            stmt.values
                .as_ref()
                .unwrap()
                .0
                .contains(&sea_orm::Value::from("p2"))
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(repo.delete("p1").await.is_ok());
    }
}
