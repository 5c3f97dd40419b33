//! Group post repository (posts, likes and comments inside groups).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{GroupedCount, counts_by_key};
use crate::entities::{
    GroupPost, GroupPostComment, GroupPostLike, group_post, group_post_comment, group_post_like,
};
use crate::map_insert_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use universe_common::{AppError, AppResult};

/// Group post repository for database operations.
#[derive(Clone)]
pub struct GroupPostRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupPostRepository {
    /// Create a new group post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<group_post::Model> {
        GroupPost::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a post.
    pub async fn create(&self, model: group_post::ActiveModel) -> AppResult<group_post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: group_post::ActiveModel) -> AppResult<group_post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        GroupPost::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Posts of a group, pinned first then newest first.
    ///
    /// The first page carries the pinned posts. Later pages, selected with
    /// `until_id`, hold only unpinned posts older than the cursor.
    pub async fn find_by_group(
        &self,
        group_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<group_post::Model>> {
        let mut condition = Condition::all().add(group_post::Column::GroupId.eq(group_id));

        if let Some(until) = until_id {
            condition = condition
                .add(group_post::Column::IsPinned.eq(false))
                .add(group_post::Column::Id.lt(until));
        }

        GroupPost::find()
            .filter(condition)
            .order_by_desc(group_post::Column::IsPinned)
            .order_by_desc(group_post::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the like a user left on a group post.
    pub async fn find_like(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<group_post_like::Model>> {
        GroupPostLike::find()
            .filter(group_post_like::Column::UserId.eq(user_id))
            .filter(group_post_like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a like. Returns `Conflict` when the pair already exists.
    pub async fn create_like(
        &self,
        model: group_post_like::ActiveModel,
    ) -> AppResult<group_post_like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, "group post like"))
    }

    /// Remove a like by pair.
    pub async fn delete_like(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let result = GroupPostLike::delete_many()
            .filter(group_post_like::Column::UserId.eq(user_id))
            .filter(group_post_like::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count likes on a group post.
    pub async fn count_likes(&self, post_id: &str) -> AppResult<u64> {
        GroupPostLike::find()
            .filter(group_post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Like counts keyed by post ID.
    pub async fn count_likes_by_posts(
        &self,
        post_ids: &[String],
    ) -> AppResult<HashMap<String, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = GroupPostLike::find()
            .select_only()
            .column_as(group_post_like::Column::PostId, "key")
            .column_as(group_post_like::Column::Id.count(), "count")
            .filter(group_post_like::Column::PostId.is_in(post_ids.to_vec()))
            .group_by(group_post_like::Column::PostId)
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

        let ids = GroupPostLike::find()
            .select_only()
            .column(group_post_like::Column::PostId)
            .filter(group_post_like::Column::UserId.eq(user_id))
            .filter(group_post_like::Column::PostId.is_in(post_ids.to_vec()))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ids.into_iter().collect())
    }

    /// Create a comment.
    pub async fn create_comment(
        &self,
        model: group_post_comment::ActiveModel,
    ) -> AppResult<group_post_comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments on a group post, oldest first.
    pub async fn find_comments(
        &self,
        post_id: &str,
    ) -> AppResult<Vec<group_post_comment::Model>> {
        GroupPostComment::find()
            .filter(group_post_comment::Column::PostId.eq(post_id))
            .order_by_asc(group_post_comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a group post.
    pub async fn count_comments(&self, post_id: &str) -> AppResult<u64> {
        GroupPostComment::find()
            .filter(group_post_comment::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comment counts keyed by post ID.
    pub async fn count_comments_by_posts(
        &self,
        post_ids: &[String],
    ) -> AppResult<HashMap<String, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = GroupPostComment::find()
            .select_only()
            .column_as(group_post_comment::Column::PostId, "key")
            .column_as(group_post_comment::Column::Id.count(), "count")
            .filter(group_post_comment::Column::PostId.is_in(post_ids.to_vec()))
            .group_by(group_post_comment::Column::PostId)
            .into_model::<GroupedCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(counts_by_key(rows))
    }
}
