//! Group repository (groups and memberships).

use std::collections::HashMap;
use std::sync::Arc;

use super::{GroupedCount, counts_by_key};
use crate::entities::{
    Group, GroupMembership, group,
    group_membership::{self, MembershipStatus},
};
use crate::map_insert_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use universe_common::{AppError, AppResult};

/// Group repository for database operations.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<group::Model>> {
        Group::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a group by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<group::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {id}")))
    }

    /// Find groups by IDs, newest first.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<group::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Group::find()
            .filter(group::Column::Id.is_in(ids.to_vec()))
            .order_by_desc(group::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Public groups, newest first.
    pub async fn find_public(&self, limit: u64) -> AppResult<Vec<group::Model>> {
        Group::find()
            .filter(group::Column::Privacy.eq(group::GroupPrivacy::Public))
            .order_by_desc(group::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a group.
    pub async fn create(&self, model: group::ActiveModel) -> AppResult<group::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a group.
    pub async fn update(&self, model: group::ActiveModel) -> AppResult<group::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a group with its memberships and posts.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Group::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find a user's membership in a group, in any status.
    pub async fn find_membership(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<Option<group_membership::Model>> {
        GroupMembership::find()
            .filter(group_membership::Column::GroupId.eq(group_id))
            .filter(group_membership::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a membership. Returns `Conflict` when one already exists.
    pub async fn create_membership(
        &self,
        model: group_membership::ActiveModel,
    ) -> AppResult<group_membership::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, "membership"))
    }

    /// Update a membership.
    pub async fn update_membership(
        &self,
        model: group_membership::ActiveModel,
    ) -> AppResult<group_membership::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a membership by pair.
    pub async fn delete_membership(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let result = GroupMembership::delete_many()
            .filter(group_membership::Column::GroupId.eq(group_id))
            .filter(group_membership::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Memberships of a group in the given status, oldest first.
    pub async fn find_memberships(
        &self,
        group_id: &str,
        status: MembershipStatus,
    ) -> AppResult<Vec<group_membership::Model>> {
        GroupMembership::find()
            .filter(group_membership::Column::GroupId.eq(group_id))
            .filter(group_membership::Column::Status.eq(status))
            .order_by_asc(group_membership::Column::JoinedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of groups where the user is an approved member.
    pub async fn approved_group_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        GroupMembership::find()
            .select_only()
            .column(group_membership::Column::GroupId)
            .filter(group_membership::Column::UserId.eq(user_id))
            .filter(group_membership::Column::Status.eq(MembershipStatus::Approved))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count approved members of a group.
    pub async fn count_members(&self, group_id: &str) -> AppResult<u64> {
        GroupMembership::find()
            .filter(group_membership::Column::GroupId.eq(group_id))
            .filter(group_membership::Column::Status.eq(MembershipStatus::Approved))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved member counts keyed by group ID.
    pub async fn count_members_by_groups(
        &self,
        group_ids: &[String],
    ) -> AppResult<HashMap<String, i64>> {
        if group_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = GroupMembership::find()
            .select_only()
            .column_as(group_membership::Column::GroupId, "key")
            .column_as(group_membership::Column::Id.count(), "count")
            .filter(group_membership::Column::GroupId.is_in(group_ids.to_vec()))
            .filter(group_membership::Column::Status.eq(MembershipStatus::Approved))
            .group_by(group_membership::Column::GroupId)
            .into_model::<GroupedCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(counts_by_key(rows))
    }
}
