//! Group service: communities and the membership state machine.
//!
//! A membership is `Pending`, `Approved` or `Rejected`. Joining a public group
//! lands in `Approved`; any other group starts at `Pending` until a moderator
//! approves or rejects it. Roles are tracked independently of status.

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{
        group::{self, GroupPrivacy},
        group_membership::{self, MembershipRole, MembershipStatus},
    },
    repositories::GroupRepository,
};
use validator::Validate;

use crate::services::directory::{UserDirectory, UserSummary, summary_or_unknown};
use crate::services::group_post::{GroupPostService, GroupPostView};

/// Maximum number of public groups listed.
const GROUP_LIST_LIMIT: u64 = 100;

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    #[validate(
        length(min = 1, max = 100),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(url)]
    pub cover_url: Option<String>,

    #[serde(default)]
    pub privacy: GroupPrivacy,

    #[validate(length(max = 2000))]
    pub rules: Option<String>,

    #[validate(length(max = 50))]
    pub category: Option<String>,
}

/// Input for editing a group. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditGroupInput {
    #[validate(
        length(min = 1, max = 100),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(url)]
    pub cover_url: Option<String>,

    pub privacy: Option<GroupPrivacy>,

    #[validate(length(max = 2000))]
    pub rules: Option<String>,

    #[validate(length(max = 50))]
    pub category: Option<String>,
}

/// A group with its approved member count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: group::Model,
    pub member_count: i64,
}

/// The groups page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupListing {
    pub groups: Vec<GroupSummary>,
    pub my_groups: Vec<group::Model>,
}

/// A group page as seen by a viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetail {
    pub group: group::Model,
    pub posts: Vec<GroupPostView>,
    pub membership: Option<group_membership::Model>,
    pub is_member: bool,
    pub is_admin: bool,
    pub is_moderator: bool,
    pub member_count: u64,
}

/// A membership with the member's public summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub user: UserSummary,
    pub role: MembershipRole,
    pub status: MembershipStatus,
    pub joined_at: chrono::DateTime<chrono::FixedOffset>,
}

/// Service for managing groups.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    directory: UserDirectory,
    posts: GroupPostService,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(
        group_repo: GroupRepository,
        directory: UserDirectory,
        posts: GroupPostService,
    ) -> Self {
        Self {
            group_repo,
            directory,
            posts,
            id_gen: IdGenerator::new(),
        }
    }

    /// Public groups with member counts, plus the viewer's own groups.
    pub async fn list(&self, viewer_id: &str) -> AppResult<GroupListing> {
        let public = self.group_repo.find_public(GROUP_LIST_LIMIT).await?;
        let ids: Vec<String> = public.iter().map(|g| g.id.clone()).collect();
        let counts = self.group_repo.count_members_by_groups(&ids).await?;

        let groups = public
            .into_iter()
            .map(|group| GroupSummary {
                member_count: counts.get(&group.id).copied().unwrap_or(0),
                group,
            })
            .collect();

        let my_ids = self.group_repo.approved_group_ids(viewer_id).await?;
        let my_groups = self.group_repo.find_by_ids(&my_ids).await?;

        Ok(GroupListing { groups, my_groups })
    }

    /// Create a group. The creator becomes its approved admin.
    pub async fn create(&self, user_id: &str, input: CreateGroupInput) -> AppResult<group::Model> {
        input.validate()?;

        let now = Utc::now();
        let model = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            admin_id: Set(user_id.to_string()),
            cover_url: Set(input.cover_url),
            privacy: Set(input.privacy),
            rules: Set(input.rules),
            category: Set(input.category),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        let group = self.group_repo.create(model).await?;

        let membership = group_membership::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group.id.clone()),
            user_id: Set(user_id.to_string()),
            role: Set(MembershipRole::Admin),
            status: Set(MembershipStatus::Approved),
            joined_at: Set(now.into()),
            updated_at: Set(None),
        };
        self.group_repo.create_membership(membership).await?;

        tracing::info!(group = %group.id, admin = %user_id, "Group created");
        Ok(group)
    }

    /// Open a group page. Non-public groups require an approved membership.
    pub async fn detail(&self, viewer_id: &str, group_id: &str) -> AppResult<GroupDetail> {
        let group = self.group_repo.get_by_id(group_id).await?;
        let membership = self.group_repo.find_membership(&group.id, viewer_id).await?;

        let is_member = membership.as_ref().is_some_and(group_membership::Model::is_active);
        if !group.privacy.is_public() && !is_member {
            return Err(AppError::Forbidden(
                "You must be a member to view this group".to_string(),
            ));
        }

        let posts = self.posts.feed(&group.id, viewer_id, None).await?;
        let member_count = self.group_repo.count_members(&group.id).await?;

        let role = membership.as_ref().map(|m| m.role);
        Ok(GroupDetail {
            is_admin: role.is_some_and(MembershipRole::is_admin),
            is_moderator: role.is_some_and(MembershipRole::can_moderate),
            group,
            posts,
            membership,
            is_member,
            member_count,
        })
    }

    /// Older group posts, for scrolling past the first page of `detail`.
    pub async fn posts(
        &self,
        viewer_id: &str,
        group_id: &str,
        until_id: Option<&str>,
    ) -> AppResult<Vec<GroupPostView>> {
        let group = self.group_repo.get_by_id(group_id).await?;
        if !group.privacy.is_public() {
            let membership = self.group_repo.find_membership(&group.id, viewer_id).await?;
            if !membership.as_ref().is_some_and(group_membership::Model::is_active) {
                return Err(AppError::Forbidden(
                    "You must be a member to view this group".to_string(),
                ));
            }
        }

        self.posts.feed(&group.id, viewer_id, until_id).await
    }

    /// Edit a group. Requires the admin role.
    pub async fn edit(
        &self,
        user_id: &str,
        group_id: &str,
        input: EditGroupInput,
    ) -> AppResult<group::Model> {
        input.validate()?;

        let group = self.group_repo.get_by_id(group_id).await?;
        let membership = self.require_moderator(&group.id, user_id).await?;
        if !membership.role.is_admin() {
            return Err(AppError::Forbidden(
                "Only group admins can edit the group".to_string(),
            ));
        }

        let mut active: group::ActiveModel = group.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(cover_url) = input.cover_url {
            active.cover_url = Set(Some(cover_url));
        }
        if let Some(privacy) = input.privacy {
            active.privacy = Set(privacy);
        }
        if let Some(rules) = input.rules {
            active.rules = Set(Some(rules));
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.group_repo.update(active).await
    }

    /// Delete a group. Only its creator may do so.
    pub async fn delete(&self, user_id: &str, group_id: &str) -> AppResult<()> {
        let group = self.group_repo.get_by_id(group_id).await?;
        if group.admin_id != user_id {
            return Err(AppError::Forbidden(
                "Only the group admin can delete the group".to_string(),
            ));
        }
        self.group_repo.delete(&group.id).await?;
        tracing::info!(group = %group_id, "Group deleted");
        Ok(())
    }

    /// Join a group. An existing membership is returned unchanged.
    pub async fn join(&self, user_id: &str, group_id: &str) -> AppResult<group_membership::Model> {
        let group = self.group_repo.get_by_id(group_id).await?;

        if let Some(existing) = self.group_repo.find_membership(&group.id, user_id).await? {
            return Ok(existing);
        }

        let status = if group.privacy.is_public() {
            MembershipStatus::Approved
        } else {
            MembershipStatus::Pending
        };

        let model = group_membership::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group.id.clone()),
            user_id: Set(user_id.to_string()),
            role: Set(MembershipRole::Member),
            status: Set(status),
            joined_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        match self.group_repo.create_membership(model).await {
            Ok(membership) => Ok(membership),
            Err(e) if e.is_conflict() => self
                .group_repo
                .find_membership(&group.id, user_id)
                .await?
                .ok_or(e),
            Err(e) => Err(e),
        }
    }

    /// Leave a group. The group admin cannot leave.
    pub async fn leave(&self, user_id: &str, group_id: &str) -> AppResult<()> {
        let group = self.group_repo.get_by_id(group_id).await?;
        if group.admin_id == user_id {
            return Err(AppError::BadRequest(
                "The group admin cannot leave the group".to_string(),
            ));
        }
        self.group_repo.delete_membership(&group.id, user_id).await?;
        Ok(())
    }

    /// Approve a pending membership.
    pub async fn approve_member(
        &self,
        moderator_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<group_membership::Model> {
        self.decide(moderator_id, group_id, user_id, MembershipStatus::Approved)
            .await
    }

    /// Reject a pending membership.
    pub async fn reject_member(
        &self,
        moderator_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<group_membership::Model> {
        self.decide(moderator_id, group_id, user_id, MembershipStatus::Rejected)
            .await
    }

    async fn decide(
        &self,
        moderator_id: &str,
        group_id: &str,
        user_id: &str,
        status: MembershipStatus,
    ) -> AppResult<group_membership::Model> {
        self.require_moderator(group_id, moderator_id).await?;

        let membership = self
            .group_repo
            .find_membership(group_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership request".to_string()))?;

        if membership.status != MembershipStatus::Pending {
            return Err(AppError::BadRequest(
                "Request is no longer pending".to_string(),
            ));
        }

        let mut active: group_membership::ActiveModel = membership.into();
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.group_repo.update_membership(active).await?;
        tracing::debug!(group = %group_id, user = %user_id, status = ?status, "Membership decided");
        Ok(updated)
    }

    /// Pending join requests. Moderators only.
    pub async fn pending_members(
        &self,
        moderator_id: &str,
        group_id: &str,
    ) -> AppResult<Vec<MemberView>> {
        self.require_moderator(group_id, moderator_id).await?;
        let memberships = self
            .group_repo
            .find_memberships(group_id, MembershipStatus::Pending)
            .await?;
        self.member_views(memberships).await
    }

    /// Approved members. Non-public groups require an approved membership.
    pub async fn members(&self, viewer_id: &str, group_id: &str) -> AppResult<Vec<MemberView>> {
        let group = self.group_repo.get_by_id(group_id).await?;
        if !group.privacy.is_public() {
            let membership = self.group_repo.find_membership(&group.id, viewer_id).await?;
            if !membership.as_ref().is_some_and(group_membership::Model::is_active) {
                return Err(AppError::Forbidden(
                    "You must be a member to see the member list".to_string(),
                ));
            }
        }

        let memberships = self
            .group_repo
            .find_memberships(&group.id, MembershipStatus::Approved)
            .await?;
        self.member_views(memberships).await
    }

    /// Remove a member. Moderators only; the group admin cannot be removed.
    pub async fn remove_member(
        &self,
        moderator_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        let group = self.group_repo.get_by_id(group_id).await?;
        self.require_moderator(&group.id, moderator_id).await?;

        if group.admin_id == user_id {
            return Err(AppError::Forbidden(
                "The group admin cannot be removed".to_string(),
            ));
        }

        self.group_repo.delete_membership(&group.id, user_id).await?;
        Ok(())
    }

    /// Promote a member to moderator. Group admin only; repeating it is a no-op.
    pub async fn make_moderator(
        &self,
        admin_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<group_membership::Model> {
        let group = self.group_repo.get_by_id(group_id).await?;
        if group.admin_id != admin_id {
            return Err(AppError::Forbidden(
                "Only the group admin can appoint moderators".to_string(),
            ));
        }

        let membership = self
            .group_repo
            .find_membership(&group.id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership".to_string()))?;

        if membership.role.can_moderate() {
            return Ok(membership);
        }

        let mut active: group_membership::ActiveModel = membership.into();
        active.role = Set(MembershipRole::Moderator);
        active.updated_at = Set(Some(Utc::now().into()));
        self.group_repo.update_membership(active).await
    }

    async fn require_moderator(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<group_membership::Model> {
        self.group_repo
            .find_membership(group_id, user_id)
            .await?
            .filter(group_membership::Model::can_moderate)
            .ok_or_else(|| {
                AppError::Forbidden("Only group moderators can do that".to_string())
            })
    }

    async fn member_views(
        &self,
        memberships: Vec<group_membership::Model>,
    ) -> AppResult<Vec<MemberView>> {
        let ids: Vec<String> = memberships.iter().map(|m| m.user_id.clone()).collect();
        let users = self.directory.summaries(&ids).await?;
        Ok(memberships
            .into_iter()
            .map(|m| MemberView {
                user: summary_or_unknown(&users, &m.user_id),
                role: m.role,
                status: m.status,
                joined_at: m.joined_at,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::empty_db;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use universe_db::repositories::{GroupPostRepository, ProfileRepository, UserRepository};

    fn create_test_group(id: &str, admin: &str, privacy: GroupPrivacy) -> group::Model {
        group::Model {
            id: id.to_string(),
            name: "Rustaceans".to_string(),
            description: None,
            admin_id: admin.to_string(),
            cover_url: None,
            privacy,
            rules: None,
            category: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn membership(
        user: &str,
        role: MembershipRole,
        status: MembershipStatus,
    ) -> group_membership::Model {
        group_membership::Model {
            id: format!("m-{user}"),
            group_id: "g1".to_string(),
            user_id: user.to_string(),
            role,
            status,
            joined_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(groups: Arc<DatabaseConnection>) -> GroupService {
        let directory =
            UserDirectory::new(UserRepository::new(empty_db()), ProfileRepository::new(empty_db()));
        let posts = GroupPostService::new(
            GroupRepository::new(empty_db()),
            GroupPostRepository::new(empty_db()),
            directory.clone(),
        );
        GroupService::new(GroupRepository::new(groups), directory, posts)
    }

    #[tokio::test]
    async fn test_join_public_group_is_approved() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Public)]])
                .append_query_results([Vec::<group_membership::Model>::new()])
                .append_query_results([[membership(
                    "alice",
                    MembershipRole::Member,
                    MembershipStatus::Approved,
                )]])
                .into_connection(),
        );

        let joined = service(groups).join("alice", "g1").await.unwrap();
        assert_eq!(joined.status, MembershipStatus::Approved);
        assert_eq!(joined.role, MembershipRole::Member);
    }

    #[tokio::test]
    async fn test_join_private_group_is_pending() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Private)]])
                .append_query_results([Vec::<group_membership::Model>::new()])
                .append_query_results([[membership(
                    "alice",
                    MembershipRole::Member,
                    MembershipStatus::Pending,
                )]])
                .into_connection(),
        );

        let joined = service(groups).join("alice", "g1").await.unwrap();
        assert_eq!(joined.status, MembershipStatus::Pending);
    }

    #[tokio::test]
    async fn test_join_twice_returns_existing() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Private)]])
                .append_query_results([[membership(
                    "alice",
                    MembershipRole::Member,
                    MembershipStatus::Pending,
                )]])
                .into_connection(),
        );

        let joined = service(groups).join("alice", "g1").await.unwrap();
        assert_eq!(joined.id, "m-alice");
    }

    #[tokio::test]
    async fn test_admin_cannot_leave() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Public)]])
                .into_connection(),
        );

        let result = service(groups).leave("carol", "g1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_private_detail_forbidden_for_pending() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Private)]])
                .append_query_results([[membership(
                    "alice",
                    MembershipRole::Member,
                    MembershipStatus::Pending,
                )]])
                .into_connection(),
        );

        let result = service(groups).detail("alice", "g1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_private_group_posts_forbidden_for_outsider() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Secret)]])
                .append_query_results([Vec::<group_membership::Model>::new()])
                .into_connection(),
        );

        let result = service(groups).posts("alice", "g1", Some("p9")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_moderator_approves_pending_request() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[membership(
                    "mod",
                    MembershipRole::Moderator,
                    MembershipStatus::Approved,
                )]])
                .append_query_results([[membership(
                    "alice",
                    MembershipRole::Member,
                    MembershipStatus::Pending,
                )]])
                .append_query_results([[membership(
                    "alice",
                    MembershipRole::Member,
                    MembershipStatus::Approved,
                )]])
                .into_connection(),
        );

        let approved = service(groups)
            .approve_member("mod", "g1", "alice")
            .await
            .unwrap();
        assert_eq!(approved.status, MembershipStatus::Approved);
    }

    #[tokio::test]
    async fn test_approve_already_decided_rejected() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[membership(
                    "carol",
                    MembershipRole::Admin,
                    MembershipStatus::Approved,
                )]])
                .append_query_results([[membership(
                    "alice",
                    MembershipRole::Member,
                    MembershipStatus::Rejected,
                )]])
                .into_connection(),
        );

        let result = service(groups).approve_member("carol", "g1", "alice").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_plain_member_cannot_approve() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[membership(
                    "bob",
                    MembershipRole::Member,
                    MembershipStatus::Approved,
                )]])
                .into_connection(),
        );

        let result = service(groups).approve_member("bob", "g1", "alice").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_group_admin_cannot_be_removed() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Public)]])
                .append_query_results([[membership(
                    "mod",
                    MembershipRole::Moderator,
                    MembershipStatus::Approved,
                )]])
                .into_connection(),
        );

        let result = service(groups).remove_member("mod", "g1", "carol").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_make_moderator_is_idempotent() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Public)]])
                .append_query_results([[membership(
                    "bob",
                    MembershipRole::Moderator,
                    MembershipStatus::Approved,
                )]])
                .into_connection(),
        );

        let membership = service(groups)
            .make_moderator("carol", "g1", "bob")
            .await
            .unwrap();
        assert_eq!(membership.role, MembershipRole::Moderator);
    }

    #[tokio::test]
    async fn test_make_moderator_requires_group_admin() {
        let groups = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "carol", GroupPrivacy::Public)]])
                .into_connection(),
        );

        let result = service(groups).make_moderator("bob", "g1", "alice").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
