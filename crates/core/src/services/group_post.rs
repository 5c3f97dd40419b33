//! Posts inside groups, with their likes and comments.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{group, group_membership, group_post, group_post_comment, group_post_like},
    repositories::{GroupPostRepository, GroupRepository},
};
use validator::Validate;

use crate::services::directory::{UserDirectory, UserSummary, summary_or_unknown};
use crate::services::post::LikeToggle;

/// Posts per group page.
const GROUP_FEED_LIMIT: u64 = 30;

/// Input for posting in a group.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupPostInput {
    #[validate(
        length(min = 1, max = 5000),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub content: String,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Input for commenting on a group post.
#[derive(Debug, Deserialize, Validate)]
pub struct GroupCommentInput {
    #[validate(length(max = 1000))]
    pub content: String,
}

/// A group post annotated for a viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPostView {
    pub id: String,
    pub group_id: String,
    pub author: UserSummary,
    pub content: String,
    pub image_url: Option<String>,
    pub is_pinned: bool,
    pub created_at: DateTime<FixedOffset>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked: bool,
}

/// A comment on a group post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCommentView {
    pub id: String,
    pub author: UserSummary,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Group post service for business logic.
#[derive(Clone)]
pub struct GroupPostService {
    group_repo: GroupRepository,
    post_repo: GroupPostRepository,
    directory: UserDirectory,
    id_gen: IdGenerator,
}

impl GroupPostService {
    /// Create a new group post service.
    #[must_use]
    pub const fn new(
        group_repo: GroupRepository,
        post_repo: GroupPostRepository,
        directory: UserDirectory,
    ) -> Self {
        Self {
            group_repo,
            post_repo,
            directory,
            id_gen: IdGenerator::new(),
        }
    }

    /// Posts of a group, pinned first, then newest first.
    ///
    /// Callers check that the viewer may see the group.
    pub async fn feed(
        &self,
        group_id: &str,
        viewer_id: &str,
        until_id: Option<&str>,
    ) -> AppResult<Vec<GroupPostView>> {
        let posts = self
            .post_repo
            .find_by_group(group_id, GROUP_FEED_LIMIT, until_id)
            .await?;
        self.annotate(posts, viewer_id).await
    }

    /// Post in a group. Only approved members may post.
    pub async fn create_post(
        &self,
        author_id: &str,
        group_id: &str,
        input: CreateGroupPostInput,
    ) -> AppResult<group_post::Model> {
        input.validate()?;

        let group = self.group_repo.get_by_id(group_id).await?;
        self.require_member(&group.id, author_id).await?;

        let model = group_post::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group.id),
            author_id: Set(author_id.to_string()),
            content: Set(input.content.trim().to_string()),
            image_url: Set(input.image_url),
            is_pinned: Set(false),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.post_repo.create(model).await
    }

    /// Delete a group post. Allowed for its author and for moderators.
    pub async fn delete_post(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if post.author_id != user_id {
            let membership = self.group_repo.find_membership(&post.group_id, user_id).await?;
            if !membership.as_ref().is_some_and(group_membership::Model::can_moderate) {
                return Err(AppError::Forbidden(
                    "Only the author or a moderator can delete this post".to_string(),
                ));
            }
        }

        self.post_repo.delete(&post.id).await
    }

    /// Like a group post, or remove the like if it exists.
    pub async fn toggle_like(&self, user_id: &str, post_id: &str) -> AppResult<LikeToggle> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let group = self.group_repo.get_by_id(&post.group_id).await?;
        self.require_visible(&group, user_id).await?;

        let liked = if self.post_repo.delete_like(user_id, &post.id).await? {
            false
        } else {
            let model = group_post_like::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                post_id: Set(post.id.clone()),
                created_at: Set(Utc::now().into()),
            };
            match self.post_repo.create_like(model).await {
                Ok(_) => {}
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e),
            }
            true
        };

        let like_count = self.post_repo.count_likes(&post.id).await?;
        Ok(LikeToggle { liked, like_count })
    }

    /// Comment on a group post. Only approved members may comment.
    pub async fn add_comment(
        &self,
        author_id: &str,
        post_id: &str,
        input: GroupCommentInput,
    ) -> AppResult<GroupCommentView> {
        let content = input.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
        }
        input.validate()?;

        let post = self.post_repo.get_by_id(post_id).await?;
        self.require_member(&post.group_id, author_id).await?;

        let model = group_post_comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_id: Set(author_id.to_string()),
            content: Set(content),
            created_at: Set(Utc::now().into()),
        };
        let comment = self.post_repo.create_comment(model).await?;

        let authors = self.directory.summaries(std::slice::from_ref(&comment.author_id)).await?;
        Ok(GroupCommentView {
            author: summary_or_unknown(&authors, &comment.author_id),
            id: comment.id,
            content: comment.content,
            created_at: comment.created_at,
        })
    }

    /// Comments on a group post, oldest first.
    pub async fn list_comments(&self, viewer_id: &str, post_id: &str) -> AppResult<Vec<GroupCommentView>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let group = self.group_repo.get_by_id(&post.group_id).await?;
        self.require_visible(&group, viewer_id).await?;

        let comments = self.post_repo.find_comments(&post.id).await?;
        let author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        let authors = self.directory.summaries(&author_ids).await?;

        Ok(comments
            .into_iter()
            .map(|c| GroupCommentView {
                author: summary_or_unknown(&authors, &c.author_id),
                id: c.id,
                content: c.content,
                created_at: c.created_at,
            })
            .collect())
    }

    /// Pin or unpin a post. Moderators only. Returns the new pinned state.
    pub async fn pin_post(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let membership = self.group_repo.find_membership(&post.group_id, user_id).await?;
        if !membership.as_ref().is_some_and(group_membership::Model::can_moderate) {
            return Err(AppError::Forbidden(
                "Only moderators can pin posts".to_string(),
            ));
        }

        let pinned = !post.is_pinned;
        let mut active: group_post::ActiveModel = post.into();
        active.is_pinned = Set(pinned);
        active.updated_at = Set(Some(Utc::now().into()));
        self.post_repo.update(active).await?;

        Ok(pinned)
    }

    async fn annotate(
        &self,
        posts: Vec<group_post::Model>,
        viewer_id: &str,
    ) -> AppResult<Vec<GroupPostView>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();

        let like_counts = self.post_repo.count_likes_by_posts(&ids).await?;
        let comment_counts = self.post_repo.count_comments_by_posts(&ids).await?;
        let liked: HashSet<String> = self.post_repo.liked_post_ids(viewer_id, &ids).await?;
        let authors = self.directory.summaries(&author_ids).await?;

        Ok(posts
            .into_iter()
            .map(|p| GroupPostView {
                author: summary_or_unknown(&authors, &p.author_id),
                like_count: like_counts.get(&p.id).copied().unwrap_or(0),
                comment_count: comment_counts.get(&p.id).copied().unwrap_or(0),
                liked: liked.contains(&p.id),
                id: p.id,
                group_id: p.group_id,
                content: p.content,
                image_url: p.image_url,
                is_pinned: p.is_pinned,
                created_at: p.created_at,
            })
            .collect())
    }

    async fn require_member(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        let membership = self.group_repo.find_membership(group_id, user_id).await?;
        if membership.as_ref().is_some_and(group_membership::Model::is_active) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You must be a member of this group".to_string(),
            ))
        }
    }

    async fn require_visible(&self, group: &group::Model, user_id: &str) -> AppResult<()> {
        if group.privacy.is_public() {
            return Ok(());
        }
        self.require_member(&group.id, user_id).await
    }
}
