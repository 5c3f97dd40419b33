//! Profile service: public profiles, profile edits and user search.

use chrono::NaiveDate;
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult};
use universe_db::{
    entities::{profile, user},
    repositories::{
        FollowingRepository, MessageRepository, NotificationRepository, PostRepository,
        ProfileRepository, UserRepository,
    },
};
use validator::Validate;

use crate::services::directory::{UserDirectory, UserSummary};
use crate::services::post::{PostService, PostView};

/// Posts per profile page.
const PROFILE_POST_LIMIT: u64 = 30;

/// Maximum number of search results.
const SEARCH_LIMIT: u64 = 50;

/// A user's public profile as seen by a viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub user: UserSummary,
    pub profile: Option<profile::Model>,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    /// Whether the viewer follows this user.
    pub is_following: bool,
    pub is_own_profile: bool,
    pub posts: Vec<PostView>,
}

/// Input for editing the caller's own profile.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    #[validate(url)]
    pub cover_url: Option<String>,

    #[validate(length(max = 100))]
    pub location: Option<String>,

    #[validate(url)]
    pub website: Option<String>,

    pub birth_date: Option<NaiveDate>,
}

/// Unread badges shown in navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCounts {
    pub unread_messages: u64,
    pub unread_notifications: u64,
}

/// Profile service for business logic.
#[derive(Clone)]
pub struct ProfileService {
    user_repo: UserRepository,
    profile_repo: ProfileRepository,
    following_repo: FollowingRepository,
    post_repo: PostRepository,
    message_repo: MessageRepository,
    notification_repo: NotificationRepository,
    directory: UserDirectory,
    posts: PostService,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        user_repo: UserRepository,
        profile_repo: ProfileRepository,
        following_repo: FollowingRepository,
        post_repo: PostRepository,
        message_repo: MessageRepository,
        notification_repo: NotificationRepository,
        directory: UserDirectory,
        posts: PostService,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            following_repo,
            post_repo,
            message_repo,
            notification_repo,
            directory,
            posts,
        }
    }

    /// Load the profile page for `username`.
    ///
    /// Posts come one page at a time; pass the last seen post as `until_id`.
    pub async fn get_profile(
        &self,
        username: &str,
        viewer_id: Option<&str>,
        until_id: Option<&str>,
    ) -> AppResult<ProfileView> {
        let user = self.user_repo.get_by_username(username).await?;
        let profile = self.profile_repo.find_by_user_id(&user.id).await?;

        let followers_count = self.following_repo.count_followers(&user.id).await?;
        let following_count = self.following_repo.count_following(&user.id).await?;
        let posts_count = self.post_repo.count_by_author(&user.id).await?;

        let is_following = match viewer_id {
            Some(viewer) if viewer != user.id => {
                self.following_repo.is_following(viewer, &user.id).await?
            }
            _ => false,
        };

        let posts = self
            .post_repo
            .find_by_author(&user.id, PROFILE_POST_LIMIT, until_id)
            .await?;
        let posts = self.posts.annotate(posts, viewer_id).await?;

        Ok(ProfileView {
            user: UserSummary::from_parts(&user, profile.as_ref()),
            is_own_profile: viewer_id == Some(user.id.as_str()),
            profile,
            followers_count,
            following_count,
            posts_count,
            is_following,
            posts,
        })
    }

    /// Apply profile edits for `user_id`. Absent fields are left unchanged.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<(user::Model, profile::Model)> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;

        let user = if input.first_name.is_some() || input.last_name.is_some() || input.email.is_some() {
            let mut active: user::ActiveModel = user.into();

            if let Some(first_name) = input.first_name {
                active.first_name = Set(Some(first_name));
            }
            if let Some(last_name) = input.last_name {
                active.last_name = Set(Some(last_name));
            }
            if let Some(email) = input.email {
                let email = email.trim().to_lowercase();
                if let Some(existing) = self.user_repo.find_by_email(&email).await?
                    && existing.id != user_id
                {
                    return Err(AppError::Conflict("Email already in use".to_string()));
                }
                active.email = Set(email);
            }
            active.updated_at = Set(Some(chrono::Utc::now().into()));

            self.user_repo.update(active).await?
        } else {
            user
        };

        let profile = match self.profile_repo.find_by_user_id(user_id).await? {
            Some(existing) => {
                let mut active = existing.into_active_model();
                if let Some(bio) = input.bio {
                    active.bio = Set(Some(bio));
                }
                if let Some(avatar_url) = input.avatar_url {
                    active.avatar_url = Set(Some(avatar_url));
                }
                if let Some(cover_url) = input.cover_url {
                    active.cover_url = Set(Some(cover_url));
                }
                if let Some(location) = input.location {
                    active.location = Set(Some(location));
                }
                if let Some(website) = input.website {
                    active.website = Set(Some(website));
                }
                if let Some(birth_date) = input.birth_date {
                    active.birth_date = Set(Some(birth_date));
                }
                active.updated_at = Set(Some(chrono::Utc::now().into()));
                self.profile_repo.update(active).await?
            }
            None => {
                let model = profile::ActiveModel {
                    user_id: Set(user_id.to_string()),
                    bio: Set(input.bio),
                    avatar_url: Set(input.avatar_url),
                    cover_url: Set(input.cover_url),
                    location: Set(input.location),
                    website: Set(input.website),
                    birth_date: Set(input.birth_date),
                    updated_at: Set(Some(chrono::Utc::now().into())),
                };
                self.profile_repo.create(model).await?
            }
        };

        tracing::debug!(user = %user_id, "Profile updated");
        Ok((user, profile))
    }

    /// Case-insensitive search on username, first and last name.
    ///
    /// The viewer is never included. A blank query yields nothing.
    pub async fn search_users(&self, query: &str, viewer_id: &str) -> AppResult<Vec<UserSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let users = self
            .user_repo
            .search(query, viewer_id, SEARCH_LIMIT)
            .await?;
        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
        let mut summaries = self.directory.summaries(&ids).await?;
        Ok(ids.iter().filter_map(|id| summaries.remove(id)).collect())
    }

    /// Unread message and notification counts.
    pub async fn unread_counts(&self, user_id: &str) -> AppResult<UnreadCounts> {
        Ok(UnreadCounts {
            unread_messages: self.message_repo.count_unread(user_id).await?,
            unread_notifications: self.notification_repo.count_unread(user_id).await?,
        })
    }
}
