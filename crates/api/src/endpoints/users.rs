//! Profile and user directory endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use universe_common::AppResult;
use universe_core::{ProfileView, UnreadCounts, UpdateProfileInput, UserSummary};
use universe_db::entities::{profile, user};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Profile page cursor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    pub until_id: Option<String>,
}

/// Updated account and profile.
#[derive(Serialize)]
pub struct ProfileUpdated {
    pub user: user::Model,
    pub profile: profile::Model,
}

/// Search users by handle or name.
async fn search(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let users = state.profile_service.search_users(&query.q, &user.id).await?;
    Ok(ApiResponse::ok(users))
}

/// Unread message and notification badges.
async fn unread_counts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCounts>> {
    let counts = state.profile_service.unread_counts(&user.id).await?;
    Ok(ApiResponse::ok(counts))
}

/// Edit the caller's profile.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<ProfileUpdated>> {
    let (user, profile) = state.profile_service.update_profile(&user.id, input).await?;
    Ok(ApiResponse::ok(ProfileUpdated { user, profile }))
}

/// A user's profile page.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> AppResult<ApiResponse<ProfileView>> {
    let profile = state
        .profile_service
        .get_profile(&username, viewer.id(), query.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(profile))
}

/// Users following `username`.
async fn followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let user = state.directory.resolve(&username).await?;
    let users = state.following_service.followers(&user.id).await?;
    Ok(ApiResponse::ok(users))
}

/// Users `username` follows.
async fn following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let user = state.directory.resolve(&username).await?;
    let users = state.following_service.following(&user.id).await?;
    Ok(ApiResponse::ok(users))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/unread-counts", get(unread_counts))
        .route("/me", post(update_me))
        .route("/{username}", get(show))
        .route("/{username}/followers", get(followers))
        .route("/{username}/following", get(following))
}
