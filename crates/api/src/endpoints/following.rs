//! Following endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;
use universe_common::AppResult;
use universe_core::FollowResult;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

#[derive(Serialize)]
pub struct FollowResponse {
    pub status: FollowResult,
}

/// Follow a user by handle.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowResponse>> {
    let target = state.directory.resolve(&username).await?;
    let status = state.following_service.follow(&user.id, &target.id).await?;
    Ok(ApiResponse::ok(FollowResponse { status }))
}

/// Unfollow a user by handle.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<StatusCode> {
    let target = state.directory.resolve(&username).await?;
    state.following_service.unfollow(&user.id, &target.id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{username}", post(follow).delete(unfollow))
}
