//! Group and membership endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;
use universe_common::AppResult;
use universe_core::{
    CreateGroupInput, CreateGroupPostInput, EditGroupInput, GroupDetail, GroupListing,
    GroupPostView, MemberView,
};
use universe_db::entities::{group, group_membership, group_post};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created, no_content},
};

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<GroupListing>> {
    let listing = state.group_service.list(&user.id).await?;
    Ok(ApiResponse::ok(listing))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<Created<group::Model>> {
    let group = state.group_service.create(&user.id, input).await?;
    Ok(Created(group))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<GroupDetail>> {
    let detail = state.group_service.detail(&user.id, &id).await?;
    Ok(ApiResponse::ok(detail))
}

async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EditGroupInput>,
) -> AppResult<ApiResponse<group::Model>> {
    let group = state.group_service.edit(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(group))
}

async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.group_service.delete(&user.id, &id).await?;
    Ok(no_content())
}

/// Join a group. Public groups approve immediately.
async fn join(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<group_membership::Model>> {
    let membership = state.group_service.join(&user.id, &id).await?;
    Ok(ApiResponse::ok(membership))
}

async fn leave(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.group_service.leave(&user.id, &id).await?;
    Ok(no_content())
}

async fn members(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<MemberView>>> {
    let members = state.group_service.members(&user.id, &id).await?;
    Ok(ApiResponse::ok(members))
}

/// Pending join requests.
async fn requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<MemberView>>> {
    let pending = state.group_service.pending_members(&user.id, &id).await?;
    Ok(ApiResponse::ok(pending))
}

async fn approve(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<group_membership::Model>> {
    let membership = state
        .group_service
        .approve_member(&user.id, &id, &user_id)
        .await?;
    Ok(ApiResponse::ok(membership))
}

async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<group_membership::Model>> {
    let membership = state
        .group_service
        .reject_member(&user.id, &id, &user_id)
        .await?;
    Ok(ApiResponse::ok(membership))
}

async fn remove_member(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state
        .group_service
        .remove_member(&user.id, &id, &user_id)
        .await?;
    Ok(no_content())
}

async fn make_moderator(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<group_membership::Model>> {
    let membership = state
        .group_service
        .make_moderator(&user.id, &id, &user_id)
        .await?;
    Ok(ApiResponse::ok(membership))
}

/// Group post cursor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsQuery {
    pub until_id: Option<String>,
}

/// Older posts of a group.
async fn list_posts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PostsQuery>,
) -> AppResult<ApiResponse<Vec<GroupPostView>>> {
    let posts = state
        .group_service
        .posts(&user.id, &id, query.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(posts))
}

async fn create_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CreateGroupPostInput>,
) -> AppResult<Created<group_post::Model>> {
    let post = state
        .group_post_service
        .create_post(&user.id, &id, input)
        .await?;
    Ok(Created(post))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(edit).delete(remove))
        .route("/{id}/join", post(join))
        .route("/{id}/leave", post(leave))
        .route("/{id}/members", get(members))
        .route("/{id}/members/{user_id}", delete(remove_member))
        .route("/{id}/requests", get(requests))
        .route("/{id}/requests/{user_id}/approve", post(approve))
        .route("/{id}/requests/{user_id}/reject", post(reject))
        .route("/{id}/moderators/{user_id}", post(make_moderator))
        .route("/{id}/posts", get(list_posts).post(create_post))
}
