//! Post, like and comment endpoints.
//!
//! `like` and `comment` answer with bare snake_case bodies rather than the
//! `data` envelope; clients update counters in place from them.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use universe_common::AppResult;
use universe_core::{CommentAdded, CommentInput, CommentView, CreatePostInput, LikeToggle, PostView};
use universe_db::entities::post;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Created, no_content},
};

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<Created<post::Model>> {
    let post = state.post_service.create(&user.id, input).await?;
    Ok(Created(post))
}

async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostView>> {
    let post = state.post_service.get(&id, viewer.id()).await?;
    Ok(ApiResponse::ok(post))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.post_service.delete(&user.id, &id).await?;
    Ok(no_content())
}

async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LikeToggle>> {
    let toggled = state.post_service.toggle_like(&user.id, &id).await?;
    Ok(Json(toggled))
}

async fn comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CommentInput>,
) -> AppResult<Json<CommentAdded>> {
    let added = state.post_service.add_comment(&user, &id, input).await?;
    Ok(Json(added))
}

async fn comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentView>>> {
    let comments = state.post_service.list_comments(&id).await?;
    Ok(ApiResponse::ok(comments))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}", get(show).delete(delete))
        .route("/{id}/like", post(like))
        .route("/{id}/comment", post(comment))
        .route("/{id}/comments", get(comments))
}
