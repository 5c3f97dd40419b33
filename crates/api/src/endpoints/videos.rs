//! Video endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use universe_common::AppResult;
use universe_core::{
    EditVideoInput, LikeToggle, UploadVideoInput, VideoCard, VideoCommentInput, VideoCommentView,
    VideoDetail, VideoFeed,
};
use universe_db::entities::video::{self, VideoCategory};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created, no_content},
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

async fn feed(State(state): State<AppState>) -> AppResult<ApiResponse<VideoFeed>> {
    let feed = state.video_service.feed().await?;
    Ok(ApiResponse::ok(feed))
}

async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UploadVideoInput>,
) -> AppResult<Created<video::Model>> {
    let video = state.video_service.upload(&user.id, input).await?;
    Ok(Created(video))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<ApiResponse<Vec<VideoCard>>> {
    let videos = state.video_service.search(&query.q).await?;
    Ok(ApiResponse::ok(videos))
}

async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<VideoCategory>,
) -> AppResult<ApiResponse<Vec<VideoCard>>> {
    let videos = state.video_service.by_category(category).await?;
    Ok(ApiResponse::ok(videos))
}

/// A creator's channel.
async fn by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<video::Model>>> {
    let author = state.directory.resolve(&username).await?;
    let videos = state.video_service.by_author(&author.id).await?;
    Ok(ApiResponse::ok(videos))
}

/// Watch page. Counts a view unless the viewer is the author.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<VideoDetail>> {
    let detail = state.video_service.detail(&user.id, &id).await?;
    Ok(ApiResponse::ok(detail))
}

async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EditVideoInput>,
) -> AppResult<ApiResponse<video::Model>> {
    let video = state.video_service.edit(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(video))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.video_service.delete(&user.id, &id).await?;
    Ok(no_content())
}

async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LikeToggle>> {
    let toggled = state.video_service.toggle_like(&user.id, &id).await?;
    Ok(Json(toggled))
}

async fn comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<VideoCommentInput>,
) -> AppResult<Created<VideoCommentView>> {
    let comment = state.video_service.add_comment(&user.id, &id, input).await?;
    Ok(Created(comment))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed).post(upload))
        .route("/search", get(search))
        .route("/category/{category}", get(by_category))
        .route("/user/{username}", get(by_user))
        .route("/{id}", get(show).patch(edit).delete(delete))
        .route("/{id}/like", post(like))
        .route("/{id}/comments", post(comment))
}
