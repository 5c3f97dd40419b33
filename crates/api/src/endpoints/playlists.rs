//! Playlist endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use universe_common::AppResult;
use universe_core::{
    CreatePlaylistInput, EditPlaylistInput, PlaylistAddResult, PlaylistDetail, PlaylistOverview,
};
use universe_db::entities::playlist;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created, no_content},
};

#[derive(Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

async fn overview(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PlaylistOverview>> {
    let overview = state.playlist_service.my_playlists(&user.id).await?;
    Ok(ApiResponse::ok(overview))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePlaylistInput>,
) -> AppResult<Created<playlist::Model>> {
    let playlist = state.playlist_service.create(&user.id, input).await?;
    Ok(Created(playlist))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PlaylistDetail>> {
    let detail = state.playlist_service.detail(&user.id, &id).await?;
    Ok(ApiResponse::ok(detail))
}

async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EditPlaylistInput>,
) -> AppResult<ApiResponse<playlist::Model>> {
    let playlist = state.playlist_service.edit(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(playlist))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.playlist_service.delete(&user.id, &id).await?;
    Ok(no_content())
}

async fn add_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, video_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<PlaylistAddResult>> {
    let result = state
        .playlist_service
        .add_video(&user.id, &id, &video_id)
        .await?;
    Ok(ApiResponse::ok(result))
}

async fn remove_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, video_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<RemovedResponse>> {
    let removed = state
        .playlist_service
        .remove_video(&user.id, &id, &video_id)
        .await?;
    Ok(ApiResponse::ok(RemovedResponse { removed }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overview).post(create))
        .route("/{id}", get(show).patch(edit).delete(delete))
        .route("/{id}/videos/{video_id}", post(add_video).delete(remove_video))
}
