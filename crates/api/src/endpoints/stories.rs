//! Story endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use universe_common::AppResult;
use universe_core::{CreateStoryInput, StoryUser, StoryViewing};
use universe_db::entities::story;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created, no_content},
};

/// Story ring: the viewer and followees with active stories.
async fn feed(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<StoryUser>>> {
    let users = state.story_service.stories_feed(&user.id).await?;
    Ok(ApiResponse::ok(users))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateStoryInput>,
) -> AppResult<Created<story::Model>> {
    let story = state.story_service.create(&user.id, input).await?;
    Ok(Created(story))
}

/// All of the caller's stories, expired ones included.
async fn archive(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<story::Model>>> {
    let stories = state.story_service.archive(&user.id).await?;
    Ok(ApiResponse::ok(stories))
}

async fn by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<story::Model>>> {
    let stories = state.story_service.user_stories(&username).await?;
    Ok(ApiResponse::ok(stories))
}

async fn view(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StoryViewing>> {
    let viewing = state.story_service.view_story(&user.id, &id).await?;
    Ok(ApiResponse::ok(viewing))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.story_service.delete_story(&user.id, &id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed).post(create))
        .route("/archive", get(archive))
        .route("/user/{username}", get(by_user))
        .route("/{id}", get(view).delete(delete))
}
