//! Direct message endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use universe_common::AppResult;
use universe_core::{ConversationSummary, SendMessageInput, Thread};
use universe_db::entities::message;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created},
};

/// Inbox: one entry per conversation partner.
async fn conversations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ConversationSummary>>> {
    let conversations = state.messaging_service.conversations(&user.id).await?;
    Ok(ApiResponse::ok(conversations))
}

/// Open a thread. Marks the partner's messages read.
async fn thread(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Thread>> {
    let thread = state
        .messaging_service
        .open_thread(&user.id, &username)
        .await?;
    Ok(ApiResponse::ok(thread))
}

async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<Created<message::Model>> {
    let message = state
        .messaging_service
        .send(&user.id, &username, input)
        .await?;
    Ok(Created(message))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(conversations))
        .route("/{username}", get(thread).post(send))
}
