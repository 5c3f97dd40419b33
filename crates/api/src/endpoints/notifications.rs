//! Notification endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use universe_common::AppResult;
use universe_core::NotificationView;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Notification page cursor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub until_id: Option<String>,
}

/// List a page of notifications. The listed unread ones are marked read as a side effect.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<NotificationView>>> {
    let notifications = state
        .notification_service
        .list_and_mark_read(&user.id, query.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(notifications))
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.notification_service.unread_count(&user.id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
}
