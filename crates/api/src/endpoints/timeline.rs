//! Home timeline endpoint.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use universe_common::AppResult;
use universe_core::Timeline;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Timeline paging params.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
    pub since_id: Option<String>,
}

const fn default_limit() -> u64 {
    20
}

/// Posts, story ring and suggestions for the signed-in user.
async fn home(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> AppResult<ApiResponse<Timeline>> {
    let timeline = state
        .timeline_service
        .feed(
            &user.id,
            query.limit,
            query.until_id.as_deref(),
            query.since_id.as_deref(),
        )
        .await?;
    Ok(ApiResponse::ok(timeline))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}
