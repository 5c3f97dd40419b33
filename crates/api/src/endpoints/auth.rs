//! Authentication endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::{get, post}};
use serde::Serialize;
use universe_common::{AppError, AppResult};
use universe_core::{RegisterInput, SignInInput};
use universe_db::entities::user;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created, no_content},
};

/// A signed-in user and their bearer token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: user::Model,
    pub token: String,
}

impl TryFrom<user::Model> for SessionResponse {
    type Error = AppError;

    fn try_from(user: user::Model) -> AppResult<Self> {
        let token = user
            .token
            .clone()
            .ok_or_else(|| AppError::Internal("Session token missing".to_string()))?;
        Ok(Self { user, token })
    }
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Created<SessionResponse>> {
    let user = state.account_service.register(input).await?;
    Ok(Created(user.try_into()?))
}

/// Sign in with username and password.
async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state.account_service.sign_in(input).await?;
    Ok(ApiResponse::ok(user.try_into()?))
}

/// Sign out, invalidating the current token.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    state.account_service.sign_out(&user.id).await?;
    Ok(no_content())
}

/// The signed-in user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<user::Model> {
    ApiResponse::ok(user)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/me", get(me))
}
