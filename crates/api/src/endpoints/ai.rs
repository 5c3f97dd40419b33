//! AI helper endpoints.
//!
//! Unlike the rest of the API these answer `{"success": true, ...}` and report
//! failures as `{"success": false, "error": "..."}` with status 400 or 500.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use universe_common::AppError;
use universe_core::{
    AiService, Sentiment, Toxicity,
    ai::{DEFAULT_SUMMARY_LENGTH, summarize},
};

use crate::{extractors::AuthUser, middleware::AppState};

/// Failure body for the AI helpers.
#[derive(Debug)]
pub struct AiFailure(AppError);

impl From<AppError> for AiFailure {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for AiFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::BadRequest(format!("Invalid JSON: {}", rejection.body_text())))
    }
}

impl IntoResponse for AiFailure {
    fn into_response(self) -> Response {
        let status = if self.0.status_code().is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!(error = %self.0, "AI helper failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let message = match &self.0 {
            AppError::BadRequest(message) => message.clone(),
            other => other.to_string(),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

type AiResult<T> = Result<Json<T>, AiFailure>;

fn service(state: &AppState) -> Result<&AiService, AiFailure> {
    state
        .ai_service
        .as_ref()
        .ok_or_else(|| AiFailure(AppError::ExternalService("AI helpers are disabled".to_string())))
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    pub hashtags: Vec<String>,
    pub sentiment: Option<Sentiment>,
    pub toxicity: Toxicity,
}

async fn suggestions(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> AiResult<SuggestionsResponse> {
    let Json(req) = payload?;
    let suggestions = service(&state)?.suggestions(&req.text).await?;
    Ok(Json(SuggestionsResponse {
        success: true,
        hashtags: suggestions.hashtags,
        sentiment: suggestions.sentiment,
        toxicity: suggestions.toxicity,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: String,
    pub target_lang: Option<String>,
}

#[derive(Serialize)]
pub struct TranslateResponse {
    pub success: bool,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
}

async fn translate(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> AiResult<TranslateResponse> {
    let Json(req) = payload?;
    let translation = service(&state)?
        .translate(&req.text, req.target_lang.as_deref())
        .await?;
    Ok(Json(TranslateResponse {
        success: true,
        translated_text: translation.translated_text,
        source_lang: translation.source_lang,
        target_lang: translation.target_lang,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeImageRequest {
    #[serde(default)]
    pub image_url: String,
}

#[derive(Serialize)]
pub struct AnalyzeImageResponse {
    pub success: bool,
    pub caption: Option<String>,
}

async fn analyze_image(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeImageRequest>, JsonRejection>,
) -> AiResult<AnalyzeImageResponse> {
    let Json(req) = payload?;
    let image_url = req.image_url.trim();
    if image_url.is_empty() {
        return Err(AppError::BadRequest("No image provided".to_string()).into());
    }
    let caption = service(&state)?.analyze_image(image_url).await;
    Ok(Json(AnalyzeImageResponse {
        success: true,
        caption,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: String,
    pub max_length: Option<usize>,
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub success: bool,
    pub summary: String,
}

async fn summarize_text(
    AuthUser(_user): AuthUser,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> AiResult<SummarizeResponse> {
    let Json(req) = payload?;
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("No text provided".to_string()).into());
    }
    let summary = summarize(&req.text, req.max_length.unwrap_or(DEFAULT_SUMMARY_LENGTH));
    Ok(Json(SummarizeResponse {
        success: true,
        summary,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suggestions", post(suggestions))
        .route("/translate", post(translate))
        .route("/analyze-image", post(analyze_image))
        .route("/summarize", post(summarize_text))
}
