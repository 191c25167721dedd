use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::answer::{answer_question, AnswerError, ChatAnswer};
use crate::store::ConversationId;
use crate::GleanError;

use super::models::{ChatRequest, ErrorResponse, LoadChatQuery, LoadChatResponse, SaveChatResponse};
use super::AppState;

/// An error returned to HTTP clients as `{ "error": "..." }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<GleanError> for ApiError {
    fn from(error: GleanError) -> Self {
        if error.is_invalid_input() {
            return Self::new(StatusCode::BAD_REQUEST, error.to_string());
        }
        tracing::error!("Crawl failed: {}", error);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    }
}

impl From<AnswerError> for ApiError {
    fn from(error: AnswerError) -> Self {
        match error {
            AnswerError::EmptyQuestion => Self::new(StatusCode::BAD_REQUEST, error.to_string()),
            AnswerError::NoContent => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
            }
            AnswerError::Http(_) | AnswerError::Api { .. } => {
                tracing::error!("Completion service failed: {}", error);
                Self::new(StatusCode::BAD_GATEWAY, "Answer service unavailable.")
            }
            AnswerError::MissingApiKey(_) | AnswerError::InvalidBase(_) => {
                tracing::error!("Answer service misconfigured: {}", error);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        }
    }
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatAnswer>, ApiError> {
    if request.urls.is_empty() || request.question.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Missing URLs or question.",
        ));
    }

    let results = state
        .crawler
        .crawl_many(
            &request.urls,
            state.max_depth,
            state.max_pages,
            CancellationToken::new(),
        )
        .await?;

    let answer = answer_question(&*state.answerer, &request.question, &results).await?;
    Ok(Json(answer))
}

pub async fn save_chat_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Json<SaveChatResponse> {
    let id = state.store.put(payload);
    tracing::debug!("Saved conversation {}", id);
    Json(SaveChatResponse { id: id.to_string() })
}

pub async fn load_chat_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoadChatQuery>,
) -> Result<Json<LoadChatResponse>, ApiError> {
    let id = ConversationId::from(query.id.as_deref().unwrap_or_default());

    state
        .store
        .get(&id)
        .map(|messages| Json(LoadChatResponse { messages }))
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Conversation not found."))
}
