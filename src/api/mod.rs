//! HTTP layer: chat over crawled pages and shared conversations

use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::answer::AnswerService;
use crate::crawler::Crawler;
use crate::store::ConversationStore;

pub mod handlers;
pub mod models;

/// Shared state behind every route
pub struct AppState {
    pub crawler: Arc<Crawler>,
    pub answerer: Arc<dyn AnswerService>,
    pub store: Arc<dyn ConversationStore>,
    /// Depth limit applied to each seed of a chat request
    pub max_depth: u32,
    /// Page budget applied to each seed of a chat request
    pub max_pages: usize,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(handlers::chat_handler))
        .route(
            "/api/save_chat",
            post(handlers::save_chat_handler).get(handlers::load_chat_handler),
        )
        .with_state(state)
        .layer(cors)
}
