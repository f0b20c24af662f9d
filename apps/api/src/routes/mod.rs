pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::jobs::handlers as jobs;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat API
        .route("/api/v1/chat", post(chat::handle_chat))
        .route("/api/v1/chat/complete", post(chat::handle_chat_complete))
        // Supporting endpoints
        .route("/api/v1/jobs/filters", get(jobs::handle_filter_options))
        .route("/api/v1/resume/extract", post(resume::handle_extract))
        .with_state(state)
}
