use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::{timeout_at, Instant};
use tracing::info;
use uuid::Uuid;

use crate::chat::assembler::ContextAssembler;
use crate::chat::stream::{annotate_stream, collect_turn};
use crate::errors::AppError;
use crate::llm_client::{EventStream, GenerationOptions};
use crate::markup::{extract_recommendations, normalize_message, RecommendationTag};
use crate::models::chat::{FilterState, Message, Role};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Full conversation so far, oldest first, ending with the new user message.
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub filters: FilterState,
    #[serde(default)]
    pub resume_text: Option<String>,
}

impl ChatRequest {
    fn validate(&self) -> Result<(), AppError> {
        let Some(last) = self.messages.last() else {
            return Err(AppError::Validation("messages must not be empty".to_string()));
        };
        if last.role != Role::User {
            return Err(AppError::Validation(
                "the last message must come from the user".to_string(),
            ));
        }
        if self.messages.iter().any(|m| m.role == Role::System) {
            return Err(AppError::Validation(
                "system messages are not accepted from clients".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompleteResponse {
    pub content: String,
    pub recommendations: Vec<RecommendationTag>,
}

/// A turn whose generation has produced (or cleanly ended before) its first event.
struct PreparedTurn {
    turn_id: Uuid,
    deadline: Instant,
    events: EventStream,
}

/// Everything that can fail with an HTTP status happens here, before the
/// first response byte: validation, context assembly, opening the generation
/// and waiting for its first event.
async fn prepare_turn(state: &AppState, request: &ChatRequest) -> Result<PreparedTurn, AppError> {
    let deadline = Instant::now() + state.config.turn_timeout;
    request.validate()?;

    let turn_id = Uuid::new_v4();
    let assembler = ContextAssembler::new(state.jobs.as_ref(), state.config.resume_max_chars);
    let context = assembler
        .assemble(
            &request.messages,
            &request.filters,
            request.resume_text.as_deref(),
        )
        .await?;

    info!(
        turn_id = %turn_id,
        messages = request.messages.len(),
        jobs = context.job_count,
        resume_truncated = ?context.resume_truncated,
        "Chat turn started"
    );

    let options = GenerationOptions {
        model: state.config.generation_model.clone(),
        reasoning_effort: state.config.reasoning_effort.clone(),
        ..GenerationOptions::default()
    };

    let mut events = match timeout_at(
        deadline,
        state.generator.generate(&context.messages, &options),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            return Err(AppError::Upstream(
                "generation did not start before the turn deadline".to_string(),
            ))
        }
    };

    let first = match timeout_at(deadline, events.next()).await {
        Ok(Some(result)) => Some(result?),
        Ok(None) => None,
        Err(_) => {
            return Err(AppError::Upstream(
                "no output before the turn deadline".to_string(),
            ))
        }
    };

    let events: EventStream = match first {
        Some(event) => Box::pin(stream::iter([Ok(event)]).chain(events)),
        None => events,
    };

    Ok(PreparedTurn {
        turn_id,
        deadline,
        events,
    })
}

/// POST /api/v1/chat
///
/// Streams the annotated reply as `text/plain`. Failures after the first
/// byte end the stream early with every thought block closed.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let turn = prepare_turn(&state, &request).await?;
    let body = annotate_stream(turn.events, turn.deadline, turn.turn_id)
        .map(Ok::<_, Infallible>);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

/// POST /api/v1/chat/complete
///
/// Same turn, run to completion and normalized. Returns the final message
/// text plus the recommendation tags it carries.
pub async fn handle_chat_complete(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatCompleteResponse>, AppError> {
    let turn = prepare_turn(&state, &request).await?;
    let raw = collect_turn(turn.events, turn.deadline, turn.turn_id).await;

    let content = normalize_message(&raw);
    let recommendations = extract_recommendations(&content);
    info!(
        turn_id = %turn.turn_id,
        recommendations = recommendations.len(),
        "Chat turn normalized"
    );

    Ok(Json(ChatCompleteResponse {
        content,
        recommendations,
    }))
}
