//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its input via axum extractors, calls into the
//! chat engine, and returns JSON responses.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marquee_core::{Citation, ImageData, Message, RelatedQuery};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request and response types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Continue an existing conversation, or omit to start a new one.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_queries: Option<Vec<RelatedQuery>>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /chat - run one chat turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let turn = state
        .engine
        .handle_message(&request.message, request.conversation_id)
        .await?;

    let related_queries = if turn.related_queries.is_empty() {
        None
    } else {
        Some(turn.related_queries)
    };

    Ok(Json(ChatResponse {
        response: turn.response,
        conversation_id: turn.conversation_id,
        timestamp: Utc::now(),
        citations: turn.citations,
        images: turn.images,
        related_queries,
    }))
}

/// GET /conversation/{id} - full message history of one conversation.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    match state.engine.history(&conversation_id)? {
        Some(messages) => Ok(Json(messages)),
        None => Err(ApiError::NotFound("Conversation not found".to_string())),
    }
}

/// GET /health - liveness, version, and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
