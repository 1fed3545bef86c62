use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use tracing::{info, warn};

use crate::db::{chat, users::CurrentUser};
use crate::error::{AppError, AppResult};
use crate::models::{ChatFailure, ChatHistoryEntry, ChatReply, ChatRequest, HistoryQuery};
use crate::services::chatbot;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

fn chat_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ChatFailure::new(message))).into_response()
}

/// ANY /chat/message
///
/// Speaks its own small JSON contract: `{"response", "timestamp"}` on
/// success and `{"error"}` otherwise.
pub async fn chat_message(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return chat_error(StatusCode::METHOD_NOT_ALLOWED, "Only POST requests are allowed");
    }

    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "Rejected malformed chat payload");
            return chat_error(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    let message = request.message.unwrap_or_default().trim().to_string();
    if message.is_empty() {
        return chat_error(StatusCode::BAD_REQUEST, "Message is required");
    }

    let reply = chatbot::chatbot_reply(state.inference.as_ref(), &message).await;

    match chat::insert(&state.db, &user.id, &message, &reply).await {
        Ok(record) => {
            info!(
                user_id = %user.id,
                chat_id = record.id,
                message_chars = message.chars().count(),
                "Chat exchange stored"
            );
            Json(ChatReply {
                timestamp: record.formatted_timestamp(),
                response: record.response,
            })
            .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// GET /chat/history
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<ChatHistoryEntry>>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
        return Err(AppError::validation(format!(
            "limit must be between 1 and {}",
            MAX_HISTORY_LIMIT
        )));
    }

    let history = chat::recent_for_user(&state.db, &user.id, limit)
        .await?
        .into_iter()
        .map(|m| ChatHistoryEntry {
            timestamp: m.formatted_timestamp(),
            message: m.message,
            response: m.response,
        })
        .collect();

    Ok(Json(history))
}
