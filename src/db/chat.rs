use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::error::AppResult;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: String,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Appends one exchange to the chat log.
pub async fn insert(
    pool: &SqlitePool,
    user_id: &str,
    message: &str,
    response: &str,
) -> AppResult<ChatMessage> {
    let timestamp = Utc::now();
    let result = sqlx::query(
        "INSERT INTO chat_messages (user_id, message, response, timestamp) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(message)
    .bind(response)
    .bind(timestamp)
    .execute(pool)
    .await?;

    Ok(ChatMessage {
        id: result.last_insert_rowid(),
        user_id: user_id.to_string(),
        message: message.to_string(),
        response: response.to_string(),
        timestamp,
    })
}

/// The user's most recent `limit` exchanges, oldest first.
pub async fn recent_for_user(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> AppResult<Vec<ChatMessage>> {
    let mut messages = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, user_id, message, response, timestamp
        FROM chat_messages
        WHERE user_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    messages.reverse();
    Ok(messages)
}
