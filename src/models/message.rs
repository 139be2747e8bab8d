// src/models/message.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::user::UserProfile;

/// Represents the 'messages' table in the database.
/// Stores the chat-tutoring transcript, one row per turn.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub user_id: String,
    /// 'USER' or 'AI'.
    pub role: String,
    pub content: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One turn of the transcript as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub content: String,
    pub role: ChatRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// DTO for listing the chat history alongside the requester's profile.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub user: UserProfile,
    pub messages: Vec<Message>,
}

/// DTO for the relay response.
#[derive(Debug, Serialize)]
pub struct ChatReplyResponse {
    pub message: String,
}
