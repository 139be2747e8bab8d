// src/handlers/chat.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    clients::{generation::GenerationClient, identity::IdentityProvider},
    error::AppError,
    models::message::{ChatReplyResponse, ChatRole, ChatTurn, Message, MessagesResponse},
    utils::auth::AuthUser,
};

/// Returns the requester's profile and their full chat history, oldest
/// first.
pub async fn list_messages(
    State(pool): State<PgPool>,
    State(identity): State<Arc<dyn IdentityProvider>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let profile = identity.fetch_profile(&user.id).await?;

    let messages: Vec<Message> = sqlx::query_as(
        "SELECT id, user_id, role, content, created_at FROM messages \
         WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(&user.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(MessagesResponse {
        user: profile,
        messages,
    }))
}

/// Relays the transcript to the chat model and stores the exchange.
///
/// The final user turn and the model's reply are persisted as one
/// USER/AI pair; earlier turns are context only and are assumed to be
/// stored already.
pub async fn create_message(
    State(pool): State<PgPool>,
    State(model): State<Arc<dyn GenerationClient>>,
    Extension(user): Extension<AuthUser>,
    Json(transcript): Json<Vec<ChatTurn>>,
) -> Result<impl IntoResponse, AppError> {
    let last_user_turn = transcript
        .iter()
        .rev()
        .find(|turn| turn.role == ChatRole::User)
        .cloned()
        .ok_or_else(|| AppError::ValidationError("Transcript has no user message".to_string()))?;

    let reply = model.chat_reply(&transcript).await?;

    sqlx::query(
        r#"
        INSERT INTO messages (user_id, role, content)
        VALUES ($1, 'USER', $2), ($1, 'AI', $3)
        "#,
    )
    .bind(&user.id)
    .bind(&last_user_turn.content)
    .bind(&reply)
    .execute(&pool)
    .await?;

    Ok(Json(ChatReplyResponse { message: reply }))
}
