// src/handlers/speech.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{clients::generation::GenerationClient, error::AppError};

const DEFAULT_VOICE: &str = "alloy";

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub input: String,
    pub voice: Option<String>,
}

/// Synthesizes pronunciation-practice audio for the given text.
/// One-shot relay to the speech collaborator; nothing is stored.
pub async fn synthesize(
    State(model): State<Arc<dyn GenerationClient>>,
    Json(payload): Json<SpeechRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.input.trim().is_empty() {
        return Err(AppError::ValidationError("input must not be empty".to_string()));
    }

    let voice = payload.voice.as_deref().unwrap_or(DEFAULT_VOICE);
    let audio = model.synthesize_speech(&payload.input, voice).await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}
