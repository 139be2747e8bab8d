// src/clients/generation.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::{
    error::AppError,
    models::{
        message::{ChatRole, ChatTurn},
        question::{Question, validate_batch},
    },
};

/// Structured-generation collaborator: turns a subject/difficulty/count into
/// a schema-conformant question batch, relays chat transcripts, and
/// synthesizes speech. One external service behind one seam, so tests can
/// substitute a stub.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate_questions(
        &self,
        subject: &str,
        difficulty: &str,
        count: u32,
    ) -> Result<Vec<Question>, AppError>;

    async fn chat_reply(&self, transcript: &[ChatTurn]) -> Result<String, AppError>;

    async fn synthesize_speech(&self, input: &str, voice: &str) -> Result<Vec<u8>, AppError>;
}

/// OpenAI-compatible chat-completions client. The base URL is configurable
/// so a proxy deployment works unchanged.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }

    /// Posts a chat-completions payload and returns the first choice's
    /// message content as a string.
    async fn chat_completion(&self, payload: JsonValue) -> Result<String, AppError> {
        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await
            .map_err(|e| AppError::GenerationError(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::GenerationError(format!(
                "Model API error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res
            .json()
            .await
            .map_err(|e| AppError::GenerationError(e.to_string()))?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::GenerationError("Invalid model response format".to_string()))
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn generate_questions(
        &self,
        subject: &str,
        difficulty: &str,
        count: u32,
    ) -> Result<Vec<Question>, AppError> {
        let prompt = format!(
            "Generate {count} unique multiple-choice quiz questions about {subject} \
             at {difficulty} difficulty. No two questions may repeat or rephrase \
             each other. Return a JSON object with a 'questions' array of exactly \
             {count} items, each shaped as: {{\"question\": string, \"options\": \
             [4 strings: 3 incorrect distractors and the correct answer], \
             \"answer\": string equal to exactly one option, \"explanation\": string}}."
        );

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.8
        });

        let content = self.chat_completion(payload).await?;
        parse_question_batch(&content, count as usize)
    }

    async fn chat_reply(&self, transcript: &[ChatTurn]) -> Result<String, AppError> {
        let messages: Vec<JsonValue> = transcript
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": match turn.role {
                        ChatRole::User => "user",
                        ChatRole::Assistant => "assistant",
                    },
                    "content": turn.content,
                })
            })
            .collect();

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": messages,
        });

        self.chat_completion(payload).await
    }

    async fn synthesize_speech(&self, input: &str, voice: &str) -> Result<Vec<u8>, AppError> {
        let payload = serde_json::json!({
            "model": "tts-1",
            "input": input,
            "voice": voice,
        });

        let res = self
            .http
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await
            .map_err(|e| AppError::GenerationError(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::GenerationError(format!(
                "Speech API error {}: {}",
                status, text
            )));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| AppError::GenerationError(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Parses the model's JSON content into a validated question batch. Accepts
/// either a top-level array or a wrapping object with a 'questions' key,
/// since json_object mode forces the latter.
fn parse_question_batch(content: &str, count: usize) -> Result<Vec<Question>, AppError> {
    let raw: JsonValue = serde_json::from_str(content)
        .map_err(|e| AppError::GenerationError(format!("Model output is not JSON: {}", e)))?;

    let items = if raw.is_array() {
        raw
    } else if let Some(arr) = raw.get("questions").cloned() {
        arr
    } else {
        return Err(AppError::GenerationError(
            "Model output has no 'questions' array".to_string(),
        ));
    };

    let questions: Vec<Question> = serde_json::from_value(items)
        .map_err(|e| AppError::GenerationError(format!("Malformed question object: {}", e)))?;

    validate_batch(&questions, count)?;
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_batch() {
        let content = r#"{"questions": [
            {"question": "2 + 2?", "options": ["3", "4", "5", "6"],
             "answer": "4", "explanation": "Basic addition."}
        ]}"#;
        let batch = parse_question_batch(content, 1).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].answer, "4");
    }

    #[test]
    fn parses_bare_array() {
        let content = r#"[
            {"question": "2 + 2?", "options": ["3", "4", "5", "6"],
             "answer": "4", "explanation": "Basic addition."}
        ]"#;
        assert!(parse_question_batch(content, 1).is_ok());
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(parse_question_batch("Sure! Here are your questions:", 1).is_err());
    }

    #[test]
    fn rejects_count_mismatch() {
        let content = r#"{"questions": [
            {"question": "2 + 2?", "options": ["3", "4", "5", "6"],
             "answer": "4", "explanation": "Basic addition."}
        ]}"#;
        assert!(parse_question_batch(content, 2).is_err());
    }
}
