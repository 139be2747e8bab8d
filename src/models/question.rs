// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// A single generated quiz question. Ephemeral: produced fresh per request
/// and returned to the client, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,

    /// Exactly four options: three distractors plus the correct answer.
    pub options: Vec<String>,

    /// Must equal exactly one entry of `options`.
    pub answer: String,

    pub explanation: String,
}

/// DTO for starting a quiz session.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartQuestionsRequest {
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(length(min = 1, max = 50))]
    pub difficulty: String,
    /// Bounded to keep generation cost predictable.
    #[validate(range(min = 1, max = 20))]
    pub num_of_question: Option<u32>,
}

pub const DEFAULT_QUESTION_COUNT: u32 = 5;

/// DTO for the start response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuestionsResponse {
    pub data: Vec<Question>,
    pub question_id: i64,
}

/// Checks a generated batch against the output schema the generator was asked
/// for: exactly `count` questions, four options each, the answer present in
/// the options exactly once, and no duplicate options.
pub fn validate_batch(questions: &[Question], count: usize) -> Result<(), AppError> {
    if questions.len() != count {
        return Err(AppError::GenerationError(format!(
            "Expected {} questions, model returned {}",
            count,
            questions.len()
        )));
    }

    for (idx, q) in questions.iter().enumerate() {
        if q.options.len() != 4 {
            return Err(AppError::GenerationError(format!(
                "Question {} has {} options instead of 4",
                idx + 1,
                q.options.len()
            )));
        }

        let matches = q.options.iter().filter(|o| **o == q.answer).count();
        if matches != 1 {
            return Err(AppError::GenerationError(format!(
                "Question {} answer appears {} times in the options",
                idx + 1,
                matches
            )));
        }

        for (i, opt) in q.options.iter().enumerate() {
            if q.options[..i].contains(opt) {
                return Err(AppError::GenerationError(format!(
                    "Question {} has duplicate option '{}'",
                    idx + 1,
                    opt
                )));
            }
        }
    }

    Ok(())
}
