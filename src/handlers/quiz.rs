// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::TimeZone;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    clients::generation::GenerationClient,
    error::AppError,
    models::{
        attempt::{
            EndQuestionsRequest, EndQuestionsResponse, LeaderboardEntry, LeaderboardResponse,
            QuizAttempt, supersedes,
        },
        question::{DEFAULT_QUESTION_COUNT, StartQuestionsRequest, StartQuestionsResponse},
    },
    utils::auth::AuthUser,
};

const LEADERBOARD_LIMIT: i64 = 10;

const ATTEMPT_COLUMNS: &str =
    "id, user_id, subject, difficulty, points, duration_ms, start_at, end_at, created_at";

/// Starts a quiz session.
///
/// * Generates a fresh question batch from the model.
/// * Gets or creates the attempt record for (user, subject, difficulty);
///   its id is the session id. Repeat starts return the same id and never
///   create a second record.
/// * Performs no scoring.
pub async fn start_questions(
    State(pool): State<PgPool>,
    State(model): State<Arc<dyn GenerationClient>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StartQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }

    let count = payload.num_of_question.unwrap_or(DEFAULT_QUESTION_COUNT);

    let questions = model
        .generate_questions(&payload.subject, &payload.difficulty, count)
        .await?;

    // Insert-or-reuse in two race-safe steps: a missed insert means the row
    // already exists, so the follow-up select always finds it.
    let created: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO quiz_attempts (user_id, subject, difficulty)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, subject, difficulty) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&user.id)
    .bind(&payload.subject)
    .bind(&payload.difficulty)
    .fetch_optional(&pool)
    .await?;

    let question_id = match created {
        Some((id,)) => id,
        None => {
            let (id,): (i64,) = sqlx::query_as(
                "SELECT id FROM quiz_attempts WHERE user_id = $1 AND subject = $2 AND difficulty = $3",
            )
            .bind(&user.id)
            .bind(&payload.subject)
            .bind(&payload.difficulty)
            .fetch_one(&pool)
            .await?;
            id
        }
    };

    Ok(Json(StartQuestionsResponse {
        data: questions,
        question_id,
    }))
}

/// Closes a quiz session and applies the replace-if-better rule.
///
/// The stored record changes only when the new attempt strictly improves on
/// it: more points, or equal points with a strictly faster completion. The
/// read-decide-write runs under a row lock so concurrent closes converge on
/// the best attempt rather than the last write. The response always carries
/// the caller's own elapsed time, updated or not.
pub async fn end_questions(
    State(pool): State<PgPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<EndQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }

    if payload.end_date < payload.start_date {
        return Err(AppError::ValidationError(
            "endDate must not precede startDate".to_string(),
        ));
    }

    let duration_ms = payload.end_date - payload.start_date;

    let start_at = chrono::Utc
        .timestamp_millis_opt(payload.start_date)
        .single()
        .ok_or_else(|| AppError::ValidationError("startDate out of range".to_string()))?;
    let end_at = chrono::Utc
        .timestamp_millis_opt(payload.end_date)
        .single()
        .ok_or_else(|| AppError::ValidationError("endDate out of range".to_string()))?;

    let mut tx = pool.begin().await?;

    // Ownership check doubles as existence check: a session owned by a
    // different user is indistinguishable from a missing one.
    let attempt: Option<QuizAttempt> = sqlx::query_as(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(payload.question_id)
    .bind(&user.id)
    .fetch_optional(&mut *tx)
    .await?;

    let attempt = attempt.ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    if supersedes(payload.points, duration_ms, attempt.points, attempt.duration_ms) {
        sqlx::query(
            r#"
            UPDATE quiz_attempts
            SET points = $2, duration_ms = $3, start_at = $4, end_at = $5
            WHERE id = $1
            "#,
        )
        .bind(attempt.id)
        .bind(payload.points)
        .bind(duration_ms)
        .bind(start_at)
        .bind(end_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(Json(EndQuestionsResponse {
        duration: duration_ms as f64 / 1000.0,
    }))
}

/// Retrieves the top entries for a subject/difficulty pair.
///
/// Ordering mirrors the supersede rule: points descending, ties broken by
/// faster duration. Rows belonging to other users have their id masked out;
/// the requester's own record rides along whether or not it ranked.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    Extension(user): Extension<AuthUser>,
    Path((subject, difficulty)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entries: Vec<LeaderboardEntry> = sqlx::query_as(
        r#"
        SELECT
            points,
            duration_ms,
            CASE WHEN user_id = $3 THEN user_id END AS user_id
        FROM quiz_attempts
        WHERE subject = $1 AND difficulty = $2
        ORDER BY points DESC, duration_ms ASC NULLS LAST
        LIMIT $4
        "#,
    )
    .bind(&subject)
    .bind(&difficulty)
    .bind(&user.id)
    .bind(LEADERBOARD_LIMIT)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let own: Option<QuizAttempt> = sqlx::query_as(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts \
         WHERE user_id = $1 AND subject = $2 AND difficulty = $3"
    ))
    .bind(&user.id)
    .bind(&subject)
    .bind(&difficulty)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(LeaderboardResponse {
        data: entries,
        user: own,
    }))
}
