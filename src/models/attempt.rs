// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quiz_attempts' table in the database.
///
/// One row per (user_id, subject, difficulty), enforced by a unique
/// constraint. The row id doubles as the session id returned by the start
/// endpoint. `duration_ms` stays NULL until the first completed attempt is
/// recorded; after that, points never decrease and duration only decreases
/// at equal points.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: String,
    pub subject: String,
    pub difficulty: String,
    pub points: i32,
    #[serde(rename = "duration")]
    pub duration_ms: Option<i64>,
    pub start_at: Option<chrono::DateTime<chrono::Utc>>,
    pub end_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Decides whether a newly completed attempt replaces the stored best.
///
/// Points win outright; at equal points a strictly faster completion wins,
/// but only when a prior duration exists. A record with no duration has
/// never had a completed attempt, so anything completes it.
pub fn supersedes(
    new_points: i32,
    new_duration_ms: i64,
    stored_points: i32,
    stored_duration_ms: Option<i64>,
) -> bool {
    match stored_duration_ms {
        None => true,
        Some(stored_ms) => {
            new_points > stored_points
                || (new_points == stored_points && new_duration_ms < stored_ms)
        }
    }
}

/// DTO for closing a quiz session.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndQuestionsRequest {
    pub question_id: i64,
    #[validate(range(min = 0))]
    pub points: i32,
    /// Epoch milliseconds.
    pub start_date: i64,
    /// Epoch milliseconds; must be >= start_date.
    pub end_date: i64,
}

/// DTO for the end response. The caller always learns their own elapsed
/// time, whether or not the attempt became the stored best.
#[derive(Debug, Serialize)]
pub struct EndQuestionsResponse {
    /// Seconds.
    pub duration: f64,
}

/// One ranked leaderboard row. `user_id` is masked to NULL for every row
/// that does not belong to the requesting user.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub points: i32,
    #[serde(rename = "duration")]
    pub duration_ms: Option<i64>,
    pub user_id: Option<String>,
}

/// DTO for the leaderboard response. `user` is the requester's own record
/// for the subject/difficulty, independent of whether it ranked.
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub data: Vec<LeaderboardEntry>,
    pub user: Option<QuizAttempt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_completed_attempt_always_recorded() {
        assert!(supersedes(0, 60_000, 0, None));
        assert!(supersedes(3, 999_999, 0, None));
    }

    #[test]
    fn higher_points_win_regardless_of_duration() {
        assert!(supersedes(6, 999_999, 5, Some(10_000)));
    }

    #[test]
    fn equal_points_broken_by_strictly_faster_time() {
        assert!(supersedes(5, 9_000, 5, Some(10_000)));
        assert!(!supersedes(5, 10_000, 5, Some(10_000)));
        assert!(!supersedes(5, 11_000, 5, Some(10_000)));
    }

    #[test]
    fn lower_points_never_win() {
        assert!(!supersedes(4, 1, 5, Some(10_000)));
    }
}
