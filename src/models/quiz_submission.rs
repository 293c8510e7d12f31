// src/models/quiz_submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// One graded answer inside a submission's `answers` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub answer: serde_json::Value,
    pub correct: bool,
    pub points: i64,
}

/// Represents the 'quiz_submissions' table.
///
/// One row per submission event. Rows are append-only history and are never
/// updated; the analytics average is computed across all of them.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: String,
    pub quiz_id: String,
    pub answers: Json<Vec<SubmittedAnswer>>,
    pub total_score: i64,
    pub max_score: i64,
    pub submitted_at: DateTime<Utc>,
}
