// src/handlers/analytics.rs

use std::collections::HashSet;

use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        analytics::{AnalyticsOverview, RecentActivity},
        lesson::{TOTAL_LESSONS, parse_lesson_day},
        progress::ProgressRecord,
    },
    response::ApiResponse,
    stats,
    utils::jwt::Claims,
};

/// Computes the analytics overview for a user.
///
/// Reads the user's progress records and quiz submission history, then
/// derives everything else in `stats`. Nothing here is persisted; a store
/// read failure surfaces as a plain 500.
pub async fn get_overview(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if claims.user_id()? != user_id {
        return Err(AppError::Forbidden(
            "You may only view your own analytics".to_string(),
        ));
    }

    let records = sqlx::query_as::<_, ProgressRecord>(
        "SELECT * FROM progress_records WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let submission_scores: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT total_score, max_score FROM quiz_submissions WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let completed_lessons = records.iter().filter(|r| r.completed).count() as u32;

    let completed_days: Vec<u32> = records
        .iter()
        .filter(|r| r.completed)
        .filter_map(|r| parse_lesson_day(&r.lesson_id))
        .collect();

    let active_days: HashSet<NaiveDate> = records
        .iter()
        .map(|r| r.last_accessed_at.date_naive())
        .collect();

    let mut by_recency: Vec<&ProgressRecord> = records.iter().collect();
    by_recency.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));
    let recent_activity: Vec<RecentActivity> = by_recency
        .into_iter()
        .take(5)
        .map(|r| RecentActivity {
            lesson_id: r.lesson_id.clone(),
            last_accessed: r.last_accessed_at,
            completed: r.completed,
        })
        .collect();

    let overview = AnalyticsOverview {
        total_lessons: TOTAL_LESSONS,
        completed_lessons,
        completion_percentage: stats::completion_percentage(completed_lessons),
        average_quiz_score: stats::average_quiz_score(&submission_scores),
        current_streak: stats::current_streak(Utc::now().date_naive(), &active_days),
        recent_activity,
        progress_by_category: stats::category_progress(&completed_days),
    };

    Ok(ApiResponse::ok(overview))
}
