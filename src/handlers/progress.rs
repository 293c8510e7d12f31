// src/handlers/progress.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        lesson::parse_lesson_day,
        progress::{
            CodeSnapshot, CompleteActivityRequest, ProgressRecord, QuizScore, SaveCodeRequest,
            SubmitQuizRequest, WatchVideoRequest, WatchedVideo, add_completed_activity,
            add_watched_video, merge_quiz_scores, push_code_snapshot,
        },
        quiz_submission::SubmittedAnswer,
    },
    response::ApiResponse,
    utils::jwt::Claims,
};

/// Rejects lesson ids outside day01..day30 before any store access.
fn check_lesson_id(lesson_id: &str) -> Result<(), AppError> {
    parse_lesson_day(lesson_id).map(|_| ()).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid lesson ID format. Expected dayNN between day01 and day30, got '{}'",
            lesson_id
        ))
    })
}

/// Guarantees a progress row exists for the (user, lesson) pair and returns
/// it locked for the current transaction.
///
/// The insert-or-ignore means concurrent first mutations never surface a
/// uniqueness conflict, and `FOR UPDATE` serializes concurrent merges on the
/// same row.
async fn lock_progress_row(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    lesson_id: &str,
) -> Result<ProgressRecord, AppError> {
    sqlx::query(
        r#"
        INSERT INTO progress_records (user_id, lesson_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, lesson_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .execute(&mut **tx)
    .await?;

    let record = sqlx::query_as::<_, ProgressRecord>(
        r#"
        SELECT * FROM progress_records
        WHERE user_id = $1 AND lesson_id = $2
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(record)
}

/// Lists all progress records of a user, sorted by lesson id.
/// Users may only read their own records.
pub async fn get_user_progress(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if claims.user_id()? != user_id {
        return Err(AppError::Forbidden(
            "You may only view your own progress".to_string(),
        ));
    }

    let records = sqlx::query_as::<_, ProgressRecord>(
        "SELECT * FROM progress_records WHERE user_id = $1 ORDER BY lesson_id",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::ok(records))
}

/// Marks an activity as complete. Idempotent: re-completing an activity
/// leaves the set unchanged (but still bumps last_accessed_at).
pub async fn complete_activity(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<String>,
    Json(payload): Json<CompleteActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    check_lesson_id(&lesson_id)?;
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;
    let record = lock_progress_row(&mut tx, user_id, &lesson_id).await?;

    let mut activities = record.completed_activities.0;
    add_completed_activity(&mut activities, &payload.activity_id);

    let updated = sqlx::query_as::<_, ProgressRecord>(
        r#"
        UPDATE progress_records
        SET completed_activities = $1, last_accessed_at = now(), updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(sqlx::types::Json(activities))
    .bind(record.id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::ok(updated))
}

/// Submits quiz answers.
///
/// * Merges the answers into the record's quiz scores (per-question
///   replace-or-append, so resubmitting a question keeps only the latest
///   answer).
/// * Appends one immutable row to quiz_submissions in the same transaction;
///   that history drives the analytics average.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<String>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    check_lesson_id(&lesson_id)?;
    let user_id = claims.user_id()?;

    let quiz_id = payload
        .quiz_id
        .unwrap_or_else(|| format!("{}-quiz", lesson_id));

    let now = Utc::now();
    let mut incoming = Vec::with_capacity(payload.answers.len());
    let mut submitted = Vec::with_capacity(payload.answers.len());
    for answer in payload.answers {
        let points = if answer.correct { 1 } else { 0 };
        submitted.push(SubmittedAnswer {
            question_id: answer.question_id.clone(),
            answer: answer.answer.clone(),
            correct: answer.correct,
            points,
        });
        incoming.push(QuizScore {
            question_id: answer.question_id,
            correct: answer.correct,
            answer: answer.answer,
            timestamp: now,
        });
    }
    let total_score: i64 = submitted.iter().map(|a| a.points).sum();
    let max_score = submitted.len() as i64;

    let mut tx = pool.begin().await?;
    let record = lock_progress_row(&mut tx, user_id, &lesson_id).await?;

    let mut scores = record.quiz_scores.0;
    merge_quiz_scores(&mut scores, incoming);

    let updated = sqlx::query_as::<_, ProgressRecord>(
        r#"
        UPDATE progress_records
        SET quiz_scores = $1, last_accessed_at = now(), updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(sqlx::types::Json(scores))
    .bind(record.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO quiz_submissions (user_id, lesson_id, quiz_id, answers, total_score, max_score)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(&lesson_id)
    .bind(&quiz_id)
    .bind(sqlx::types::Json(&submitted))
    .bind(total_score)
    .bind(max_score)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::ok(updated))
}

/// Saves a code snapshot from one of the lesson's editors.
/// Only the 10 most recent snapshots per lesson are kept.
pub async fn save_code_snapshot(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<String>,
    Json(payload): Json<SaveCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    check_lesson_id(&lesson_id)?;
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;
    let record = lock_progress_row(&mut tx, user_id, &lesson_id).await?;

    let mut snapshots = record.code_snapshots.0;
    push_code_snapshot(
        &mut snapshots,
        CodeSnapshot {
            timestamp: Utc::now(),
            code: payload.code,
            editor_id: payload.editor_id,
        },
    );

    let updated = sqlx::query_as::<_, ProgressRecord>(
        r#"
        UPDATE progress_records
        SET code_snapshots = $1, last_accessed_at = now(), updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(sqlx::types::Json(snapshots))
    .bind(record.id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::ok(updated))
}

/// Records a watched video. Idempotent per URL.
pub async fn watch_video(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<String>,
    Json(payload): Json<WatchVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    check_lesson_id(&lesson_id)?;
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;
    let record = lock_progress_row(&mut tx, user_id, &lesson_id).await?;

    let mut videos = record.watched_videos.0;
    add_watched_video(
        &mut videos,
        WatchedVideo {
            video_url: payload.video_url,
            watched_at: Utc::now(),
        },
    );

    let updated = sqlx::query_as::<_, ProgressRecord>(
        r#"
        UPDATE progress_records
        SET watched_videos = $1, last_accessed_at = now(), updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(sqlx::types::Json(videos))
    .bind(record.id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::ok(updated))
}

/// Marks a lesson as complete.
///
/// A single insert-or-update statement keyed on the (user, lesson) pair, so
/// concurrent calls cannot race on record creation. Idempotent: repeated
/// calls simply overwrite the completion timestamp.
pub async fn mark_lesson_complete(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_lesson_id(&lesson_id)?;
    let user_id = claims.user_id()?;

    let record = sqlx::query_as::<_, ProgressRecord>(
        r#"
        INSERT INTO progress_records (user_id, lesson_id, completed, completed_at)
        VALUES ($1, $2, TRUE, now())
        ON CONFLICT (user_id, lesson_id) DO UPDATE SET
            completed = TRUE,
            completed_at = now(),
            last_accessed_at = now(),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&lesson_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert progress record: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(ApiResponse::ok(record))
}
