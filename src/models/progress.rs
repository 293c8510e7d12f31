// src/models/progress.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use url::Url;
use validator::Validate;

/// How many code snapshots are retained per lesson. Oldest are evicted
/// first, regardless of which editor they came from.
pub const MAX_CODE_SNAPSHOTS: usize = 10;

/// One answered quiz question, stored inside `progress_records.quiz_scores`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub question_id: String,
    pub correct: bool,
    /// The raw answer value as submitted (string, number, array...).
    pub answer: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// One saved editor state, stored inside `progress_records.code_snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnapshot {
    pub timestamp: DateTime<Utc>,
    pub code: String,
    /// Which code editor in the lesson the snapshot came from.
    pub editor_id: String,
}

/// One watched video, stored inside `progress_records.watched_videos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideo {
    pub video_url: String,
    pub watched_at: DateTime<Utc>,
}

/// Represents the 'progress_records' table: per-(user, lesson) state of
/// activities, quizzes, code, videos and completion. Unique on the pair.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: String,
    pub completed_activities: Json<Vec<String>>,
    pub quiz_scores: Json<Vec<QuizScore>>,
    pub code_snapshots: Json<Vec<CodeSnapshot>>,
    pub watched_videos: Json<Vec<WatchedVideo>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Bumped on every mutation; drives the streak and recent-activity views.
    pub last_accessed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Merge rules for the JSONB collections. These are the whole write semantics
// of the progress API, so they live here as plain functions and are
// unit-tested without a database.
// ---------------------------------------------------------------------------

/// Adds an activity id to the completed set. No-op when already present.
/// Returns whether the set changed.
pub fn add_completed_activity(activities: &mut Vec<String>, activity_id: &str) -> bool {
    if activities.iter().any(|a| a == activity_id) {
        return false;
    }
    activities.push(activity_id.to_string());
    true
}

/// Merges a batch of incoming quiz answers into the stored scores.
///
/// An entry for an already-answered question is replaced in place; new
/// questions are appended. The stored count therefore never exceeds the
/// number of distinct question ids ever submitted.
pub fn merge_quiz_scores(scores: &mut Vec<QuizScore>, incoming: Vec<QuizScore>) {
    for entry in incoming {
        match scores.iter_mut().find(|s| s.question_id == entry.question_id) {
            Some(existing) => *existing = entry,
            None => scores.push(entry),
        }
    }
}

/// Appends a snapshot, evicting from the front once the cap is exceeded.
pub fn push_code_snapshot(snapshots: &mut Vec<CodeSnapshot>, snapshot: CodeSnapshot) {
    snapshots.push(snapshot);
    if snapshots.len() > MAX_CODE_SNAPSHOTS {
        let excess = snapshots.len() - MAX_CODE_SNAPSHOTS;
        snapshots.drain(..excess);
    }
}

/// Records a watched video. No-op when the URL was already recorded.
/// Returns whether the set changed.
pub fn add_watched_video(videos: &mut Vec<WatchedVideo>, video: WatchedVideo) -> bool {
    if videos.iter().any(|v| v.video_url == video.video_url) {
        return false;
    }
    videos.push(video);
    true
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of POST /api/progress/{lessonId}/activity.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteActivityRequest {
    #[validate(length(min = 1, max = 200))]
    pub activity_id: String,
}

/// One answer inside a quiz submission body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswerInput {
    pub question_id: String,
    pub answer: serde_json::Value,
    pub correct: bool,
}

/// Body of POST /api/progress/{lessonId}/quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    /// Defaults to "<lessonId>-quiz" when omitted.
    pub quiz_id: Option<String>,
    #[validate(length(min = 1, message = "At least one answer is required."))]
    pub answers: Vec<QuizAnswerInput>,
}

/// Body of POST /api/progress/{lessonId}/code.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveCodeRequest {
    #[validate(length(max = 100000))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub editor_id: String,
}

/// Body of POST /api/progress/{lessonId}/video.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WatchVideoRequest {
    #[validate(length(min = 1, max = 500), custom(function = validate_video_url))]
    pub video_url: String,
}

fn validate_video_url(video_url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(video_url).is_err() {
        return Err(validator::ValidationError::new("invalid_video_url"));
    }
    Ok(())
}
