// src/handlers/lessons.rs
//
// Lesson content itself is static data shipped with the frontend; these
// endpoints only expose course-level metadata.

use axum::{Json, extract::Path, response::IntoResponse};
use serde_json::json;

use crate::{
    error::AppError,
    models::lesson::{CourseMetadata, LessonLocation, TOTAL_LESSONS, parse_lesson_day},
};

/// Lists course-level metadata.
pub async fn list_lessons() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Lessons are served as static files by the frontend",
        "data": CourseMetadata {
            total_lessons: TOTAL_LESSONS,
            lessons_range: "day01 to day30".to_string(),
        },
    }))
}

/// Points at the static content for a single lesson.
/// Rejects malformed day ids with 400.
pub async fn get_lesson(Path(day_id): Path<String>) -> Result<impl IntoResponse, AppError> {
    if parse_lesson_day(&day_id).is_none() {
        return Err(AppError::BadRequest(format!(
            "Invalid lesson ID format. Expected dayNN between day01 and day30, got '{}'",
            day_id
        )));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Lesson {} is served from frontend static files", day_id),
        "data": LessonLocation {
            path: format!("frontend/src/data/lessons/{}.json", day_id),
            lesson_id: day_id,
        },
    })))
}
