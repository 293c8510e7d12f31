// src/models/analytics.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::CategoryProgress;

/// One row of the recent-activity list: a progress record projected down to
/// what the dashboard shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub lesson_id: String,
    pub last_accessed: DateTime<Utc>,
    pub completed: bool,
}

/// The derived analytics view for one user. Computed on read, never stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_lessons: u32,
    pub completed_lessons: u32,
    pub completion_percentage: u32,
    pub average_quiz_score: u32,
    pub current_streak: u32,
    pub recent_activity: Vec<RecentActivity>,
    pub progress_by_category: Vec<CategoryProgress>,
}
