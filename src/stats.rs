// src/stats.rs
//
// Derived statistics over a user's progress records and quiz submissions.
// Everything here is a pure function over already-fetched data; the handlers
// in handlers/analytics.rs do the fetching.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::lesson::TOTAL_LESSONS;

/// A thematic group of consecutive lessons.
#[derive(Debug)]
pub struct Category {
    pub name: &'static str,
    pub first_day: u32,
    pub last_day: u32,
}

/// The fixed course categories, in course order. Ranges are inclusive and
/// must tile day 1..=30 exactly; `check_category_coverage` enforces this at
/// startup.
pub const CATEGORIES: [Category; 6] = [
    Category { name: "Foundation", first_day: 1, last_day: 5 },
    Category { name: "Environmental Sensors", first_day: 6, last_day: 9 },
    Category { name: "Displays and Motors", first_day: 10, last_day: 14 },
    Category { name: "Advanced Sensors", first_day: 15, last_day: 21 },
    Category { name: "Networking and ESP32", first_day: 22, last_day: 28 },
    Category { name: "Reliability and Capstone", first_day: 29, last_day: 30 },
];

/// Per-category completion counts for the analytics view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub name: &'static str,
    pub completed: u32,
    pub total: u32,
    pub percentage: u32,
}

/// Checks that a category table is disjoint and covers every lesson day
/// exactly once. A misconfigured table would silently count lessons into the
/// wrong bucket, so startup refuses to run with one.
pub fn check_category_coverage(categories: &[Category]) -> Result<(), String> {
    let mut seen = [false; TOTAL_LESSONS as usize + 1];

    for cat in categories {
        if cat.first_day < 1 || cat.last_day > TOTAL_LESSONS || cat.first_day > cat.last_day {
            return Err(format!("category '{}' has an invalid day range", cat.name));
        }
        for day in cat.first_day..=cat.last_day {
            if seen[day as usize] {
                return Err(format!("day {:02} is claimed by more than one category", day));
            }
            seen[day as usize] = true;
        }
    }

    if let Some(day) = (1..=TOTAL_LESSONS).find(|&d| !seen[d as usize]) {
        return Err(format!("day {:02} belongs to no category", day));
    }

    Ok(())
}

fn round_percent(numerator: f64, denominator: f64) -> u32 {
    (numerator / denominator * 100.0).round() as u32
}

/// Overall completion as a rounded percentage of the 30 lessons.
pub fn completion_percentage(completed_lessons: u32) -> u32 {
    round_percent(completed_lessons as f64, TOTAL_LESSONS as f64)
}

/// Mean of per-submission score ratios, as a rounded percentage.
///
/// Takes `(total_score, max_score)` pairs. Zero submissions yield 0 rather
/// than an error; submissions with a zero max score are skipped.
pub fn average_quiz_score(submissions: &[(i64, i64)]) -> u32 {
    let ratios: Vec<f64> = submissions
        .iter()
        .filter(|(_, max)| *max > 0)
        .map(|(total, max)| *total as f64 / *max as f64)
        .collect();

    if ratios.is_empty() {
        return 0;
    }

    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    (mean * 100.0).round() as u32
}

/// Counts consecutive calendar days with recorded activity, ending today.
///
/// Walks backward one day at a time from `today` and stops at the first day
/// absent from `active_days`. A user with no activity today has a streak of
/// 0 no matter what happened yesterday.
pub fn current_streak(today: NaiveDate, active_days: &HashSet<NaiveDate>) -> u32 {
    let mut streak = 0;
    let mut cursor = today;

    while active_days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }

    streak
}

/// Buckets completed lesson days into the fixed categories.
/// The first matching category wins; the coverage check makes overlap
/// impossible in a running service.
pub fn category_progress(completed_days: &[u32]) -> Vec<CategoryProgress> {
    let mut counts = [0u32; CATEGORIES.len()];

    for &day in completed_days {
        if let Some(idx) = CATEGORIES
            .iter()
            .position(|c| (c.first_day..=c.last_day).contains(&day))
        {
            counts[idx] += 1;
        }
    }

    CATEGORIES
        .iter()
        .zip(counts)
        .map(|(cat, completed)| {
            let total = cat.last_day - cat.first_day + 1;
            CategoryProgress {
                name: cat.name,
                completed,
                total,
                percentage: round_percent(completed as f64, total as f64),
            }
        })
        .collect()
}
