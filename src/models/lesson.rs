// src/models/lesson.rs

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Total number of lessons in the course ("day01" through "day30").
pub const TOTAL_LESSONS: u32 = 30;

/// Lexical shape of a lesson id: "day" followed by exactly two digits.
static LESSON_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^day\d{2}$").unwrap());

/// Parses the numeric day out of a lesson id.
///
/// Accepts only ids matching `dayNN` with NN between 01 and 30; anything
/// else (day00, day31, day1, dayXX) yields `None`.
pub fn parse_lesson_day(lesson_id: &str) -> Option<u32> {
    if !LESSON_ID_PATTERN.is_match(lesson_id) {
        return None;
    }
    let day: u32 = lesson_id[3..].parse().ok()?;
    (1..=TOTAL_LESSONS).contains(&day).then_some(day)
}

/// Course-level metadata returned by the lessons listing.
/// Lesson content itself is static frontend data, not served by this API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMetadata {
    pub total_lessons: u32,
    pub lessons_range: String,
}

/// Pointer to where a single lesson's static content lives.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonLocation {
    pub lesson_id: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_course_days() {
        for day in 1..=30 {
            let id = format!("day{:02}", day);
            assert_eq!(parse_lesson_day(&id), Some(day));
        }
    }

    #[test]
    fn rejects_out_of_range_days() {
        assert_eq!(parse_lesson_day("day00"), None);
        assert_eq!(parse_lesson_day("day31"), None);
        assert_eq!(parse_lesson_day("day99"), None);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(parse_lesson_day("day1"), None);
        assert_eq!(parse_lesson_day("day001"), None);
        assert_eq!(parse_lesson_day("dayXX"), None);
        assert_eq!(parse_lesson_day("lesson01"), None);
        assert_eq!(parse_lesson_day(""), None);
        assert_eq!(parse_lesson_day("DAY01"), None);
    }
}
