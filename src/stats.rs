use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::Activity;

/// Aggregates for the admin dashboard, derived from the full activity log.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityStats {
    pub total_clicks: u64,
    pub active_students: usize,
    pub most_popular_course: Option<(String, u64)>,
    /// Last five rows, newest first.
    pub recent: Vec<Activity>,
}

pub fn activity_stats(activities: &[Activity]) -> ActivityStats {
    let total_clicks = activities.iter().map(|a| a.sum_clicks).sum();
    let active_students = activities
        .iter()
        .map(|a| a.student_id)
        .collect::<BTreeSet<_>>()
        .len();

    let mut per_course: BTreeMap<&str, u64> = BTreeMap::new();
    for activity in activities {
        *per_course.entry(activity.course_code.as_str()).or_default() += activity.sum_clicks;
    }
    let most_popular_course = per_course
        .into_iter()
        .max_by_key(|(_, clicks)| *clicks)
        .map(|(code, clicks)| (code.to_string(), clicks));

    let recent = activities.iter().rev().take(5).cloned().collect();
    ActivityStats {
        total_clicks,
        active_students,
        most_popular_course,
        recent,
    }
}
