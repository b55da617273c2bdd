//! Engagement aggregation over a time-bounded slice of sessions.
//!
//! Pure functions: no state, recomputed on every read. All denominators
//! of zero yield 0 rather than a division error.

use crate::error::{Error, Result};
use crate::types::{EngagementMetrics, RetentionMetrics, UserSession};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Compute engagement metrics for sessions whose start falls in
/// [start, end].
///
/// `first_starts` maps each user to their first-ever session start across
/// all known sessions; it drives the new-vs-returning split. The retention
/// cohort is the set of users appearing in the range slice, with "first"
/// meaning their earliest session within the slice.
pub fn calculate_engagement(
    sessions: &[&UserSession],
    first_starts: &HashMap<&str, DateTime<Utc>>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<EngagementMetrics> {
    if start > end {
        return Err(Error::InvalidTimeRange { start, end });
    }

    let total_sessions = sessions.len() as f64;
    if sessions.is_empty() {
        return Ok(EngagementMetrics::default());
    }

    let mut users: HashMap<&str, Vec<DateTime<Utc>>> = HashMap::new();
    for session in sessions {
        users
            .entry(session.user_id.as_str())
            .or_default()
            .push(session.started_at);
    }

    let total_users = users.len() as u64;
    let new_users = users
        .keys()
        .filter(|user| {
            first_starts
                .get(*user)
                .map(|first| *first >= start && *first <= end)
                .unwrap_or(false)
        })
        .count() as u64;
    let returning_users = total_users - new_users;

    let closed_durations: Vec<i64> = sessions
        .iter()
        .filter_map(|s| s.duration_secs)
        .collect();
    let average_session_duration_secs = if closed_durations.is_empty() {
        0.0
    } else {
        closed_durations.iter().sum::<i64>() as f64 / closed_durations.len() as f64
    };

    let bounced = sessions.iter().filter(|s| s.bounced).count() as f64;
    let bounce_rate = bounced / total_sessions * 100.0;

    let total_page_views: u64 = sessions.iter().map(|s| s.page_views as u64).sum();
    let page_views_per_session = total_page_views as f64 / total_sessions;

    let converted = sessions.iter().filter(|s| s.studies_completed > 0).count() as f64;
    let conversion_rate = converted / total_sessions * 100.0;

    Ok(EngagementMetrics {
        total_users,
        new_users,
        returning_users,
        average_session_duration_secs,
        bounce_rate,
        page_views_per_session,
        conversion_rate,
        retention: calculate_retention(&users),
    })
}

/// Day-1/7/30 retention for a cohort of users and their session starts.
///
/// A user counts toward dayN when any session after their first starts
/// within N days of the first. Each value lies in [0, 100].
fn calculate_retention(users: &HashMap<&str, Vec<DateTime<Utc>>>) -> RetentionMetrics {
    if users.is_empty() {
        return RetentionMetrics::default();
    }

    let mut day1 = 0u64;
    let mut day7 = 0u64;
    let mut day30 = 0u64;

    for starts in users.values() {
        let mut starts = starts.clone();
        starts.sort();
        let first = starts[0];

        let returned_within = |days: i64| {
            starts[1..]
                .iter()
                .any(|&ts| ts - first <= Duration::days(days))
        };

        if returned_within(1) {
            day1 += 1;
        }
        if returned_within(7) {
            day7 += 1;
        }
        if returned_within(30) {
            day30 += 1;
        }
    }

    let cohort = users.len() as f64;
    RetentionMetrics {
        day1: day1 as f64 / cohort * 100.0,
        day7: day7 as f64 / cohort * 100.0,
        day30: day30 as f64 / cohort * 100.0,
    }
}
