//! Export of metrics and analytics state.
//!
//! JSON exports are full structural dumps via serde. CSV exports are flat
//! row-per-record with fixed headers; fields containing delimiters or
//! quotes are escaped RFC-4180 style.

use crate::error::Result;
use crate::types::{BehaviorPattern, BusinessInsight, BusinessMetric, UserAction, UserSession};
use serde_json::json;

/// Fixed header for metric CSV exports.
const METRICS_CSV_HEADER: &str = "name,category,value,unit,trend,trend_percentage,timestamp";

/// Fixed header for session CSV exports.
const SESSIONS_CSV_HEADER: &str = "session_id,user_id,started_at,ended_at,duration_secs,\
page_views,actions,studies_viewed,studies_completed,bounced,source,device";

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Full structural dump of the metric store.
pub fn metrics_to_json(current: &[BusinessMetric], history: &[BusinessMetric]) -> Result<String> {
    let dump = json!({
        "metrics": current,
        "history": history,
    });
    Ok(serde_json::to_string_pretty(&dump)?)
}

/// One row per current metric, fixed header. Empty input yields just the
/// header line.
pub fn metrics_to_csv(metrics: &[BusinessMetric]) -> String {
    let mut out = String::from(METRICS_CSV_HEADER);
    out.push('\n');
    for metric in metrics {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            csv_field(&metric.name),
            metric.category,
            metric.value,
            csv_field(&metric.unit),
            metric.trend,
            metric.trend_percentage,
            metric.timestamp.to_rfc3339(),
        ));
    }
    out
}

/// Full structural dump of sessions, actions, patterns, and insights.
pub fn analytics_to_json(
    sessions: &[UserSession],
    actions: &[UserAction],
    patterns: &[BehaviorPattern],
    insights: &[BusinessInsight],
) -> Result<String> {
    let dump = json!({
        "sessions": sessions,
        "actions": actions,
        "patterns": patterns,
        "insights": insights,
    });
    Ok(serde_json::to_string_pretty(&dump)?)
}

/// One row per session, fixed header.
pub fn sessions_to_csv(sessions: &[UserSession]) -> String {
    let mut out = String::from(SESSIONS_CSV_HEADER);
    out.push('\n');
    for session in sessions {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}\n",
            csv_field(&session.id),
            csv_field(&session.user_id),
            session.started_at.to_rfc3339(),
            session
                .ended_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
            session
                .duration_secs
                .map(|d| d.to_string())
                .unwrap_or_default(),
            session.page_views,
            session.actions,
            session.studies_viewed,
            session.studies_completed,
            session.bounced,
            csv_field(&session.source),
            csv_field(&session.device),
        ));
    }
    out
}
