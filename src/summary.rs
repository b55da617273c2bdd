//! Executive summary composition.
//!
//! Rolls the current analytics state into a single report: the biggest
//! metric movers, recent insights, per-category trend averages, alert
//! counts, and period engagement. Alert counts are re-derived from the
//! KPI catalog at read time because alerts are never stored.

use crate::alerts;
use crate::types::{
    AlertSeverity, BusinessInsight, BusinessMetric, EngagementMetrics, ExecutiveSummary,
    KpiConfig, MetricCategory, TrendDirection,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Signed trend percentage: down trends count negative, stable counts 0.
fn signed_trend_pct(metric: &BusinessMetric) -> f64 {
    match metric.trend {
        TrendDirection::Up => metric.trend_percentage,
        TrendDirection::Down => -metric.trend_percentage,
        TrendDirection::Stable => 0.0,
    }
}

/// Mean signed trend percentage per category, over the current metrics.
/// Categories with no metrics are omitted.
pub fn category_trends(metrics: &[BusinessMetric]) -> HashMap<MetricCategory, f64> {
    let mut sums: HashMap<MetricCategory, (f64, u32)> = HashMap::new();
    for metric in metrics {
        let entry = sums.entry(metric.category).or_insert((0.0, 0));
        entry.0 += signed_trend_pct(metric);
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(category, (sum, count))| (category, sum / count as f64))
        .collect()
}

/// Compose an executive summary from current state snapshots.
#[allow(clippy::too_many_arguments)]
pub fn compose(
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    current_metrics: Vec<BusinessMetric>,
    recent_insights: Vec<BusinessInsight>,
    kpis: &HashMap<String, KpiConfig>,
    engagement: EngagementMetrics,
    top_metrics_count: usize,
) -> ExecutiveSummary {
    let mut critical_alerts = 0u64;
    let mut warning_alerts = 0u64;
    for metric in &current_metrics {
        if let Some(alert) = alerts::evaluate(metric, kpis.get(&metric.name)) {
            match alert.severity {
                AlertSeverity::Critical => critical_alerts += 1,
                AlertSeverity::Warning => warning_alerts += 1,
            }
        }
    }

    let trends = category_trends(&current_metrics);

    // Biggest movers first, regardless of direction.
    let mut top_metrics = current_metrics;
    top_metrics.sort_by(|a, b| {
        b.trend_percentage
            .partial_cmp(&a.trend_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top_metrics.truncate(top_metrics_count);

    ExecutiveSummary {
        period_start,
        period_end,
        top_metrics,
        recent_insights,
        category_trends: trends,
        critical_alerts,
        warning_alerts,
        engagement,
    }
}
