//! Business metric store and trend engine.
//!
//! Each `track` overwrites the current slot for that metric name; trend is
//! computed against the immediately preceding observation. A full history
//! is retained for audit and export.

use crate::types::{BusinessMetric, KpiConfig, MetricCategory, TrendDirection};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Trend direction and magnitude versus the previous observation.
///
/// A relative change magnitude below `stable_pct` percent is stable. No
/// previous value, or a previous value of zero (no finite relative
/// change), yields stable at 0%.
pub fn compute_trend(
    previous: Option<f64>,
    value: f64,
    stable_pct: f64,
) -> (TrendDirection, f64) {
    let Some(previous) = previous else {
        return (TrendDirection::Stable, 0.0);
    };
    if previous == 0.0 {
        return (TrendDirection::Stable, 0.0);
    }

    let change_pct = ((value - previous).abs() / previous.abs()) * 100.0;
    if change_pct < stable_pct {
        return (TrendDirection::Stable, round2(change_pct));
    }

    let direction = if value > previous {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };
    (direction, round2(change_pct))
}

/// Holds the current observation per metric name plus the full history.
#[derive(Debug, Default)]
pub struct MetricStore {
    current: HashMap<String, BusinessMetric>,
    history: Vec<BusinessMetric>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new observation of `name`, computing trend against the
    /// previous one. Target and threshold come from the KPI catalog and
    /// stay `None` when the metric is unconfigured.
    pub fn track_at(
        &mut self,
        name: &str,
        value: f64,
        category: MetricCategory,
        unit: &str,
        kpi: Option<&KpiConfig>,
        stable_pct: f64,
        timestamp: DateTime<Utc>,
    ) -> BusinessMetric {
        let previous = self.current.get(name).map(|m| m.value);
        let (trend, trend_percentage) = compute_trend(previous, value, stable_pct);

        let metric = BusinessMetric {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category,
            value,
            unit: unit.to_string(),
            trend,
            trend_percentage,
            timestamp,
            target_value: kpi.and_then(|k| k.targets.monthly),
            alert_threshold: kpi.and_then(|k| k.alerts.as_ref()).map(|a| a.critical),
        };

        tracing::debug!(
            metric = name,
            value,
            trend = %metric.trend,
            trend_percentage,
            "Tracked metric"
        );

        self.current.insert(name.to_string(), metric.clone());
        self.history.push(metric.clone());
        metric
    }

    /// Current observation for a metric name, if any.
    pub fn get(&self, name: &str) -> Option<&BusinessMetric> {
        self.current.get(name)
    }

    /// Current metrics, optionally filtered by category, sorted by name.
    pub fn metrics(&self, category: Option<MetricCategory>) -> Vec<BusinessMetric> {
        let mut metrics: Vec<BusinessMetric> = self
            .current
            .values()
            .filter(|m| category.map(|c| m.category == c).unwrap_or(true))
            .cloned()
            .collect();
        metrics.sort_by(|a, b| a.name.cmp(&b.name));
        metrics
    }

    /// Full observation history, oldest first.
    pub fn history(&self) -> &[BusinessMetric] {
        &self.history
    }

    /// Drop history entries older than `cutoff`. The current slot for
    /// every name survives regardless of age, so trend continuity is
    /// preserved. Returns how many entries were removed.
    pub fn cleanup(&mut self, cutoff: DateTime<Utc>) -> usize {
        let current_ids: Vec<&str> = self.current.values().map(|m| m.id.as_str()).collect();
        let before = self.history.len();
        self.history
            .retain(|m| m.timestamp >= cutoff || current_ids.contains(&m.id.as_str()));
        before - self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(store: &mut MetricStore, value: f64) -> BusinessMetric {
        store.track_at(
            "Monthly Active Users",
            value,
            MetricCategory::User,
            "users",
            None,
            2.0,
            Utc::now(),
        )
    }

    #[test]
    fn test_first_observation_is_stable() {
        let mut store = MetricStore::new();
        let metric = track(&mut store, 500.0);
        assert_eq!(metric.trend, TrendDirection::Stable);
        assert_eq!(metric.trend_percentage, 0.0);
        assert!(metric.target_value.is_none());
        assert!(metric.alert_threshold.is_none());
    }

    #[test]
    fn test_same_value_twice_is_stable() {
        let mut store = MetricStore::new();
        track(&mut store, 500.0);
        let metric = track(&mut store, 500.0);
        assert_eq!(metric.trend, TrendDirection::Stable);
        assert_eq!(metric.trend_percentage, 0.0);
    }

    #[test]
    fn test_upward_trend_percentage() {
        let mut store = MetricStore::new();
        track(&mut store, 500.0);
        let metric = track(&mut store, 650.0);
        assert_eq!(metric.trend, TrendDirection::Up);
        assert_eq!(metric.trend_percentage, 30.0);
    }

    #[test]
    fn test_downward_trend() {
        let mut store = MetricStore::new();
        track(&mut store, 100.0);
        let metric = track(&mut store, 90.0);
        assert_eq!(metric.trend, TrendDirection::Down);
        assert_eq!(metric.trend_percentage, 10.0);
    }

    #[test]
    fn test_small_change_is_stable() {
        let mut store = MetricStore::new();
        track(&mut store, 1000.0);
        let metric = track(&mut store, 1010.0);
        assert_eq!(metric.trend, TrendDirection::Stable);
        assert_eq!(metric.trend_percentage, 1.0);
    }

    #[test]
    fn test_zero_previous_value_is_stable() {
        let mut store = MetricStore::new();
        track(&mut store, 0.0);
        let metric = track(&mut store, 50.0);
        assert_eq!(metric.trend, TrendDirection::Stable);
        assert_eq!(metric.trend_percentage, 0.0);
    }

    #[test]
    fn test_trend_percentage_rounding() {
        let (_, pct) = compute_trend(Some(3.0), 4.0, 2.0);
        assert_eq!(pct, 33.33);
    }

    #[test]
    fn test_category_filter_and_ordering() {
        let mut store = MetricStore::new();
        let now = Utc::now();
        store.track_at("Revenue", 10.0, MetricCategory::Financial, "USD", None, 2.0, now);
        store.track_at("DAU", 5.0, MetricCategory::User, "users", None, 2.0, now);
        store.track_at("MAU", 50.0, MetricCategory::User, "users", None, 2.0, now);

        let users = store.metrics(Some(MetricCategory::User));
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "DAU");
        assert_eq!(users[1].name, "MAU");
        assert_eq!(store.metrics(None).len(), 3);
    }

    #[test]
    fn test_cleanup_keeps_current_slot() {
        let mut store = MetricStore::new();
        let old = Utc::now() - chrono::Duration::days(120);
        store.track_at("MAU", 100.0, MetricCategory::User, "users", None, 2.0, old);
        store.track_at("MAU", 200.0, MetricCategory::User, "users", None, 2.0, old);

        let removed = store.cleanup(Utc::now() - chrono::Duration::days(90));
        assert_eq!(removed, 1);
        // The latest observation survives even though it predates the cutoff.
        assert_eq!(store.get("MAU").map(|m| m.value), Some(200.0));
        assert_eq!(store.history().len(), 1);
    }
}
