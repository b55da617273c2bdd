//! KPI target-achievement evaluation.
//!
//! Runs synchronously inside metric ingestion, after trend computation.
//! Alerts are values handed to a notification side effect (the engine
//! emits them through `tracing`); nothing is stored here.

use crate::types::{AlertSeverity, BusinessMetric, KpiAlert, KpiConfig};

/// Evaluate a metric against its KPI configuration.
///
/// `achievement_rate = value / monthly_target × 100`. Below the critical
/// fraction the alert is critical, below the warning fraction a warning,
/// otherwise none. Missing configuration or an absent/zero monthly target
/// skips evaluation entirely (not an error).
pub fn evaluate(metric: &BusinessMetric, kpi: Option<&KpiConfig>) -> Option<KpiAlert> {
    let kpi = kpi?;
    let fractions = kpi.alerts.as_ref()?;
    let monthly_target = kpi.targets.monthly.filter(|t| *t > 0.0)?;

    let achievement_rate = metric.value / monthly_target * 100.0;

    let severity = if achievement_rate < fractions.critical * 100.0 {
        AlertSeverity::Critical
    } else if achievement_rate < fractions.warning * 100.0 {
        AlertSeverity::Warning
    } else {
        return None;
    };

    Some(KpiAlert {
        metric_name: metric.name.clone(),
        severity,
        value: metric.value,
        monthly_target,
        achievement_rate,
        timestamp: metric.timestamp,
    })
}
