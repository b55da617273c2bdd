//! Insight generation from metric trends.
//!
//! Heuristic rules over a metric's category and latest trend append
//! [`BusinessInsight`] records to an ordered log. Runs synchronously
//! inside metric ingestion, after trend and alert evaluation.

use crate::config::AnalyticsConfig;
use crate::types::{BusinessInsight, BusinessMetric, ImpactTier, MetricCategory, TrendDirection};
use uuid::Uuid;

/// Generate zero or more insights for a freshly tracked metric.
pub fn generate(metric: &BusinessMetric, config: &AnalyticsConfig) -> Vec<BusinessInsight> {
    let mut insights = Vec::new();

    let insight = |title: &str, description: String, impact, recommendation: &str, confidence| {
        BusinessInsight {
            id: Uuid::new_v4().to_string(),
            metric_name: metric.name.clone(),
            title: title.to_string(),
            description,
            impact,
            category: metric.category,
            recommendation: recommendation.to_string(),
            confidence,
            timestamp: metric.timestamp,
        }
    };

    match (metric.category, metric.trend) {
        (MetricCategory::User, TrendDirection::Up)
            if metric.trend_percentage > config.user_growth_pct =>
        {
            insights.push(insight(
                "Strong User Growth",
                format!(
                    "{} grew {:.2}% since the previous observation",
                    metric.name, metric.trend_percentage
                ),
                ImpactTier::High,
                "Scale acquisition channels while growth momentum holds",
                0.85,
            ));
        }
        (MetricCategory::Engagement, TrendDirection::Down)
            if metric.trend_percentage > config.engagement_decline_pct =>
        {
            insights.push(insight(
                "Engagement Decline",
                format!(
                    "{} dropped {:.2}% since the previous observation",
                    metric.name, metric.trend_percentage
                ),
                ImpactTier::High,
                "Review recent product changes and re-engage inactive users",
                0.90,
            ));
        }
        (MetricCategory::Financial, TrendDirection::Up)
            if metric.trend_percentage > config.revenue_growth_pct =>
        {
            insights.push(insight(
                "Revenue Growth Opportunity",
                format!(
                    "{} rose {:.2}% since the previous observation",
                    metric.name, metric.trend_percentage
                ),
                ImpactTier::Medium,
                "Consider expanding the offerings driving this growth",
                0.75,
            ));
        }
        _ => {}
    }

    insights
}

/// Append-only, timestamp-ordered log of generated insights.
#[derive(Debug, Default)]
pub struct InsightLog {
    insights: Vec<BusinessInsight>,
}

impl InsightLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, insights: Vec<BusinessInsight>) {
        for insight in &insights {
            tracing::info!(
                title = %insight.title,
                metric = %insight.metric_name,
                impact = insight.impact.as_str(),
                "Generated insight"
            );
        }
        self.insights.extend(insights);
    }

    /// The most recent `limit` insights, newest first.
    pub fn recent(&self, limit: usize) -> Vec<BusinessInsight> {
        let mut insights: Vec<BusinessInsight> = self.insights.clone();
        insights.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        insights.truncate(limit);
        insights
    }

    pub fn len(&self) -> usize {
        self.insights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    /// All insights in insertion order.
    pub fn all(&self) -> &[BusinessInsight] {
        &self.insights
    }
}
