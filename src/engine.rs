//! Analytics engine facade.
//!
//! Owns all engine state behind one `RwLock` per collection and exposes
//! the narrow ingestion/query surface consumed by the surrounding
//! application. Constructed once at process start and passed by handle;
//! there is no ambient global state.
//!
//! ## Ingestion pipeline
//!
//! Every write recomputes derived state synchronously, as an ordered
//! pipeline of pure steps:
//!
//! ```text
//! track_action ─▶ ledger.record ─▶ sessions.apply ─▶ patterns.detect
//! track_metric ─▶ store.track (trend) ─▶ alerts.evaluate ─▶ insights.generate
//! ```
//!
//! Ingestion takes write guards on only the collections it touches;
//! queries take read guards and never observe a partially applied write.
//! No operation spans collections transactionally, which the data model
//! does not require.

use crate::config::Config;
use crate::engagement;
use crate::error::Result;
use crate::export;
use crate::insights::{self, InsightLog};
use crate::ledger::ActionLedger;
use crate::metrics::MetricStore;
use crate::patterns::{create_default_detector, PatternDetector};
use crate::sessions::SessionTracker;
use crate::types::{
    ActionCategory, AlertSeverity, BehaviorPattern, BusinessInsight, BusinessMetric,
    ClientMetadata, EngagementMetrics, ExecutiveSummary, ExportFormat, ImpactTier,
    MetricCategory, UserJourney, UserSession,
};
use crate::{alerts, summary};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// The usage/business analytics engine.
pub struct AnalyticsEngine {
    config: Config,
    ledger: RwLock<ActionLedger>,
    sessions: RwLock<SessionTracker>,
    metrics: RwLock<MetricStore>,
    detector: RwLock<PatternDetector>,
    insights: RwLock<InsightLog>,
}

impl AnalyticsEngine {
    /// Build an engine with the built-in pattern rules.
    pub fn new(config: Config) -> Self {
        let detector = create_default_detector(&config.analytics);
        Self {
            config,
            ledger: RwLock::new(ActionLedger::new()),
            sessions: RwLock::new(SessionTracker::new()),
            metrics: RwLock::new(MetricStore::new()),
            detector: RwLock::new(detector),
            insights: RwLock::new(InsightLog::new()),
        }
    }

    // ============================================
    // Ingestion
    // ============================================

    /// Open a session for a user and return its id.
    pub fn start_session(
        &self,
        user_id: &str,
        source: &str,
        device: &str,
        location: Option<&str>,
    ) -> String {
        self.start_session_at(user_id, source, device, location, Utc::now())
    }

    /// [`Self::start_session`] with an explicit timestamp, for callers
    /// replaying events recorded elsewhere.
    pub fn start_session_at(
        &self,
        user_id: &str,
        source: &str,
        device: &str,
        location: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> String {
        self.sessions
            .write()
            .start_session_at(user_id, source, device, location, started_at)
    }

    /// Record an action, update its session, and run pattern detection
    /// over the user's recent actions.
    #[allow(clippy::too_many_arguments)]
    pub fn track_action(
        &self,
        user_id: &str,
        action: &str,
        category: ActionCategory,
        details: serde_json::Value,
        session_id: &str,
        metadata: Option<ClientMetadata>,
    ) {
        self.track_action_at(
            user_id,
            action,
            category,
            details,
            session_id,
            metadata,
            Utc::now(),
        )
    }

    /// [`Self::track_action`] with an explicit timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn track_action_at(
        &self,
        user_id: &str,
        action: &str,
        category: ActionCategory,
        details: serde_json::Value,
        session_id: &str,
        metadata: Option<ClientMetadata>,
        timestamp: DateTime<Utc>,
    ) {
        let recorded = self.ledger.write().record_at(
            user_id, action, category, details, session_id, metadata, timestamp,
        );

        self.sessions.write().apply_action(&recorded);

        // Detection scans only this user's trailing window, not the
        // whole ledger.
        let cutoff = timestamp - Duration::hours(self.config.analytics.detection_window_hours);
        let ledger = self.ledger.read();
        let recent = ledger.actions_for_since(user_id, cutoff);
        self.detector
            .write()
            .detect_for_user(user_id, &recent, timestamp);
    }

    /// Close a session, computing duration and the bounce flag.
    pub fn end_session(&self, session_id: &str) {
        self.end_session_at(session_id, Utc::now())
    }

    /// [`Self::end_session`] with an explicit timestamp.
    pub fn end_session_at(&self, session_id: &str, ended_at: DateTime<Utc>) {
        self.sessions.write().end_session_at(session_id, ended_at)
    }

    /// Record a metric observation: compute trend, evaluate KPI alerts,
    /// and generate insights, all synchronously.
    pub fn track_metric(&self, name: &str, value: f64, category: MetricCategory, unit: &str) {
        let kpi = self.config.kpi(name);
        let metric = self.metrics.write().track_at(
            name,
            value,
            category,
            unit,
            kpi,
            self.config.analytics.stable_trend_pct,
            Utc::now(),
        );

        if let Some(alert) = alerts::evaluate(&metric, kpi) {
            match alert.severity {
                AlertSeverity::Critical => tracing::error!(
                    metric = %alert.metric_name,
                    value = alert.value,
                    monthly_target = alert.monthly_target,
                    achievement_rate = alert.achievement_rate,
                    "KPI below critical threshold"
                ),
                AlertSeverity::Warning => tracing::warn!(
                    metric = %alert.metric_name,
                    value = alert.value,
                    monthly_target = alert.monthly_target,
                    achievement_rate = alert.achievement_rate,
                    "KPI below warning threshold"
                ),
            }
        }

        let generated = insights::generate(&metric, &self.config.analytics);
        if !generated.is_empty() {
            self.insights.write().append(generated);
        }
    }

    // ============================================
    // Queries
    // ============================================

    /// Current metrics, optionally filtered by category.
    pub fn get_metrics(&self, category: Option<MetricCategory>) -> Vec<BusinessMetric> {
        self.metrics.read().metrics(category)
    }

    /// The most recent `limit` insights, newest first.
    pub fn get_insights(&self, limit: usize) -> Vec<BusinessInsight> {
        self.insights.read().recent(limit)
    }

    /// Detected behavior patterns, optionally filtered by impact tier.
    pub fn get_behavior_patterns(&self, impact: Option<ImpactTier>) -> Vec<BehaviorPattern> {
        self.detector.read().patterns(impact)
    }

    /// Everything known about one user within the trailing timeframe.
    pub fn get_user_journey(&self, user_id: &str, timeframe_hours: i64) -> UserJourney {
        let cutoff = Utc::now() - Duration::hours(timeframe_hours);

        let sessions = self.sessions.read().sessions_for_user(user_id, cutoff);
        let actions = self
            .ledger
            .read()
            .actions_for_since(user_id, cutoff)
            .into_iter()
            .cloned()
            .collect();
        let patterns = self.detector.read().patterns_for_user(user_id);

        UserJourney {
            sessions,
            actions,
            patterns,
        }
    }

    /// Engagement metrics over sessions started in [start, end].
    pub fn calculate_engagement_metrics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<EngagementMetrics> {
        let tracker = self.sessions.read();
        let in_range = tracker.sessions_in_range(start, end);
        let firsts = tracker.first_session_starts();
        engagement::calculate_engagement(&in_range, &firsts, start, end)
    }

    /// Executive roll-up: top movers, recent insights, category trends,
    /// alert counts, and period engagement.
    pub fn generate_executive_summary(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ExecutiveSummary> {
        let engagement = self.calculate_engagement_metrics(start, end)?;
        let current_metrics = self.metrics.read().metrics(None);
        let recent_insights = self
            .insights
            .read()
            .recent(self.config.analytics.summary_recent_insights);

        Ok(summary::compose(
            start,
            end,
            current_metrics,
            recent_insights,
            &self.config.kpis,
            engagement,
            self.config.analytics.summary_top_metrics,
        ))
    }

    // ============================================
    // Export
    // ============================================

    /// Export the metric store in the given format.
    pub fn export_metrics_data(&self, format: ExportFormat) -> Result<String> {
        let store = self.metrics.read();
        match format {
            ExportFormat::Json => export::metrics_to_json(&store.metrics(None), store.history()),
            ExportFormat::Csv => Ok(export::metrics_to_csv(&store.metrics(None))),
        }
    }

    /// Export sessions, actions, patterns, and insights in the given
    /// format. CSV is row-per-session.
    pub fn export_analytics_data(&self, format: ExportFormat) -> Result<String> {
        let mut sessions: Vec<UserSession> = self.sessions.read().sessions().cloned().collect();
        sessions.sort_by_key(|s| s.started_at);

        match format {
            ExportFormat::Json => {
                let ledger = self.ledger.read();
                let patterns = self.detector.read().patterns(None);
                let insights = self.insights.read();
                export::analytics_to_json(&sessions, ledger.actions(), &patterns, insights.all())
            }
            ExportFormat::Csv => Ok(export::sessions_to_csv(&sessions)),
        }
    }

    // ============================================
    // Cleanup
    // ============================================

    /// Remove metric history older than `older_than_days`. Returns how
    /// many entries were removed.
    pub fn cleanup_old_metrics(&self, older_than_days: i64) -> usize {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let removed = self.metrics.write().cleanup(cutoff);
        tracing::info!(older_than_days, removed, "Cleaned up old metrics");
        removed
    }

    /// Remove actions and closed sessions older than `older_than_days`.
    /// Behavior patterns are retained. Returns (actions, sessions)
    /// removed.
    pub fn cleanup_old_data(&self, older_than_days: i64) -> (usize, usize) {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let actions_removed = self.ledger.write().cleanup(cutoff);
        let sessions_removed = self.sessions.write().cleanup(cutoff);
        tracing::info!(
            older_than_days,
            actions_removed,
            sessions_removed,
            "Cleaned up old analytics data"
        );
        (actions_removed, sessions_removed)
    }
}
