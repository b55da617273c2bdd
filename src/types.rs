//! Core domain types for studypulse-core
//!
//! These types form the canonical data model for the analytics engine.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Action** | A single timestamped user event with a verb and category |
//! | **Session** | A bounded period of a user's activity, closed exactly once |
//! | **Bounce** | A session too short/shallow to represent engagement |
//! | **Metric** | A named, timestamped observation of a business KPI |
//! | **Trend** | Direction/magnitude of change vs. the immediately preceding observation |
//! | **Pattern** | A named, rule-triggered classification of a user's recent actions |
//! | **Insight** | A generated recommendation derived from a metric's trend |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================
// Actions
// ============================================

/// Category of a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    /// Page/route changes
    Navigation,
    /// Clicks, form input, generic UI interaction
    Interaction,
    /// Study lifecycle events (start, view, complete)
    Study,
    /// Events emitted by the platform itself
    System,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Navigation => "navigation",
            ActionCategory::Interaction => "interaction",
            ActionCategory::Study => "study",
            ActionCategory::System => "system",
        }
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigation" => Ok(ActionCategory::Navigation),
            "interaction" => Ok(ActionCategory::Interaction),
            "study" => Ok(ActionCategory::Study),
            "system" => Ok(ActionCategory::System),
            _ => Err(format!("unknown action category: {}", s)),
        }
    }
}

/// Client context attached to an action at ingestion time.
///
/// Known fields are typed; anything else the caller wants to attach goes
/// into the `extra` map so the core's own logic stays statically typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// Browser/client user agent string
    pub user_agent: Option<String>,
    /// Network address the request arrived from
    pub remote_addr: Option<String>,
    /// Caller-defined extension fields
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

/// One discrete user event. Immutable once recorded; append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAction {
    /// Unique identifier
    pub id: String,
    /// User who performed the action
    pub user_id: String,
    /// Free-text verb, e.g. "study_start", "page_view"
    pub action: String,
    /// Category of the action
    pub category: ActionCategory,
    /// Arbitrary key/value payload supplied by the caller
    pub details: serde_json::Value,
    /// When the action occurred
    pub timestamp: DateTime<Utc>,
    /// Session this action belongs to
    pub session_id: String,
    /// Optional client context (user agent, network address)
    pub metadata: Option<ClientMetadata>,
}

// ============================================
// Sessions
// ============================================

/// One continuous period of user activity.
///
/// Mutated incrementally by every action that belongs to it; finalized
/// exactly once by [`crate::sessions::SessionTracker::end_session_at`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    /// Unique identifier
    pub id: String,
    /// User this session belongs to
    pub user_id: String,
    /// When the session was opened
    pub started_at: DateTime<Utc>,
    /// When the session was closed (set only on close)
    pub ended_at: Option<DateTime<Utc>>,
    /// Session length in seconds (set only on close)
    pub duration_secs: Option<i64>,
    /// Number of page views in this session
    pub page_views: u32,
    /// Total number of actions in this session
    pub actions: u32,
    /// Studies viewed or started
    pub studies_viewed: u32,
    /// Studies completed
    pub studies_completed: u32,
    /// Whether this session bounced (computed at close)
    pub bounced: bool,
    /// Traffic source, set at open (e.g. "organic", "referral")
    pub source: String,
    /// Device class, set at open (e.g. "desktop", "mobile")
    pub device: String,
    /// Coarse location, set at open
    pub location: Option<String>,
}

impl UserSession {
    /// Whether this session has been closed.
    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }
}

// ============================================
// Business metrics
// ============================================

/// Category of a business metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    User,
    Study,
    Financial,
    Engagement,
    Performance,
}

impl MetricCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::User => "user",
            MetricCategory::Study => "study",
            MetricCategory::Financial => "financial",
            MetricCategory::Engagement => "engagement",
            MetricCategory::Performance => "performance",
        }
    }

    /// All categories, in a stable order.
    pub fn all() -> [MetricCategory; 5] {
        [
            MetricCategory::User,
            MetricCategory::Study,
            MetricCategory::Financial,
            MetricCategory::Engagement,
            MetricCategory::Performance,
        ]
    }
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MetricCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MetricCategory::User),
            "study" => Ok(MetricCategory::Study),
            "financial" => Ok(MetricCategory::Financial),
            "engagement" => Ok(MetricCategory::Engagement),
            "performance" => Ok(MetricCategory::Performance),
            _ => Err(format!("unknown metric category: {}", s)),
        }
    }
}

/// Direction of a metric's change relative to its previous observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, timestamped observation of a KPI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessMetric {
    /// Unique identifier for this observation
    pub id: String,
    /// Metric name, e.g. "Monthly Active Users"
    pub name: String,
    /// Category of the metric
    pub category: MetricCategory,
    /// Observed value
    pub value: f64,
    /// Unit of measure, e.g. "users", "USD"
    pub unit: String,
    /// Direction vs. the immediately preceding observation of this name
    pub trend: TrendDirection,
    /// |change| / previous × 100, rounded to 2 decimals
    pub trend_percentage: f64,
    /// When this observation was recorded
    pub timestamp: DateTime<Utc>,
    /// Monthly target resolved from KPI configuration, if configured
    pub target_value: Option<f64>,
    /// Critical alert fraction resolved from KPI configuration, if configured
    pub alert_threshold: Option<f64>,
}

// ============================================
// KPI configuration
// ============================================

/// Per-period targets for a KPI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiTargets {
    pub daily: Option<f64>,
    pub weekly: Option<f64>,
    pub monthly: Option<f64>,
    pub quarterly: Option<f64>,
}

/// Alert fractions expressed as achievement ratios against the monthly target.
///
/// An achievement rate below `critical × 100` percent emits a critical
/// alert; below `warning × 100` percent, a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiAlertFractions {
    pub critical: f64,
    pub warning: f64,
}

/// Static policy for one metric name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiConfig {
    /// Human-readable description of how the metric is computed
    pub formula: String,
    /// Per-period targets
    #[serde(default)]
    pub targets: KpiTargets,
    /// Alert fractions against the monthly target
    pub alerts: Option<KpiAlertFractions>,
}

// ============================================
// Alerts
// ============================================

/// Severity of a KPI alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::Warning => "warning",
        }
    }
}

/// A KPI target-achievement alert.
///
/// Alerts are side-effecting notifications: the engine emits them through
/// `tracing` and re-derives counts on demand. They are not stored.
#[derive(Debug, Clone, Serialize)]
pub struct KpiAlert {
    /// Metric that triggered the alert
    pub metric_name: String,
    /// Severity tier
    pub severity: AlertSeverity,
    /// Observed value
    pub value: f64,
    /// Monthly target the value was measured against
    pub monthly_target: f64,
    /// value / monthly_target × 100
    pub achievement_rate: f64,
    /// When the alert was evaluated
    pub timestamp: DateTime<Utc>,
}

// ============================================
// Behavior patterns
// ============================================

/// Impact tier for patterns and insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTier {
    High,
    Medium,
    Low,
}

impl ImpactTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactTier::High => "high",
            ImpactTier::Medium => "medium",
            ImpactTier::Low => "low",
        }
    }
}

impl std::str::FromStr for ImpactTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(ImpactTier::High),
            "medium" => Ok(ImpactTier::Medium),
            "low" => Ok(ImpactTier::Low),
            _ => Err(format!("unknown impact tier: {}", s)),
        }
    }
}

/// The conditions under which a pattern rule fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConditions {
    /// Action verbs the rule inspects
    pub actions: Vec<String>,
    /// Trailing window the rule scans, in minutes
    pub timeframe_minutes: i64,
    /// Occurrence threshold within the window
    pub frequency: u32,
}

/// A detected recurring behavior condition.
///
/// Upserted: a second detection of the same named pattern for the same
/// user does not duplicate either the pattern or the user entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorPattern {
    /// Pattern name, e.g. "Power User"
    pub name: String,
    /// What the pattern means
    pub description: String,
    /// Conditions that trigger the pattern
    pub trigger: TriggerConditions,
    /// Users currently matching the pattern (insertion order, deduped)
    pub users: Vec<String>,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
    /// Impact tier
    pub impact: ImpactTier,
    /// Suggested follow-up for matched users
    pub recommendation: String,
    /// When the pattern was first detected
    pub detected_at: DateTime<Utc>,
}

// ============================================
// Insights
// ============================================

/// A generated observation tied to one metric's latest trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessInsight {
    /// Unique identifier
    pub id: String,
    /// Metric the insight was derived from
    pub metric_name: String,
    /// Short title, e.g. "Strong User Growth"
    pub title: String,
    /// Longer description of the observation
    pub description: String,
    /// Impact tier
    pub impact: ImpactTier,
    /// Category of the source metric
    pub category: MetricCategory,
    /// Recommended action
    pub recommendation: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// When the insight was generated
    pub timestamp: DateTime<Utc>,
}

// ============================================
// Engagement
// ============================================

/// Cohort retention percentages, each in [0, 100].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RetentionMetrics {
    pub day1: f64,
    pub day7: f64,
    pub day30: f64,
}

/// Aggregate engagement over a time-bounded slice of sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementMetrics {
    /// Distinct users with sessions in the range
    pub total_users: u64,
    /// Users whose first-ever session start falls in the range
    pub new_users: u64,
    /// total_users − new_users
    pub returning_users: u64,
    /// Mean duration of closed sessions, in seconds
    pub average_session_duration_secs: f64,
    /// Bounced sessions / sessions in range × 100
    pub bounce_rate: f64,
    /// Mean page views across sessions in range
    pub page_views_per_session: f64,
    /// Sessions with at least one completed study / sessions × 100
    pub conversion_rate: f64,
    /// Day-1/7/30 retention for the range cohort
    pub retention: RetentionMetrics,
}

// ============================================
// Journeys and summaries
// ============================================

/// Everything known about one user's recent activity.
#[derive(Debug, Clone, Serialize)]
pub struct UserJourney {
    pub sessions: Vec<UserSession>,
    pub actions: Vec<UserAction>,
    pub patterns: Vec<BehaviorPattern>,
}

/// High-level roll-up for executive dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Current metrics ranked by trend magnitude, largest movers first
    pub top_metrics: Vec<BusinessMetric>,
    /// Most recent insights, newest first
    pub recent_insights: Vec<BusinessInsight>,
    /// Mean signed trend percentage per category (down trends negative)
    pub category_trends: HashMap<MetricCategory, f64>,
    /// Current metrics below their critical achievement fraction
    pub critical_alerts: u64,
    /// Current metrics below their warning achievement fraction
    pub warning_alerts: u64,
    /// Engagement over the period
    pub engagement: EngagementMetrics,
}

// ============================================
// Export
// ============================================

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(format!("unknown export format: {}", s)),
        }
    }
}
