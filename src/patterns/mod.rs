//! Behavior pattern detection
//!
//! Rules consume a user's recent actions and classify recurring behavior
//! into named patterns with a recommendation attached.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    PATTERN DETECTOR                        │
//! │                                                            │
//! │  ┌────────────┐  ┌──────────────────┐                      │
//! │  │ Power User │  │ Struggling User  │  ...                 │
//! │  └─────┬──────┘  └────────┬─────────┘                      │
//! │        │                  │                                │
//! │        ▼                  ▼                                │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │        PatternDetector::detect_for_user()        │      │
//! │  │  - Evaluates each rule over recent actions       │      │
//! │  │  - Upserts matches into the pattern list         │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Detection runs synchronously after every recorded action, scoped to
//! that action's user and a trailing window, so its cost is bounded by
//! the window rather than total ledger size.

pub mod power_user;
pub mod struggling_user;

use crate::config::AnalyticsConfig;
use crate::types::{BehaviorPattern, ImpactTier, TriggerConditions, UserAction};
use chrono::{DateTime, Utc};

pub use power_user::PowerUserRule;
pub use struggling_user::StrugglingUserRule;

/// Output of a rule that matched: the classification to attach.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// Detection confidence in [0, 1]
    pub confidence: f64,
    /// Impact tier
    pub impact: ImpactTier,
    /// Suggested follow-up for matched users
    pub recommendation: String,
}

/// Trait implemented by every pattern rule.
///
/// Rules are stateless classifiers over one user's recent actions. They
/// should be deterministic and cheap: `evaluate` runs inline with action
/// ingestion.
pub trait PatternRule: Send + Sync {
    /// Pattern name, e.g. "Power User". Doubles as the upsert key.
    fn name(&self) -> &str;

    /// What the pattern means.
    fn description(&self) -> &str;

    /// The conditions this rule scans for.
    fn trigger(&self) -> TriggerConditions;

    /// Evaluate one user's recent actions (oldest first) against this
    /// rule. Returns `Some` when the pattern currently holds.
    fn evaluate(
        &self,
        user_id: &str,
        recent_actions: &[&UserAction],
        now: DateTime<Utc>,
    ) -> Option<PatternMatch>;
}

/// Runs registered rules and owns the detected-pattern list.
#[derive(Default)]
pub struct PatternDetector {
    rules: Vec<Box<dyn PatternRule>>,
    patterns: Vec<BehaviorPattern>,
}

impl PatternDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule with the detector.
    pub fn register(&mut self, rule: Box<dyn PatternRule>) {
        tracing::info!(rule = rule.name(), "Registered pattern rule");
        self.rules.push(rule);
    }

    /// Names of all registered rules.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate every rule against one user's recent actions, upserting
    /// matches. A pattern already listing the user is left untouched.
    pub fn detect_for_user(
        &mut self,
        user_id: &str,
        recent_actions: &[&UserAction],
        now: DateTime<Utc>,
    ) {
        for rule in &self.rules {
            let Some(matched) = rule.evaluate(user_id, recent_actions, now) else {
                continue;
            };

            if let Some(pattern) = self.patterns.iter_mut().find(|p| p.name == rule.name()) {
                if !pattern.users.iter().any(|u| u == user_id) {
                    tracing::info!(
                        pattern = %pattern.name,
                        user_id,
                        "User added to existing behavior pattern"
                    );
                    pattern.users.push(user_id.to_string());
                }
            } else {
                tracing::info!(pattern = rule.name(), user_id, "Detected new behavior pattern");
                self.patterns.push(BehaviorPattern {
                    name: rule.name().to_string(),
                    description: rule.description().to_string(),
                    trigger: rule.trigger(),
                    users: vec![user_id.to_string()],
                    confidence: matched.confidence,
                    impact: matched.impact,
                    recommendation: matched.recommendation,
                    detected_at: now,
                });
            }
        }
    }

    /// Detected patterns, optionally filtered by impact tier.
    pub fn patterns(&self, impact: Option<ImpactTier>) -> Vec<BehaviorPattern> {
        self.patterns
            .iter()
            .filter(|p| impact.map(|tier| p.impact == tier).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Patterns that currently list the given user.
    pub fn patterns_for_user(&self, user_id: &str) -> Vec<BehaviorPattern> {
        self.patterns
            .iter()
            .filter(|p| p.users.iter().any(|u| u == user_id))
            .cloned()
            .collect()
    }
}

/// Build a detector with the built-in rules, thresholds taken from config.
pub fn create_default_detector(config: &AnalyticsConfig) -> PatternDetector {
    let mut detector = PatternDetector::new();
    detector.register(Box::new(PowerUserRule::new(
        config.power_user_completions,
        config.power_user_window_minutes,
    )));
    detector.register(Box::new(StrugglingUserRule::new(
        config.struggling_starts,
        config.detection_window_hours,
    )));
    detector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionCategory;
    use serde_json::json;

    struct AlwaysMatch;

    impl PatternRule for AlwaysMatch {
        fn name(&self) -> &str {
            "Always"
        }

        fn description(&self) -> &str {
            "matches everything"
        }

        fn trigger(&self) -> TriggerConditions {
            TriggerConditions {
                actions: vec![],
                timeframe_minutes: 60,
                frequency: 0,
            }
        }

        fn evaluate(
            &self,
            _user_id: &str,
            _recent_actions: &[&UserAction],
            _now: DateTime<Utc>,
        ) -> Option<PatternMatch> {
            Some(PatternMatch {
                confidence: 1.0,
                impact: ImpactTier::Low,
                recommendation: "none".to_string(),
            })
        }
    }

    fn make_action(user: &str, verb: &str, ts: DateTime<Utc>) -> UserAction {
        UserAction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.to_string(),
            action: verb.to_string(),
            category: ActionCategory::Study,
            details: json!({}),
            timestamp: ts,
            session_id: "s1".to_string(),
            metadata: None,
        }
    }

    #[test]
    fn test_upsert_is_idempotent_per_user() {
        let mut detector = PatternDetector::new();
        detector.register(Box::new(AlwaysMatch));

        let now = Utc::now();
        let action = make_action("u1", "page_view", now);
        detector.detect_for_user("u1", &[&action], now);
        detector.detect_for_user("u1", &[&action], now);

        let patterns = detector.patterns(None);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].users, vec!["u1".to_string()]);
    }

    #[test]
    fn test_second_user_joins_existing_pattern() {
        let mut detector = PatternDetector::new();
        detector.register(Box::new(AlwaysMatch));

        let now = Utc::now();
        let a1 = make_action("u1", "page_view", now);
        let a2 = make_action("u2", "page_view", now);
        detector.detect_for_user("u1", &[&a1], now);
        detector.detect_for_user("u2", &[&a2], now);

        let patterns = detector.patterns(None);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].users.len(), 2);
    }

    #[test]
    fn test_impact_filter() {
        let mut detector = PatternDetector::new();
        detector.register(Box::new(AlwaysMatch));

        let now = Utc::now();
        let action = make_action("u1", "page_view", now);
        detector.detect_for_user("u1", &[&action], now);

        assert_eq!(detector.patterns(Some(ImpactTier::Low)).len(), 1);
        assert!(detector.patterns(Some(ImpactTier::High)).is_empty());
    }

    #[test]
    fn test_default_detector_rules() {
        let detector = create_default_detector(&AnalyticsConfig::default());
        let names = detector.rule_names();
        assert!(names.contains(&"Power User"));
        assert!(names.contains(&"Struggling User"));
    }
}
