//! Struggling User rule: many study starts, no completions.

use super::{PatternMatch, PatternRule};
use crate::types::{ImpactTier, TriggerConditions, UserAction};
use chrono::{DateTime, Utc};

const STUDY_START: &str = "study_start";
const STUDY_COMPLETE: &str = "study_complete";

/// Fires when a user starts at least `min_starts` studies within the
/// trailing window while completing none of them.
pub struct StrugglingUserRule {
    min_starts: u32,
    window_hours: i64,
}

impl StrugglingUserRule {
    pub fn new(min_starts: u32, window_hours: i64) -> Self {
        Self {
            min_starts,
            window_hours,
        }
    }
}

impl PatternRule for StrugglingUserRule {
    fn name(&self) -> &str {
        "Struggling User"
    }

    fn description(&self) -> &str {
        "Starts studies repeatedly without finishing any"
    }

    fn trigger(&self) -> TriggerConditions {
        TriggerConditions {
            actions: vec![STUDY_START.to_string(), STUDY_COMPLETE.to_string()],
            timeframe_minutes: self.window_hours * 60,
            frequency: self.min_starts,
        }
    }

    fn evaluate(
        &self,
        _user_id: &str,
        recent_actions: &[&UserAction],
        _now: DateTime<Utc>,
    ) -> Option<PatternMatch> {
        // The caller already scopes recent_actions to the detection window.
        let starts = recent_actions
            .iter()
            .filter(|a| a.action == STUDY_START)
            .count() as u32;
        let completions = recent_actions
            .iter()
            .filter(|a| a.action == STUDY_COMPLETE)
            .count();

        if starts < self.min_starts || completions > 0 {
            return None;
        }

        Some(PatternMatch {
            confidence: 0.8,
            impact: ImpactTier::Medium,
            recommendation: "Simplify onboarding and offer a guided first study".to_string(),
        })
    }
}
