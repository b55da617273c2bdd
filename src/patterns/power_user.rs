//! Power User rule: repeated study completions in a short window.

use super::{PatternMatch, PatternRule};
use crate::types::{ImpactTier, TriggerConditions, UserAction};
use chrono::{DateTime, Duration, Utc};

const STUDY_COMPLETE: &str = "study_complete";

/// Fires when a user completes at least `min_completions` studies within
/// the trailing `window_minutes`.
pub struct PowerUserRule {
    min_completions: u32,
    window_minutes: i64,
}

impl PowerUserRule {
    pub fn new(min_completions: u32, window_minutes: i64) -> Self {
        Self {
            min_completions,
            window_minutes,
        }
    }
}

impl PatternRule for PowerUserRule {
    fn name(&self) -> &str {
        "Power User"
    }

    fn description(&self) -> &str {
        "Completes multiple studies in quick succession"
    }

    fn trigger(&self) -> TriggerConditions {
        TriggerConditions {
            actions: vec![STUDY_COMPLETE.to_string()],
            timeframe_minutes: self.window_minutes,
            frequency: self.min_completions,
        }
    }

    fn evaluate(
        &self,
        _user_id: &str,
        recent_actions: &[&UserAction],
        now: DateTime<Utc>,
    ) -> Option<PatternMatch> {
        let cutoff = now - Duration::minutes(self.window_minutes);
        let completions = recent_actions
            .iter()
            .filter(|a| a.action == STUDY_COMPLETE && a.timestamp >= cutoff)
            .count() as u32;

        if completions < self.min_completions {
            return None;
        }

        Some(PatternMatch {
            confidence: 0.9,
            impact: ImpactTier::High,
            recommendation: "Surface premium and advanced study content to this segment"
                .to_string(),
        })
    }
}
