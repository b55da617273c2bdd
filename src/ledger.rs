//! Append-only ledger of user actions.
//!
//! Actions are immutable once recorded. A per-user index keeps user-scoped
//! scans (pattern detection, journey queries) bounded by that user's own
//! history instead of the full ledger.

use crate::types::{ActionCategory, ClientMetadata, UserAction};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Ordered, append-only sequence of [`UserAction`] records.
#[derive(Debug, Default)]
pub struct ActionLedger {
    actions: Vec<UserAction>,
    by_user: HashMap<String, Vec<usize>>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action. Always succeeds; appends in insertion order.
    #[allow(clippy::too_many_arguments)]
    pub fn record_at(
        &mut self,
        user_id: &str,
        action: &str,
        category: ActionCategory,
        details: serde_json::Value,
        session_id: &str,
        metadata: Option<ClientMetadata>,
        timestamp: DateTime<Utc>,
    ) -> UserAction {
        let record = UserAction {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            action: action.to_string(),
            category,
            details,
            timestamp,
            session_id: session_id.to_string(),
            metadata,
        };

        let index = self.actions.len();
        self.by_user
            .entry(user_id.to_string())
            .or_default()
            .push(index);
        self.actions.push(record.clone());

        tracing::debug!(
            user_id,
            action,
            category = %record.category,
            session_id,
            "Recorded action"
        );

        record
    }

    /// Actions for one user with timestamps at or after `cutoff`,
    /// oldest first.
    pub fn actions_for_since(&self, user_id: &str, cutoff: DateTime<Utc>) -> Vec<&UserAction> {
        let Some(indices) = self.by_user.get(user_id) else {
            return Vec::new();
        };

        indices
            .iter()
            .map(|&i| &self.actions[i])
            .filter(|a| a.timestamp >= cutoff)
            .collect()
    }

    /// Actions for one user within the trailing `since_minutes` window.
    pub fn actions_for(&self, user_id: &str, since_minutes: i64) -> Vec<&UserAction> {
        self.actions_for_since(user_id, Utc::now() - Duration::minutes(since_minutes))
    }

    /// All recorded actions in insertion order.
    pub fn actions(&self) -> &[UserAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Remove actions recorded before `cutoff`. Returns how many were
    /// removed. The per-user index is rebuilt afterwards.
    pub fn cleanup(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.actions.len();
        self.actions.retain(|a| a.timestamp >= cutoff);
        let removed = before - self.actions.len();

        if removed > 0 {
            self.by_user.clear();
            for (index, action) in self.actions.iter().enumerate() {
                self.by_user
                    .entry(action.user_id.clone())
                    .or_default()
                    .push(index);
            }
        }

        removed
    }
}
