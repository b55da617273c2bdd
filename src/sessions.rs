//! Session lifecycle tracking.
//!
//! A session moves from Open (created by `start_session_at`) through zero
//! or more `apply_action` calls to Closed (`end_session_at`). Closed is
//! terminal: late actions and repeated closes are warned no-ops, because
//! ingestion order across a distributed caller is not guaranteed and
//! absence or lateness is an expected steady state.
//!
//! If an action arrives for a session id that was never opened, a minimal
//! session is synthesized (unknown source/device) rather than failing.

use crate::types::{UserAction, UserSession};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// A session shorter than this with at most one page view is a bounce.
const BOUNCE_MAX_DURATION_SECS: i64 = 30;
const BOUNCE_MAX_PAGE_VIEWS: u32 = 1;

/// Tracks all known sessions, open and closed.
#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: HashMap<String, UserSession>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session and return its id.
    pub fn start_session_at(
        &mut self,
        user_id: &str,
        source: &str,
        device: &str,
        location: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let session = UserSession {
            id: id.clone(),
            user_id: user_id.to_string(),
            started_at,
            ended_at: None,
            duration_secs: None,
            page_views: 0,
            actions: 0,
            studies_viewed: 0,
            studies_completed: 0,
            bounced: false,
            source: source.to_string(),
            device: device.to_string(),
            location: location.map(|l| l.to_string()),
        };

        tracing::debug!(session_id = %id, user_id, source, device, "Opened session");
        self.sessions.insert(id.clone(), session);
        id
    }

    /// Apply an action to its session, incrementing the relevant counters.
    ///
    /// Synthesizes a minimal session when the id has not been opened yet.
    /// Actions against a closed session are dropped with a warning.
    pub fn apply_action(&mut self, action: &UserAction) {
        let session = self
            .sessions
            .entry(action.session_id.clone())
            .or_insert_with(|| {
                tracing::warn!(
                    session_id = %action.session_id,
                    user_id = %action.user_id,
                    "Action for unopened session, synthesizing session record"
                );
                UserSession {
                    id: action.session_id.clone(),
                    user_id: action.user_id.clone(),
                    started_at: action.timestamp,
                    ended_at: None,
                    duration_secs: None,
                    page_views: 0,
                    actions: 0,
                    studies_viewed: 0,
                    studies_completed: 0,
                    bounced: false,
                    source: "unknown".to_string(),
                    device: "unknown".to_string(),
                    location: None,
                }
            });

        if session.is_closed() {
            tracing::warn!(
                session_id = %session.id,
                action = %action.action,
                "Dropping action against closed session"
            );
            return;
        }

        session.actions += 1;
        match action.action.as_str() {
            "page_view" => session.page_views += 1,
            "study_view" | "study_start" => session.studies_viewed += 1,
            "study_complete" => session.studies_completed += 1,
            _ => {}
        }
    }

    /// Close a session: stamp the end time, compute duration and the
    /// bounce flag. Unknown or already-closed ids are warned no-ops.
    pub fn end_session_at(&mut self, session_id: &str, ended_at: DateTime<Utc>) {
        let Some(session) = self.sessions.get_mut(session_id) else {
            tracing::warn!(session_id, "end_session for unknown session");
            return;
        };

        if session.is_closed() {
            tracing::warn!(session_id, "end_session for already closed session");
            return;
        }

        let duration = ended_at
            .signed_duration_since(session.started_at)
            .num_seconds()
            .max(0);
        session.ended_at = Some(ended_at);
        session.duration_secs = Some(duration);
        session.bounced =
            duration < BOUNCE_MAX_DURATION_SECS && session.page_views <= BOUNCE_MAX_PAGE_VIEWS;

        tracing::debug!(
            session_id,
            duration_secs = duration,
            bounced = session.bounced,
            "Closed session"
        );
    }

    pub fn get(&self, session_id: &str) -> Option<&UserSession> {
        self.sessions.get(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// All sessions, in no particular order.
    pub fn sessions(&self) -> impl Iterator<Item = &UserSession> {
        self.sessions.values()
    }

    /// Sessions whose start falls within [start, end].
    pub fn sessions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<&UserSession> {
        self.sessions
            .values()
            .filter(|s| s.started_at >= start && s.started_at <= end)
            .collect()
    }

    /// Sessions for one user started at or after `cutoff`, oldest first.
    pub fn sessions_for_user(&self, user_id: &str, cutoff: DateTime<Utc>) -> Vec<UserSession> {
        let mut sessions: Vec<UserSession> = self
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.started_at >= cutoff)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }

    /// First-ever session start per user, across all known sessions.
    pub fn first_session_starts(&self) -> HashMap<&str, DateTime<Utc>> {
        let mut firsts: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for session in self.sessions.values() {
            firsts
                .entry(session.user_id.as_str())
                .and_modify(|first| {
                    if session.started_at < *first {
                        *first = session.started_at;
                    }
                })
                .or_insert(session.started_at);
        }
        firsts
    }

    /// Remove closed sessions that started before `cutoff`. Open sessions
    /// are always kept. Returns how many were removed.
    pub fn cleanup(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| !s.is_closed() || s.started_at >= cutoff);
        before - self.sessions.len()
    }
}
