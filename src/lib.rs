//! # studypulse-core
//!
//! Usage/business analytics engine for the StudyPulse research platform.
//!
//! This library provides:
//! - An append-only ledger of user actions and a session lifecycle tracker
//! - Engagement statistics (bounce rate, retention cohorts, conversion)
//! - Business metric tracking with trend and KPI target-achievement logic
//! - Rule-based behavior pattern detection with recommendations
//! - Insight generation, executive summaries, and JSON/CSV export
//!
//! ## Architecture
//!
//! Ingestion calls (`track_action`, `start_session`, `end_session`,
//! `track_metric`) recompute derived state synchronously; query calls
//! (`calculate_engagement_metrics`, `get_insights`,
//! `generate_executive_summary`) are read-only and computed lazily from
//! current state. All state lives in process memory behind the
//! [`AnalyticsEngine`] handle; persistence is the concern of the
//! surrounding application.
//!
//! ## Example
//!
//! ```rust
//! use studypulse_core::{ActionCategory, AnalyticsEngine, Config, MetricCategory};
//!
//! let engine = AnalyticsEngine::new(Config::default());
//!
//! let session = engine.start_session("user-1", "organic", "desktop", None);
//! engine.track_action(
//!     "user-1",
//!     "study_start",
//!     ActionCategory::Study,
//!     serde_json::json!({"study_id": "s-42"}),
//!     &session,
//!     None,
//! );
//! engine.end_session(&session);
//!
//! engine.track_metric("Monthly Active Users", 650.0, MetricCategory::User, "users");
//! let metrics = engine.get_metrics(Some(MetricCategory::User));
//! assert_eq!(metrics.len(), 1);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use engine::AnalyticsEngine;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod alerts;
pub mod config;
pub mod engagement;
pub mod engine;
pub mod error;
pub mod export;
pub mod insights;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod patterns;
pub mod sessions;
pub mod summary;
pub mod types;
