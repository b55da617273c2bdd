//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/studypulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/studypulse/` (~/.config/studypulse/)
//! - State/Logs: `$XDG_STATE_HOME/studypulse/` (~/.local/state/studypulse/)
//!
//! Besides engine tuning knobs, the config file carries the KPI catalog:
//!
//! ```toml
//! [kpis."Monthly Active Users"]
//! formula = "distinct users with at least one session in the month"
//! alerts = { critical = 0.5, warning = 0.85 }
//!
//! [kpis."Monthly Active Users".targets]
//! monthly = 800.0
//! ```

use crate::error::{Error, Result};
use crate::types::KpiConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Engine tuning knobs
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// KPI catalog, keyed by metric name
    #[serde(default)]
    pub kpis: HashMap<String, KpiConfig>,
}

/// Tuning knobs for trend, pattern, and insight rules.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Relative change below this percentage counts as a stable trend
    #[serde(default = "default_stable_trend_pct")]
    pub stable_trend_pct: f64,

    /// Trailing window scanned on every action ingestion, in hours
    #[serde(default = "default_detection_window_hours")]
    pub detection_window_hours: i64,

    /// Power User rule: completions required within its window
    #[serde(default = "default_power_user_completions")]
    pub power_user_completions: u32,

    /// Power User rule: trailing window in minutes
    #[serde(default = "default_power_user_window_minutes")]
    pub power_user_window_minutes: i64,

    /// Struggling User rule: starts required with zero completions
    #[serde(default = "default_struggling_starts")]
    pub struggling_starts: u32,

    /// Insight rule: user-category growth percentage threshold
    #[serde(default = "default_user_growth_pct")]
    pub user_growth_pct: f64,

    /// Insight rule: engagement-category decline percentage threshold
    #[serde(default = "default_engagement_decline_pct")]
    pub engagement_decline_pct: f64,

    /// Insight rule: financial-category growth percentage threshold
    #[serde(default = "default_revenue_growth_pct")]
    pub revenue_growth_pct: f64,

    /// Number of metrics included in the executive summary
    #[serde(default = "default_summary_top_metrics")]
    pub summary_top_metrics: usize,

    /// Number of insights included in the executive summary
    #[serde(default = "default_summary_recent_insights")]
    pub summary_recent_insights: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            stable_trend_pct: default_stable_trend_pct(),
            detection_window_hours: default_detection_window_hours(),
            power_user_completions: default_power_user_completions(),
            power_user_window_minutes: default_power_user_window_minutes(),
            struggling_starts: default_struggling_starts(),
            user_growth_pct: default_user_growth_pct(),
            engagement_decline_pct: default_engagement_decline_pct(),
            revenue_growth_pct: default_revenue_growth_pct(),
            summary_top_metrics: default_summary_top_metrics(),
            summary_recent_insights: default_summary_recent_insights(),
        }
    }
}

fn default_stable_trend_pct() -> f64 {
    2.0
}

fn default_detection_window_hours() -> i64 {
    24
}

fn default_power_user_completions() -> u32 {
    3
}

fn default_power_user_window_minutes() -> i64 {
    60
}

fn default_struggling_starts() -> u32 {
    5
}

fn default_user_growth_pct() -> f64 {
    20.0
}

fn default_engagement_decline_pct() -> f64 {
    15.0
}

fn default_revenue_growth_pct() -> f64 {
    10.0
}

fn default_summary_top_metrics() -> usize {
    5
}

fn default_summary_recent_insights() -> usize {
    10
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configured values that have hard constraints.
    pub fn validate(&self) -> Result<()> {
        if self.analytics.stable_trend_pct < 0.0 {
            return Err(Error::Config(
                "analytics.stable_trend_pct must be non-negative".to_string(),
            ));
        }
        if self.analytics.detection_window_hours <= 0 {
            return Err(Error::Config(
                "analytics.detection_window_hours must be positive".to_string(),
            ));
        }
        for (name, kpi) in &self.kpis {
            if let Some(alerts) = &kpi.alerts {
                if alerts.critical > alerts.warning {
                    return Err(Error::Config(format!(
                        "kpis.{}: critical fraction {} exceeds warning fraction {}",
                        name, alerts.critical, alerts.warning
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up the KPI configuration for a metric name, if any.
    pub fn kpi(&self, metric_name: &str) -> Option<&KpiConfig> {
        self.kpis.get(metric_name)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/studypulse/config.toml`
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("studypulse").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/studypulse/`
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("studypulse")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("studypulse.log")
    }
}
