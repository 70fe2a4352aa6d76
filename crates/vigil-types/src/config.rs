//! Configuration for the vigil supervisor, loaded from `~/.vigil/config.toml`.
//!
//! Every field has a default so a missing or partial file is fine; the
//! common case is running with no config file at all.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};
use crate::paths;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VigilConfig {
    /// Launcher behavior (PID confirmation, diagnostics).
    #[serde(default)]
    pub launcher: LauncherConfig,
    /// Health-monitor behavior (GC age, alert cooldown, completion margin).
    #[serde(default)]
    pub healthcheck: HealthcheckConfig,
    /// Stuck-task detection thresholds.
    #[serde(default)]
    pub liveness: LivenessConfig,
    /// Output-integrity guard settings.
    #[serde(default)]
    pub guard: GuardConfig,
}

impl VigilConfig {
    /// Load from the default config path. A missing file yields defaults;
    /// a malformed file is a hard error rather than silently ignored.
    pub fn load() -> Result<Self> {
        let path = paths::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| VigilError::Config(format!("{}: {e}", path.display())))
    }
}

/// Launcher settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LauncherConfig {
    /// How long `start` waits for the PID artifact to appear.
    #[serde(default = "default_confirm_window_secs")]
    pub confirm_window_secs: u64,
    /// How many log lines to include in a launch-failure diagnostic.
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            confirm_window_secs: default_confirm_window_secs(),
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

fn default_confirm_window_secs() -> u64 {
    5
}

fn default_log_tail_lines() -> usize {
    20
}

/// Health-monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthcheckConfig {
    /// Non-restartable processes dead longer than this are auto-deregistered.
    #[serde(default = "default_gc_after_hours")]
    pub gc_after_hours: u64,
    /// Minimum interval between repeated healthcheck alerts.
    #[serde(default = "default_alert_cooldown_secs")]
    pub alert_cooldown_secs: u64,
    /// An exit with code 0 after at least this percentage of the expected
    /// duration counts as a normal completion, not a crash.
    #[serde(default = "default_completion_pct")]
    pub completion_pct: u8,
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            gc_after_hours: default_gc_after_hours(),
            alert_cooldown_secs: default_alert_cooldown_secs(),
            completion_pct: default_completion_pct(),
        }
    }
}

fn default_gc_after_hours() -> u64 {
    24
}

fn default_alert_cooldown_secs() -> u64 {
    900
}

fn default_completion_pct() -> u8 {
    80
}

/// Stuck-task detection thresholds. Pure detection SLAs; nothing is killed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LivenessConfig {
    /// A running task older than this with no output file is stuck.
    #[serde(default = "default_no_progress_secs")]
    pub no_progress_secs: u64,
    /// A running task older than this is stuck regardless of output.
    #[serde(default = "default_overrun_secs")]
    pub overrun_secs: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            no_progress_secs: default_no_progress_secs(),
            overrun_secs: default_overrun_secs(),
        }
    }
}

fn default_no_progress_secs() -> u64 {
    300
}

fn default_overrun_secs() -> u64 {
    900
}

/// Output-integrity guard settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuardConfig {
    /// Outputs smaller than this (but non-empty) are flagged for review.
    #[serde(default = "default_min_plausible_bytes")]
    pub min_plausible_bytes: u64,
    /// Filesystem prefixes the downstream consumer cannot resolve; any
    /// occurrence in an output is flagged for redaction.
    #[serde(default = "default_internal_path_prefixes")]
    pub internal_path_prefixes: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            min_plausible_bytes: default_min_plausible_bytes(),
            internal_path_prefixes: default_internal_path_prefixes(),
        }
    }
}

fn default_min_plausible_bytes() -> u64 {
    64
}

fn default_internal_path_prefixes() -> Vec<String> {
    vec!["/root/".into(), "/home/".into(), "/Users/".into()]
}
