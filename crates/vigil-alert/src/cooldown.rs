//! Per-condition cooldown markers that rate-limit repeated alerts.
//!
//! Each condition key maps to a marker file holding the unix time of the
//! last emission. The marker is separate from the alert artifacts so that
//! acknowledging an alert never resets its suppression window.

use std::path::PathBuf;
use std::time::Duration;

use vigil_types::Result;

/// Directory-backed cooldown tracker.
pub struct CooldownGate {
    dir: PathBuf,
}

impl CooldownGate {
    /// Open (creating if needed) a gate rooted at `dir`.
    pub fn open(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the gate at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open(vigil_types::paths::cooldown_dir())
    }

    /// Whether an alert for `key` may fire now, i.e. no prior emission
    /// within `window`.
    pub fn should_fire(&self, key: &str, window: Duration) -> bool {
        let Some(last) = self.read_marker(key) else {
            return true;
        };
        let now = chrono::Utc::now().timestamp();
        now.saturating_sub(last) >= window.as_secs() as i64
    }

    /// Record that an alert for `key` fired now.
    pub fn mark_fired(&self, key: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        std::fs::write(self.marker_path(key), now.to_string())?;
        Ok(())
    }

    /// Combined check-and-mark: returns `true` (and stamps the marker)
    /// exactly once per window for a given key.
    pub fn fire_once(&self, key: &str, window: Duration) -> Result<bool> {
        if !self.should_fire(key, window) {
            tracing::debug!(key, "alert suppressed by cooldown");
            return Ok(false);
        }
        self.mark_fired(key)?;
        Ok(true)
    }

    fn read_marker(&self, key: &str) -> Option<i64> {
        let content = std::fs::read_to_string(self.marker_path(key)).ok()?;
        content.trim().parse().ok()
    }

    fn marker_path(&self, key: &str) -> PathBuf {
        // Keys are caller-chosen condition names; keep filenames tame.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(safe)
    }
}
