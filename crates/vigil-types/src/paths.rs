//! Filesystem layout under the vigil home directory.
//!
//! All durable state lives under one base directory so that tests (and
//! multi-profile setups) can relocate everything with a single environment
//! variable. `VIGIL_HOME` takes precedence; otherwise `$HOME/.vigil` is used.

use std::path::PathBuf;

/// Base directory for all vigil state.
pub fn vigil_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("VIGIL_HOME") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".vigil")
}

/// Path of the optional TOML configuration file.
pub fn config_path() -> PathBuf {
    vigil_dir().join("config.toml")
}

/// Path of the process-definition registry (JSON map keyed by name).
pub fn registry_path() -> PathBuf {
    vigil_dir().join("registry.json")
}

/// Path of the task-tracker store (JSON map keyed by session key).
pub fn tasks_path() -> PathBuf {
    vigil_dir().join("tasks.json")
}

/// Per-process runtime directory (PID, state, started, log, restarts).
pub fn proc_dir(name: &str) -> PathBuf {
    vigil_dir().join("proc").join(name)
}

/// Directory holding pending alert artifacts, one JSON file each.
pub fn outbox_dir() -> PathBuf {
    vigil_dir().join("alerts").join("outbox")
}

/// Directory holding per-condition cooldown markers.
pub fn cooldown_dir() -> PathBuf {
    vigil_dir().join("alerts").join("cooldown")
}
