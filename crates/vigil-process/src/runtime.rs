//! Per-process runtime artifacts.
//!
//! Each registered name owns a directory with:
//! - `pid`: the raw child PID. Written at launch, removed only by `stop`
//!   or `deregister` -- it survives child exit so the monitor can tell
//!   "never started" (no file) from "died" (file + dead PID).
//! - `state`: `running` or `stopped:<exit_code>:<unix_time>`, replaced
//!   atomically via temp file + rename.
//! - `started`: unix time of the last launch.
//! - `log`: append-only combined stdout/stderr of the child.
//! - `restarts.json`: monitor restart ledger (count + last restart time).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use vigil_types::{Result, VigilError};

/// Last-known execution state of one process instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped { exit_code: i32, at: i64 },
}

impl RunState {
    /// Render to the on-disk format.
    pub fn to_state_string(self) -> String {
        match self {
            RunState::Running => "running".to_string(),
            RunState::Stopped { exit_code, at } => format!("stopped:{exit_code}:{at}"),
        }
    }

    /// Parse the on-disk format. Returns `None` for anything malformed,
    /// which callers treat the same as an absent state file.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s == "running" {
            return Some(RunState::Running);
        }
        let mut parts = s.split(':');
        if parts.next() != Some("stopped") {
            return None;
        }
        let exit_code = parts.next()?.parse().ok()?;
        let at = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(RunState::Stopped { exit_code, at })
    }
}

/// Monitor-maintained restart bookkeeping for one process.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestartLedger {
    /// Restarts performed by the health monitor since registration.
    pub count: u32,
    /// Unix time of the last monitor-initiated restart.
    pub last_restart_unix: Option<i64>,
}

/// Handle on one process's runtime directory.
pub struct ProcessRuntime {
    dir: PathBuf,
}

impl ProcessRuntime {
    /// Runtime handle for a registered name, at the default location.
    pub fn for_name(name: &str) -> Self {
        Self {
            dir: vigil_types::paths::proc_dir(name),
        }
    }

    /// Runtime handle rooted at an explicit directory (tests).
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Ensure the runtime directory exists.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Remove the whole runtime directory. Used by `deregister`.
    pub fn remove_all(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dir.join("pid")
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join("state")
    }

    pub fn started_path(&self) -> PathBuf {
        self.dir.join("started")
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join("log")
    }

    fn restarts_path(&self) -> PathBuf {
        self.dir.join("restarts.json")
    }

    /// Record the PID of a freshly launched child.
    pub fn write_pid(&self, pid: u32) -> Result<()> {
        self.ensure_dir()?;
        std::fs::write(self.pid_path(), pid.to_string())?;
        Ok(())
    }

    /// The tracked PID, if a PID file is present and parseable.
    pub fn read_pid(&self) -> Option<u32> {
        let content = std::fs::read_to_string(self.pid_path()).ok()?;
        content.trim().parse().ok()
    }

    /// Whether a PID file exists at all (parseable or not).
    pub fn pid_file_present(&self) -> bool {
        self.pid_path().exists()
    }

    /// Content and mtime of the PID file, or `None` when absent. The
    /// launcher compares snapshots to detect a fresh write without ever
    /// removing a stale file -- a dead PID left in place is what lets the
    /// monitor tell "died" from "never started" after a failed launch.
    pub fn pid_snapshot(&self) -> Option<(String, std::time::SystemTime)> {
        let content = std::fs::read_to_string(self.pid_path()).ok()?;
        let mtime = std::fs::metadata(self.pid_path()).ok()?.modified().ok()?;
        Some((content, mtime))
    }

    /// Remove the PID file. Only `stop` and `deregister` call this.
    pub fn clear_pid(&self) {
        if let Err(e) = std::fs::remove_file(self.pid_path()) {
            tracing::debug!(error = %e, "failed to remove PID file (may not exist)");
        }
    }

    /// Replace the state file atomically.
    pub fn write_state(&self, state: RunState) -> Result<()> {
        self.ensure_dir()?;
        let tmp = self.dir.join("state.tmp");
        std::fs::write(&tmp, state.to_state_string())?;
        std::fs::rename(&tmp, self.state_path())?;
        Ok(())
    }

    /// Last recorded state, if any.
    pub fn read_state(&self) -> Option<RunState> {
        let content = std::fs::read_to_string(self.state_path()).ok()?;
        RunState::parse(&content)
    }

    /// Record the unix time of the current launch.
    pub fn write_started(&self, unix_time: i64) -> Result<()> {
        self.ensure_dir()?;
        std::fs::write(self.started_path(), unix_time.to_string())?;
        Ok(())
    }

    /// Unix time of the last launch, if recorded.
    pub fn read_started(&self) -> Option<i64> {
        let content = std::fs::read_to_string(self.started_path()).ok()?;
        content.trim().parse().ok()
    }

    /// Load the restart ledger; a missing or unreadable file is an empty
    /// ledger so one bad entry never wedges the monitor.
    pub fn load_restarts(&self) -> RestartLedger {
        std::fs::read_to_string(self.restarts_path())
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Persist the restart ledger.
    pub fn save_restarts(&self, ledger: &RestartLedger) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string(ledger)
            .map_err(|e| VigilError::Store(format!("serialize restart ledger: {e}")))?;
        std::fs::write(self.restarts_path(), json)?;
        Ok(())
    }

    /// Last `lines` lines of the log, for launch-failure diagnostics.
    pub fn log_tail(&self, lines: usize) -> String {
        tail_of_file(&self.log_path(), lines)
    }
}

/// Check whether a process with the given PID is alive.
///
/// `kill(pid, None)` probes existence without delivering a signal. PIDs
/// that would wrap negative when cast to i32 are rejected up front --
/// a negative value would probe a process group instead.
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(raw_pid) = i32::try_from(pid) else {
        return false;
    };
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(raw_pid), None).is_ok()
}

fn tail_of_file(path: &Path, lines: usize) -> String {
    let Ok(content) = std::fs::read_to_string(path) else {
        return String::from("(no log output)");
    };
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn runtime() -> (TempDir, ProcessRuntime) {
        let tmp = TempDir::new().unwrap();
        let rt = ProcessRuntime::at(tmp.path().join("job-a"));
        (tmp, rt)
    }

    #[test]
    fn state_string_roundtrip() {
        assert_eq!(RunState::parse("running"), Some(RunState::Running));
        assert_eq!(
            RunState::parse("stopped:0:1700000000"),
            Some(RunState::Stopped { exit_code: 0, at: 1_700_000_000 })
        );
        assert_eq!(
            RunState::parse(&RunState::Stopped { exit_code: 137, at: 42 }.to_state_string()),
            Some(RunState::Stopped { exit_code: 137, at: 42 })
        );
    }

    #[test]
    fn state_parse_rejects_malformed() {
        assert_eq!(RunState::parse("stopped"), None);
        assert_eq!(RunState::parse("stopped:x:1"), None);
        assert_eq!(RunState::parse("stopped:0:1:extra"), None);
        assert_eq!(RunState::parse("paused"), None);
        assert_eq!(RunState::parse(""), None);
    }

    #[test]
    fn pid_snapshot_tracks_rewrites() {
        let (_tmp, rt) = runtime();
        assert!(rt.pid_snapshot().is_none());

        rt.write_pid(100).unwrap();
        let first = rt.pid_snapshot();
        assert!(first.is_some());

        rt.write_pid(200).unwrap();
        assert_ne!(rt.pid_snapshot(), first);
    }

    #[test]
    fn pid_file_survives_until_cleared() {
        let (_tmp, rt) = runtime();
        rt.write_pid(12345).unwrap();
        assert!(rt.pid_file_present());
        assert_eq!(rt.read_pid(), Some(12345));

        rt.clear_pid();
        assert!(!rt.pid_file_present());
        assert_eq!(rt.read_pid(), None);
    }

    #[test]
    fn state_write_is_readable_back() {
        let (_tmp, rt) = runtime();
        rt.write_state(RunState::Running).unwrap();
        assert_eq!(rt.read_state(), Some(RunState::Running));

        rt.write_state(RunState::Stopped { exit_code: 1, at: 99 }).unwrap();
        assert_eq!(rt.read_state(), Some(RunState::Stopped { exit_code: 1, at: 99 }));
    }

    #[test]
    fn started_roundtrip() {
        let (_tmp, rt) = runtime();
        assert_eq!(rt.read_started(), None);
        rt.write_started(1_700_000_123).unwrap();
        assert_eq!(rt.read_started(), Some(1_700_000_123));
    }

    #[test]
    fn restart_ledger_defaults_when_absent() {
        let (_tmp, rt) = runtime();
        assert_eq!(rt.load_restarts(), RestartLedger::default());

        let ledger = RestartLedger { count: 2, last_restart_unix: Some(1000) };
        rt.save_restarts(&ledger).unwrap();
        assert_eq!(rt.load_restarts(), ledger);
    }

    #[test]
    fn log_tail_returns_last_lines() {
        let (_tmp, rt) = runtime();
        rt.ensure_dir().unwrap();
        let body: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        std::fs::write(rt.log_path(), body).unwrap();

        let tail = rt.log_tail(3);
        assert_eq!(tail, "line 28\nline 29\nline 30");
    }

    #[test]
    fn log_tail_without_log_is_placeholder() {
        let (_tmp, rt) = runtime();
        assert_eq!(rt.log_tail(5), "(no log output)");
    }

    #[test]
    fn current_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn bogus_pid_is_not_alive() {
        assert!(!is_process_alive(u32::MAX));
    }

    #[test]
    fn remove_all_is_idempotent() {
        let (_tmp, rt) = runtime();
        rt.write_pid(1).unwrap();
        rt.remove_all().unwrap();
        assert!(!rt.pid_file_present());
        rt.remove_all().unwrap();
    }
}
