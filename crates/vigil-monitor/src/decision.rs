//! Pure per-process health decisions.

use vigil_process::{RestartLedger, RunState};
use vigil_types::config::HealthcheckConfig;
use vigil_types::ProcessDefinition;

/// Snapshot of one process's runtime artifacts at scan time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessObservation {
    /// Whether a PID file exists (parseable or not).
    pub pid_file_present: bool,
    /// Whether the tracked PID is alive right now.
    pub pid_alive: bool,
    /// Last recorded state, if any.
    pub last_state: Option<RunState>,
    /// Unix time of the last launch, if recorded.
    pub started_unix: Option<i64>,
}

/// What the monitor should do for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthAction {
    Skip(SkipReason),
    Restart(RestartReason),
    /// Abandoned non-restartable process; auto-deregister quietly.
    GarbageCollect,
}

/// Why a dead-or-absent process is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No PID file: the process was never started (or was deliberately
    /// stopped). Starting is an operator decision, not the monitor's.
    NeverStarted,
    /// Tracked PID is alive.
    Healthy,
    /// Clean exit after enough of the expected duration.
    NormalCompletion,
    /// `auto_restart` is off and the body is not old enough to collect.
    NoRestartPolicy,
    /// Restart budget spent; left stopped, surfaced in `status`.
    RestartsExhausted,
    /// A restart happened too recently; wait out the cooldown.
    CoolingDown,
}

/// Why a process is being restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// Indefinite process (`duration_minutes == 0`) found dead.
    MustRunForever,
    /// Died before its expected duration, or with a nonzero code.
    PrematureExit { exit_code: i32 },
    /// PID dead but state never left `running`: the wrapper was killed
    /// before it could record the exit. Treated as a crash.
    UnrecordedExit,
}

/// Decide what to do about one process.
///
/// `now_unix` is passed in rather than read from the clock so boundary
/// cases (24 h GC age, 80% completion margin, restart cooldown) are
/// directly testable.
pub fn evaluate(
    def: &ProcessDefinition,
    obs: &ProcessObservation,
    ledger: &RestartLedger,
    now_unix: i64,
    config: &HealthcheckConfig,
) -> HealthAction {
    if !obs.pid_file_present {
        return HealthAction::Skip(SkipReason::NeverStarted);
    }
    if obs.pid_alive {
        return HealthAction::Skip(SkipReason::Healthy);
    }

    // Dead with a PID file: crashed, completed, or abandoned.
    let stopped = match obs.last_state {
        Some(RunState::Stopped { exit_code, at }) => Some((exit_code, at)),
        Some(RunState::Running) | None => None,
    };

    if !def.auto_restart {
        let dead_since = stopped.map(|(_, at)| at).or(obs.started_unix);
        let gc_age_secs = (config.gc_after_hours * 3600) as i64;
        return match dead_since {
            Some(since) if now_unix - since > gc_age_secs => HealthAction::GarbageCollect,
            // Unknown death time: keep it until a recorded exit ages out.
            _ => HealthAction::Skip(SkipReason::NoRestartPolicy),
        };
    }

    // Clean exit near the expected duration is a normal completion.
    if let (Some(expected), Some((0, at))) = (def.expected_runtime_secs(), stopped) {
        if let Some(started) = obs.started_unix {
            let ran_secs = (at - started).max(0) as u64;
            let threshold = expected * config.completion_pct as u64 / 100;
            if ran_secs >= threshold {
                return HealthAction::Skip(SkipReason::NormalCompletion);
            }
        }
    }

    // Crash path: bounded and rate-limited.
    if def.max_restarts > 0 && ledger.count >= def.max_restarts {
        return HealthAction::Skip(SkipReason::RestartsExhausted);
    }
    if let Some(last) = ledger.last_restart_unix {
        if now_unix - last < def.restart_cooldown_seconds as i64 {
            return HealthAction::Skip(SkipReason::CoolingDown);
        }
    }

    HealthAction::Restart(match stopped {
        None => RestartReason::UnrecordedExit,
        // Indefinite processes have no "normal" exit.
        Some(_) if def.duration_minutes == 0 => RestartReason::MustRunForever,
        Some((exit_code, _)) => RestartReason::PrematureExit { exit_code },
    })
}

impl RestartReason {
    /// Short phrase for alert lines and logs.
    pub fn describe(&self) -> String {
        match self {
            RestartReason::MustRunForever => "indefinite process found dead".to_string(),
            RestartReason::PrematureExit { exit_code } => {
                format!("premature exit (code {exit_code})")
            }
            RestartReason::UnrecordedExit => "died without recording an exit".to_string(),
        }
    }
}
