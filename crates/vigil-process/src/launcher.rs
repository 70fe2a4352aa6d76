//! Detached process launching.
//!
//! `start` never runs the target command itself: it re-execs the current
//! binary as the hidden `wrapper` subcommand, detached into a new session
//! (`setsid`) with null stdio, so the child survives termination of the
//! invoking shell or agent session. The wrapper is the only writer of the
//! runtime artifacts during a run:
//!
//! 1. record the launch time, spawn the command with the log file as
//!    stdout/stderr
//! 2. write the child PID and `state=running`
//! 3. wait for the child, then atomically write
//!    `stopped:<exit_code>:<unix_time>`
//!
//! The PID file is left in place at exit; see [`crate::runtime`].

use std::os::unix::process::CommandExt;
use std::process::Stdio;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use vigil_types::config::LauncherConfig;
use vigil_types::{ProcessDefinition, Result, VigilError};

use crate::registry::DefinitionStore;
use crate::runtime::{is_process_alive, ProcessRuntime, RunState};

/// Poll interval while waiting for the PID artifact.
const CONFIRM_POLL: Duration = Duration::from_millis(100);

/// Outcome of a `stop` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// SIGTERM delivered to this PID and the PID file cleared.
    Signalled(u32),
    /// Nothing was running; warned, no side effect.
    NotRunning,
}

/// Start a registered process fully detached from the caller.
///
/// Fails with [`VigilError::NotRegistered`] for unknown names and
/// [`VigilError::AlreadyRunning`] when a live PID is already tracked.
/// Returns the confirmed child PID, or [`VigilError::LaunchFailure`] with
/// a log tail if no fresh PID artifact appears within the confirmation
/// window. A failed launch leaves any prior PID file untouched so the
/// monitor can keep retrying within the restart budget.
pub fn start(store: &dyn DefinitionStore, name: &str, config: &LauncherConfig) -> Result<u32> {
    let def = store
        .get(name)?
        .ok_or_else(|| VigilError::NotRegistered(name.to_string()))?;

    let runtime = ProcessRuntime::for_name(name);
    runtime.ensure_dir()?;

    if let Some(pid) = runtime.read_pid() {
        if is_process_alive(pid) {
            return Err(VigilError::AlreadyRunning {
                name: name.to_string(),
                pid,
            });
        }
    }

    // A stale PID file from an earlier run stays put: it is the "died"
    // evidence the monitor needs when this launch fails. A fresh launch
    // is confirmed by the wrapper rewriting the artifact, not by its
    // mere presence.
    let prior = runtime.pid_snapshot();

    let binary = std::env::current_exe()?;
    let mut cmd = std::process::Command::new(&binary);
    cmd.args(["wrapper", name])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    // New session: no controlling terminal, immune to the caller's HUP,
    // not a job of the invoking shell.
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid().map_err(std::io::Error::from)?;
            Ok(())
        });
    }

    let wrapper = cmd.spawn()?;
    tracing::info!(name, wrapper_pid = wrapper.id(), "wrapper spawned");

    // Bounded wait for the wrapper to publish the child PID.
    let deadline = Instant::now() + Duration::from_secs(config.confirm_window_secs);
    while Instant::now() < deadline {
        if runtime.pid_snapshot() != prior {
            if let Some(pid) = runtime.read_pid() {
                tracing::info!(name, pid, "process started");
                return Ok(pid);
            }
        }
        std::thread::sleep(CONFIRM_POLL);
    }

    tracing::error!(name, command = %def.command.display(), "no PID within confirmation window");
    Err(VigilError::LaunchFailure {
        name: name.to_string(),
        window_secs: config.confirm_window_secs,
        log_tail: runtime.log_tail(config.log_tail_lines),
    })
}

/// Body of the hidden `wrapper` subcommand, running inside the detached
/// session. Spawns the target command, publishes the runtime artifacts,
/// waits, and records the exit. Returns the child's exit code.
pub fn run_wrapper(store: &dyn DefinitionStore, name: &str) -> Result<i32> {
    let def = store
        .get(name)?
        .ok_or_else(|| VigilError::NotRegistered(name.to_string()))?;

    let runtime = ProcessRuntime::for_name(name);
    runtime.ensure_dir()?;

    let log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(runtime.log_path())?;
    let log_err = log.try_clone()?;

    let started = chrono::Utc::now().timestamp();
    runtime.write_started(started)?;
    log_line(&runtime, &format!("starting: {}", def.command.display()));

    let (program, args) = def.command.argv();
    let child = std::process::Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn();

    let mut child = match child {
        Ok(c) => c,
        Err(e) => {
            // No PID file is written, so `start` times out and surfaces
            // this line in its log-tail diagnostic.
            log_line(&runtime, &format!("spawn failed: {e}"));
            let _ = runtime.write_state(RunState::Stopped {
                exit_code: 127,
                at: chrono::Utc::now().timestamp(),
            });
            return Ok(127);
        }
    };

    runtime.write_pid(child.id())?;
    runtime.write_state(RunState::Running)?;

    let status = child.wait()?;
    // Signal deaths map to 128+N, the shell convention.
    let exit_code = status
        .code()
        .unwrap_or_else(|| 128 + signal_of(&status).unwrap_or(1));

    // Best effort from here: `deregister` may have removed the directory
    // while we were waiting.
    let _ = runtime.write_state(RunState::Stopped {
        exit_code,
        at: chrono::Utc::now().timestamp(),
    });
    log_line(&runtime, &format!("exited with code {exit_code}"));

    Ok(exit_code)
}

/// Send SIGTERM to the tracked PID and clear the PID file.
///
/// Signals but does not guarantee exit: the wrapper records the actual
/// exit when the child goes down, and repeated stop+start is the retry
/// mechanism. Warns (no-op) when nothing is running.
pub fn stop(name: &str) -> Result<StopOutcome> {
    let runtime = ProcessRuntime::for_name(name);

    let Some(pid) = runtime.read_pid() else {
        tracing::warn!(name, "stop: no tracked PID, nothing to do");
        return Ok(StopOutcome::NotRunning);
    };

    if !is_process_alive(pid) {
        tracing::warn!(name, pid, "stop: process already dead, clearing PID file");
        runtime.clear_pid();
        return Ok(StopOutcome::NotRunning);
    }

    if let Ok(raw_pid) = i32::try_from(pid) {
        tracing::info!(name, pid, "sending SIGTERM");
        let _ = signal::kill(Pid::from_raw(raw_pid), Signal::SIGTERM);
    }
    runtime.clear_pid();
    Ok(StopOutcome::Signalled(pid))
}

/// Stop if running, then remove the definition and every runtime artifact.
/// Prevents stale entries from lingering in the registry.
pub fn deregister(store: &dyn DefinitionStore, name: &str) -> Result<bool> {
    stop(name)?;
    let removed = store.remove(name)?;
    ProcessRuntime::for_name(name).remove_all()?;
    if removed {
        tracing::info!(name, "deregistered");
    } else {
        tracing::warn!(name, "deregister: name was not registered");
    }
    Ok(removed)
}

/// One row of human-readable status.
#[derive(Debug, Clone)]
pub struct StatusRow {
    pub name: String,
    pub state: String,
    pub pid: Option<u32>,
    pub command: String,
    pub auto_restart: bool,
    pub restarts: u32,
}

/// Status rows for one name or for every registered definition.
/// Unknown names produce a single "not registered" row; `status` never
/// fails.
pub fn status(store: &dyn DefinitionStore, name: Option<&str>) -> Result<Vec<StatusRow>> {
    let defs: Vec<ProcessDefinition> = match name {
        Some(n) => match store.get(n)? {
            Some(def) => vec![def],
            None => {
                return Ok(vec![StatusRow {
                    name: n.to_string(),
                    state: "not registered".into(),
                    pid: None,
                    command: String::new(),
                    auto_restart: false,
                    restarts: 0,
                }])
            }
        },
        None => store.list()?,
    };

    Ok(defs.into_iter().map(|def| row_for(&def)).collect())
}

fn row_for(def: &ProcessDefinition) -> StatusRow {
    let runtime = ProcessRuntime::for_name(&def.name);
    let pid = runtime.read_pid();
    let alive = pid.is_some_and(is_process_alive);

    let state = if alive {
        "running".to_string()
    } else if !runtime.pid_file_present() && runtime.read_state().is_none() {
        "never started".to_string()
    } else {
        match runtime.read_state() {
            Some(RunState::Stopped { exit_code, at }) => format!("stopped:{exit_code} (at {at})"),
            // PID dead but state still says running: the wrapper died
            // before recording the exit.
            Some(RunState::Running) | None => "dead (exit unrecorded)".to_string(),
        }
    };

    StatusRow {
        name: def.name.clone(),
        state,
        pid: pid.filter(|_| alive),
        command: def.command.display(),
        auto_restart: def.auto_restart,
        restarts: runtime.load_restarts().count,
    }
}

fn signal_of(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

fn log_line(runtime: &ProcessRuntime, message: &str) {
    use std::io::Write;
    let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    if let Ok(mut log) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(runtime.log_path())
    {
        let _ = writeln!(log, "[vigil {ts}] {message}");
    }
}
