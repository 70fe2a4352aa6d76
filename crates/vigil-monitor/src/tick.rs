//! The effectful healthcheck scan.

use std::time::Duration;

use vigil_alert::{AlertSource, CooldownGate, Outbox};
use vigil_process::{launcher, DefinitionStore, ProcessRuntime, RestartLedger};
use vigil_types::{Result, VigilConfig};

use crate::decision::{evaluate, HealthAction, ProcessObservation, SkipReason};

/// Cooldown key for the batched healthcheck alert.
const ALERT_KEY: &str = "healthcheck";

/// What one healthcheck cycle did.
#[derive(Debug, Default)]
pub struct HealthReport {
    /// Names restarted this cycle.
    pub restarted: Vec<String>,
    /// Names garbage-collected this cycle.
    pub collected: Vec<String>,
    /// Alert lines queued this cycle (restarts, launch failures).
    pub alert_lines: Vec<String>,
    /// Definitions examined.
    pub scanned: usize,
}

impl HealthReport {
    /// Whether the cycle changed anything. Drives the CLI exit code:
    /// 0 = nothing to do, non-zero = restarts/GC occurred.
    pub fn acted(&self) -> bool {
        !self.restarted.is_empty() || !self.collected.is_empty()
    }
}

/// Scan every registered definition once and apply health decisions.
///
/// Per-item failures are logged and skipped; one bad entry never aborts
/// the scan. All alert lines of the cycle are batched into a single
/// outbox message, suppressed when a healthcheck alert already fired
/// within the cooldown window.
pub fn run_healthcheck(
    store: &dyn DefinitionStore,
    outbox: &Outbox,
    gate: &CooldownGate,
    config: &VigilConfig,
) -> Result<HealthReport> {
    let mut report = HealthReport::default();
    let now_unix = chrono::Utc::now().timestamp();

    for def in store.list()? {
        report.scanned += 1;
        let name = def.name.clone();
        if let Err(e) = check_one(store, &def, now_unix, config, &mut report) {
            tracing::warn!(name, error = %e, "healthcheck: skipping entry after error");
        }
    }

    if !report.alert_lines.is_empty() {
        let window = Duration::from_secs(config.healthcheck.alert_cooldown_secs);
        if gate.fire_once(ALERT_KEY, window)? {
            let text = format!(
                "healthcheck cycle report:\n{}",
                report.alert_lines.join("\n")
            );
            outbox.publish(AlertSource::Healthcheck, text)?;
        }
    }

    tracing::info!(
        scanned = report.scanned,
        restarted = report.restarted.len(),
        collected = report.collected.len(),
        "healthcheck cycle complete"
    );
    Ok(report)
}

fn check_one(
    store: &dyn DefinitionStore,
    def: &vigil_types::ProcessDefinition,
    now_unix: i64,
    config: &VigilConfig,
    report: &mut HealthReport,
) -> Result<()> {
    let name = &def.name;
    let runtime = ProcessRuntime::for_name(name);
    let obs = observe(&runtime);
    let ledger = runtime.load_restarts();

    match evaluate(def, &obs, &ledger, now_unix, &config.healthcheck) {
        HealthAction::Skip(reason) => {
            if reason == SkipReason::RestartsExhausted {
                tracing::warn!(name, count = ledger.count, "restart budget exhausted, leaving stopped");
            } else {
                tracing::debug!(name, ?reason, "healthcheck: skip");
            }
        }
        HealthAction::Restart(reason) => {
            tracing::info!(name, reason = %reason.describe(), "healthcheck: restarting");
            runtime.save_restarts(&RestartLedger {
                count: ledger.count + 1,
                last_restart_unix: Some(now_unix),
            })?;
            match launcher::start(store, name, &config.launcher) {
                Ok(pid) => {
                    report.restarted.push(name.clone());
                    report
                        .alert_lines
                        .push(format!("- {name}: {} -> restarted (PID {pid})", reason.describe()));
                }
                Err(e) => {
                    tracing::error!(name, error = %e, "healthcheck: restart failed");
                    report
                        .alert_lines
                        .push(format!("- {name}: {} -> restart FAILED: {e}", reason.describe()));
                }
            }
        }
        HealthAction::GarbageCollect => {
            tracing::info!(name, "healthcheck: garbage-collecting abandoned process");
            launcher::deregister(store, name)?;
            report.collected.push(name.clone());
        }
    }
    Ok(())
}

fn observe(runtime: &ProcessRuntime) -> ProcessObservation {
    let pid = runtime.read_pid();
    ProcessObservation {
        pid_file_present: runtime.pid_file_present(),
        pid_alive: pid.is_some_and(vigil_process::is_process_alive),
        last_state: runtime.read_state(),
        started_unix: runtime.read_started(),
    }
}
