//! Stuck-task classification and the periodic liveness tick.

use chrono::{DateTime, Utc};

use vigil_alert::{AlertSource, Outbox};
use vigil_types::config::LivenessConfig;
use vigil_types::{Result, TaskRecord, TaskStatus};

use crate::store::TaskStore;

/// Why a running task is considered stuck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuckReason {
    /// Past the no-progress threshold with no output file on disk.
    NoProgress,
    /// Output exists but the task has overrun the hard deadline.
    Overrun,
}

impl StuckReason {
    pub fn describe(&self) -> &'static str {
        match self {
            StuckReason::NoProgress => "no output produced",
            StuckReason::Overrun => "overran deadline",
        }
    }
}

/// What one liveness cycle did.
#[derive(Debug, Default)]
pub struct LivenessReport {
    /// Session keys newly marked alerted this cycle.
    pub alerted: Vec<String>,
    /// Running tasks examined.
    pub checked: usize,
}

/// Classify one task against the liveness thresholds.
///
/// Only `running` tasks are ever stuck; `alerted` tasks have already
/// been escalated once and `done` is terminal. `now` is a parameter so
/// the threshold boundaries are testable without a clock.
pub fn classify(
    record: &TaskRecord,
    now: DateTime<Utc>,
    output_exists: bool,
    config: &LivenessConfig,
) -> Option<StuckReason> {
    if record.status != TaskStatus::Running {
        return None;
    }
    let elapsed = record.elapsed_secs(now);
    if !output_exists && elapsed > config.no_progress_secs {
        return Some(StuckReason::NoProgress);
    }
    if elapsed > config.overrun_secs {
        return Some(StuckReason::Overrun);
    }
    None
}

/// Scan the tracker once and escalate stuck tasks.
///
/// Each stuck task is moved to `alerted` so it fires exactly once; all
/// escalations of the cycle are batched into a single outbox message.
/// Nothing is ever killed here. The alert asks an operator to look.
pub fn run_liveness_check(
    store: &dyn TaskStore,
    outbox: &Outbox,
    config: &LivenessConfig,
) -> Result<LivenessReport> {
    let mut report = LivenessReport::default();
    let now = Utc::now();

    let mut stuck = Vec::new();
    for record in store.list()? {
        if record.status != TaskStatus::Running {
            continue;
        }
        report.checked += 1;

        let output_exists = record.output_file.exists();
        if let Some(reason) = classify(&record, now, output_exists, config) {
            stuck.push((record, reason));
        }
    }

    if !stuck.is_empty() {
        // Publish before any transition. A record marked alerted without
        // a durable artifact would never be re-alerted; a failed publish
        // leaves everything running, to be retried next cycle.
        let lines: Vec<String> = stuck
            .iter()
            .map(|(record, reason)| {
                format!(
                    "- {} ({}): {} after {}s",
                    record.label,
                    record.session_key,
                    reason.describe(),
                    record.elapsed_secs(now)
                )
            })
            .collect();
        outbox.publish(
            AlertSource::Liveness,
            format!("stuck tasks:\n{}", lines.join("\n")),
        )?;

        for (record, reason) in &stuck {
            let key = &record.session_key;
            if let Err(e) = store.transition(key, TaskStatus::Alerted) {
                tracing::warn!(session_key = %key, error = %e, "liveness: could not mark alerted");
                continue;
            }
            tracing::info!(
                session_key = %key,
                label = %record.label,
                reason = reason.describe(),
                "liveness: task stuck"
            );
            report.alerted.push(key.clone());
        }
    }

    tracing::info!(
        checked = report.checked,
        alerted = report.alerted.len(),
        "liveness cycle complete"
    );
    Ok(report)
}
