//! Task-tracker records for in-flight asynchronous delegated tasks.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracked task.
///
/// Transitions are forward-only: `Running -> Alerted -> Done` or
/// `Running -> Done`. No edge ever returns to `Running`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Dispatched, SLA clock running.
    Running,
    /// Classified as stuck; an alert has been emitted. Not re-alerted.
    Alerted,
    /// Completed. Terminal.
    Done,
}

impl TaskStatus {
    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Running, TaskStatus::Alerted)
                | (TaskStatus::Running, TaskStatus::Done)
                | (TaskStatus::Alerted, TaskStatus::Done)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Running => "running",
            TaskStatus::Alerted => "alerted",
            TaskStatus::Done => "done",
        };
        f.write_str(s)
    }
}

/// One in-flight (or finished) delegated task, keyed by `session_key`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRecord {
    /// Unique key of the delegated session.
    pub session_key: String,
    /// Human-readable label for reports.
    pub label: String,
    /// When the orchestrator registered the task, before dispatch.
    pub spawn_time: DateTime<Utc>,
    /// File the task is expected to produce. Its existence is the
    /// progress signal for liveness classification.
    pub output_file: PathBuf,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Set when the task reaches `Done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Seconds elapsed since spawn, saturating at zero for clock skew.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.spawn_time).num_seconds().max(0) as u64
    }
}
