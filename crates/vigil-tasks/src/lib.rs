//! Task tracking and liveness detection for delegated async tasks.
//!
//! The orchestrator registers every sub-agent task *before* dispatch,
//! which starts the SLA clock. A periodic liveness tick classifies
//! running tasks as stuck at two escalating thresholds; classification is
//! advisory only -- nothing here ever kills a task, the alert just asks an
//! operator to decide. Before a completed task's result is relayed
//! onward, the output guard checks it for integrity and leakage.

pub mod guard;
pub mod liveness;
pub mod store;

pub use guard::{inspect_output, Finding, GuardReport, Verdict};
pub use liveness::{classify, run_liveness_check, LivenessReport, StuckReason};
pub use store::{complete, track, FileTaskStore, TaskStore};
