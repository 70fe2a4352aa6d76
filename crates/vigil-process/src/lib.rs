//! Process registry and detached launcher.
//!
//! The registry is a JSON file of [`ProcessDefinition`]s behind the narrow
//! [`DefinitionStore`] seam; per-process runtime artifacts (PID, state,
//! start time, log, restart ledger) live in a directory per name. The
//! launcher starts commands fully detached from the invoking session so
//! that killing the caller never kills the child.
//!
//! Concurrency model: no locking. The registry and runtime files are
//! last-writer-wins, and every reader re-reads instead of caching. A
//! concurrent `start` and `healthcheck` on the same name can race; with
//! cron-cadence invocation both sides converge on the next tick, so the
//! race is documented rather than "fixed" with a different model.

pub mod launcher;
pub mod registry;
pub mod runtime;

pub use launcher::{deregister, run_wrapper, start, status, stop, StatusRow, StopOutcome};
pub use registry::{DefinitionStore, FileDefinitionStore};
pub use runtime::{is_process_alive, ProcessRuntime, RestartLedger, RunState};
