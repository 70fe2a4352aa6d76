//! Periodic health monitoring of supervised processes.
//!
//! An external scheduler (cron or equivalent) invokes the healthcheck tick
//! every few minutes. The tick is stateless and idempotent: it re-reads
//! the registry and runtime artifacts, decides per process whether to
//! skip, restart, or garbage-collect, applies the decisions, and batches
//! the cycle's findings into at most one alert.
//!
//! The decision itself ([`decision::evaluate`]) is a pure function of the
//! definition, an observation snapshot, the restart ledger, and the clock,
//! which is what makes the boundary cases unit-testable.

pub mod decision;
pub mod tick;

pub use decision::{evaluate, HealthAction, ProcessObservation, RestartReason, SkipReason};
pub use tick::{run_healthcheck, HealthReport};
