//! Durable alerting for the vigil supervisor.
//!
//! Alerts are not transient console output: each one is written as a JSON
//! artifact into an outbox directory and stays there until an external
//! notifier acknowledges it. A slow-polling consumer therefore cannot miss
//! an alert, and delivery clears it. Repeated alerts for the same
//! underlying condition are rate-limited by per-condition cooldown markers.
//!
//! - [`Outbox`]: publish / pending / acknowledge
//! - [`CooldownGate`]: `fire_once` suppression within a window

pub mod cooldown;
pub mod outbox;

pub use cooldown::CooldownGate;
pub use outbox::{Alert, AlertSource, Outbox};
