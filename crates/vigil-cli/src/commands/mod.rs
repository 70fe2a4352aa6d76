pub mod alerts;
pub mod guard;
pub mod healthcheck;
pub mod process;
pub mod task;

/// Timestamp format for human-readable listings.
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
