//! Error types shared across all vigil crates.

/// Errors that can occur across the vigil runtime.
///
/// Premature exits, stale definitions, and stuck tasks are not errors:
/// they are monitor outcomes, logged and alerted rather than propagated.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    #[error("process '{0}' is not registered")]
    NotRegistered(String),

    #[error("process '{name}' is already running (PID {pid})")]
    AlreadyRunning { name: String, pid: u32 },

    #[error("launch of '{name}' failed: no PID appeared within {window_secs}s\n--- log tail ---\n{log_tail}")]
    LaunchFailure {
        name: String,
        window_secs: u64,
        log_tail: String,
    },

    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, VigilError>;
