//! Shared types for the vigil supervisor.
//!
//! This crate defines the data model used across all vigil crates:
//!
//! - [`ProcessDefinition`] and [`CommandSpec`]: what the registry stores
//! - [`TaskRecord`] and [`TaskStatus`]: what the task tracker stores
//! - [`VigilError`]: the error enum shared by every subsystem
//! - [`VigilConfig`]: configuration loaded from `~/.vigil/config.toml`
//! - [`paths`]: home-directory layout helpers

pub mod config;
pub mod error;
pub mod paths;
pub mod process;
pub mod task;

pub use config::VigilConfig;
pub use error::{Result, VigilError};
pub use process::{CommandSpec, ProcessDefinition};
pub use task::{TaskRecord, TaskStatus};
