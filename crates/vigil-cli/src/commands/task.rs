//! Task tracker commands: track, complete, check, list.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use vigil_alert::Outbox;
use vigil_tasks::{run_liveness_check, FileTaskStore, TaskStore};
use vigil_types::VigilConfig;

use crate::commands::DATETIME_FMT;

/// Run the `vigil task track` command.
pub fn track(session_key: &str, label: &str, output: &Path) -> Result<()> {
    let store = FileTaskStore::open_default();
    let record = vigil_tasks::track(&store, session_key, label, output)?;
    println!(
        "Tracking '{}' ({session_key}), expecting {}.",
        record.label,
        record.output_file.display()
    );
    Ok(())
}

/// Run the `vigil task complete` command.
pub fn complete(session_key: &str) -> Result<()> {
    let store = FileTaskStore::open_default();
    let record = vigil_tasks::complete(&store, session_key)?;
    println!("Task '{}' ({session_key}) marked done.", record.label);
    Ok(())
}

/// Run the `vigil task check` command: one liveness cycle. Stuck tasks
/// go to the alert outbox; exit code 1 when anything was newly escalated.
pub fn check() -> Result<i32> {
    let config = VigilConfig::load().context("failed to load config")?;
    let store = FileTaskStore::open_default();
    let outbox = Outbox::open_default().context("failed to open alert outbox")?;

    let report = run_liveness_check(&store, &outbox, &config.liveness)?;
    println!(
        "Checked {} running task(s): {} newly stuck.",
        report.checked,
        report.alerted.len()
    );
    for key in &report.alerted {
        println!("  stuck: {key}");
    }
    Ok(if report.alerted.is_empty() { 0 } else { 1 })
}

/// Run the `vigil task list` command.
pub fn list() -> Result<()> {
    let store = FileTaskStore::open_default();
    let records = store.list()?;

    if records.is_empty() {
        println!("No tasks tracked.");
        return Ok(());
    }

    let now = Utc::now();
    println!(
        "{:<24} {:<20} {:<9} {:<20} OUTPUT",
        "SESSION", "LABEL", "STATUS", "SPAWNED"
    );
    println!("{}", "-".repeat(100));
    for record in &records {
        let spawned = record.spawn_time.format(DATETIME_FMT).to_string();
        println!(
            "{:<24} {:<20} {:<9} {:<20} {}",
            record.session_key,
            record.label,
            record.status.to_string(),
            spawned,
            record.output_file.display()
        );
        if record.status == vigil_types::TaskStatus::Running {
            println!("  running for {}s", record.elapsed_secs(now));
        }
    }
    println!();
    println!("{} task(s).", records.len());
    Ok(())
}
