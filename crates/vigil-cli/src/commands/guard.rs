//! The `vigil guard` command: inspect a completed task's output before
//! the result is relayed onward.

use anyhow::{bail, Context, Result};

use vigil_tasks::{inspect_output, FileTaskStore, TaskStore, Verdict};
use vigil_types::VigilConfig;

/// Run the guard over the output file of a tracked task.
///
/// Exit codes: 0 = pass, 1 = fail (do not relay), 2 = warn (review first).
pub fn run(session_key: &str) -> Result<i32> {
    let config = VigilConfig::load().context("failed to load config")?;
    let store = FileTaskStore::open_default();

    let Some(record) = store.get(session_key)? else {
        bail!("no tracked task with session key {session_key:?}");
    };

    let report = inspect_output(&record.output_file, &config.guard)?;

    println!(
        "Guard: '{}' ({session_key}) -> {} ({} bytes)",
        record.label, report.verdict, report.size_bytes
    );
    for finding in &report.findings {
        println!("  [{}] {}: {}", finding.severity, finding.rule, finding.detail);
    }

    Ok(match report.verdict {
        Verdict::Pass => 0,
        Verdict::Fail => 1,
        Verdict::Warn => 2,
    })
}
