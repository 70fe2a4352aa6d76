//! The `vigil healthcheck` command: one monitor cycle, intended to be
//! driven by cron or a periodic agent hook.

use anyhow::{Context, Result};

use vigil_alert::{CooldownGate, Outbox};
use vigil_monitor::run_healthcheck;
use vigil_process::FileDefinitionStore;
use vigil_types::VigilConfig;

/// Run one healthcheck cycle. Exit code 1 when the cycle restarted or
/// collected anything, so periodic drivers can notice activity cheaply.
pub fn run() -> Result<i32> {
    let config = VigilConfig::load().context("failed to load config")?;
    let store = FileDefinitionStore::open_default();
    let outbox = Outbox::open_default().context("failed to open alert outbox")?;
    let gate = CooldownGate::open_default().context("failed to open cooldown dir")?;

    let report = run_healthcheck(&store, &outbox, &gate, &config)?;

    println!(
        "Scanned {} process(es): {} restarted, {} collected.",
        report.scanned,
        report.restarted.len(),
        report.collected.len()
    );
    for name in &report.restarted {
        println!("  restarted: {name}");
    }
    for name in &report.collected {
        println!("  collected: {name}");
    }

    Ok(if report.acted() { 1 } else { 0 })
}
