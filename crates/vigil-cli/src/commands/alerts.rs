//! Alert outbox commands: list pending alerts and acknowledge them.

use anyhow::{Context, Result};
use uuid::Uuid;

use vigil_alert::Outbox;

use crate::commands::DATETIME_FMT;

/// Run the `vigil alerts list` command.
pub fn list() -> Result<()> {
    let outbox = Outbox::open_default().context("failed to open alert outbox")?;
    let pending = outbox.pending()?;

    if pending.is_empty() {
        println!("No pending alerts.");
        return Ok(());
    }

    for alert in &pending {
        println!(
            "{}  [{}]  {}",
            alert.id,
            alert.source,
            alert.fired_at.format(DATETIME_FMT)
        );
        for line in alert.text.lines() {
            println!("    {line}");
        }
        println!();
    }
    println!("{} pending alert(s).", pending.len());
    Ok(())
}

/// Run the `vigil alerts ack` command.
pub fn ack(id: &str) -> Result<()> {
    let id: Uuid = id.parse().context("invalid alert id")?;
    let outbox = Outbox::open_default().context("failed to open alert outbox")?;

    if outbox.acknowledge(id)? {
        println!("Acknowledged {id}.");
    } else {
        println!("No pending alert with id {id}.");
    }
    Ok(())
}
