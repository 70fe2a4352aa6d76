//! Process lifecycle commands: register, deregister, start, stop, restart,
//! status, plus the hidden wrapper body.

use anyhow::{bail, Context, Result};

use vigil_process::{launcher, DefinitionStore, FileDefinitionStore, StopOutcome};
use vigil_types::{CommandSpec, ProcessDefinition, VigilConfig};

/// Run the `vigil register` command.
pub fn register(
    name: &str,
    raw_command: &str,
    duration_minutes: u64,
    auto_restart: bool,
    max_restarts: u32,
    restart_cooldown_seconds: u64,
) -> Result<()> {
    // The name doubles as the runtime directory name.
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        bail!("invalid process name {name:?}");
    }
    if raw_command.trim().is_empty() {
        bail!("empty command for {name:?}");
    }

    let store = FileDefinitionStore::open_default();
    let existed = store.get(name)?.is_some();
    store.upsert(ProcessDefinition {
        name: name.to_string(),
        command: CommandSpec::parse(raw_command),
        duration_minutes,
        auto_restart,
        max_restarts,
        restart_cooldown_seconds,
    })?;

    if existed {
        println!("Updated '{name}'.");
    } else {
        println!("Registered '{name}'.");
    }
    Ok(())
}

/// Run the `vigil deregister` command.
pub fn deregister(name: &str) -> Result<()> {
    let store = FileDefinitionStore::open_default();
    if launcher::deregister(&store, name)? {
        println!("Deregistered '{name}'.");
    } else {
        println!("'{name}' was not registered; runtime artifacts cleaned anyway.");
    }
    Ok(())
}

/// Run the `vigil start` command.
pub fn start(name: &str) -> Result<()> {
    let config = VigilConfig::load().context("failed to load config")?;
    let store = FileDefinitionStore::open_default();
    let pid = launcher::start(&store, name, &config.launcher)?;
    println!("Started '{name}' (PID {pid}).");
    Ok(())
}

/// Run the `vigil stop` command.
pub fn stop(name: &str) -> Result<()> {
    match launcher::stop(name)? {
        StopOutcome::Signalled(pid) => println!("Sent SIGTERM to '{name}' (PID {pid})."),
        StopOutcome::NotRunning => println!("'{name}' is not running."),
    }
    Ok(())
}

/// Run the `vigil restart` command: stop if running, then start.
pub fn restart(name: &str) -> Result<()> {
    let config = VigilConfig::load().context("failed to load config")?;
    let store = FileDefinitionStore::open_default();

    match launcher::stop(name)? {
        StopOutcome::Signalled(pid) => println!("Stopped '{name}' (was PID {pid})."),
        StopOutcome::NotRunning => {}
    }
    let pid = launcher::start(&store, name, &config.launcher)?;
    println!("Started '{name}' (PID {pid}).");
    Ok(())
}

/// Run the `vigil status` command. Always succeeds; dead or unregistered
/// processes are rows, not errors.
pub fn status(name: Option<&str>) -> Result<()> {
    let store = FileDefinitionStore::open_default();
    let rows = launcher::status(&store, name)?;

    if rows.is_empty() {
        println!("No processes registered.");
        return Ok(());
    }

    println!(
        "{:<20} {:<24} {:<8} {:<9} COMMAND",
        "NAME", "STATE", "PID", "RESTARTS"
    );
    println!("{}", "-".repeat(90));
    for row in &rows {
        let pid = row.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        let restarts = if row.auto_restart {
            row.restarts.to_string()
        } else {
            format!("{} (off)", row.restarts)
        };
        println!(
            "{:<20} {:<24} {:<8} {:<9} {}",
            row.name, row.state, pid, restarts, row.command
        );
    }
    println!();
    println!("{} process(es).", rows.len());
    Ok(())
}

/// Body of the hidden `vigil wrapper` subcommand. Runs detached inside
/// the session created by `start` and returns the child's exit code.
pub fn wrapper(name: &str) -> Result<i32> {
    let store = FileDefinitionStore::open_default();
    let code = launcher::run_wrapper(&store, name)?;
    Ok(code)
}
