mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Vigil -- process supervision and task liveness for agent workspaces.
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a process definition (idempotent upsert)
    Register {
        /// Unique process name
        name: String,

        /// Command line to run (shell syntax allowed)
        #[arg(long)]
        command: String,

        /// Expected runtime in minutes (0 = runs indefinitely)
        #[arg(long, default_value = "0")]
        duration: u64,

        /// Disable automatic restarts for this process
        #[arg(long)]
        no_restart: bool,

        /// Maximum automatic restarts (0 = unlimited)
        #[arg(long, default_value = "3")]
        max_restarts: u32,

        /// Minimum seconds between automatic restarts
        #[arg(long, default_value = "60")]
        restart_cooldown: u64,
    },

    /// Stop a process and remove its definition and runtime artifacts
    Deregister {
        /// Registered process name
        name: String,
    },

    /// Launch a registered process detached from this session
    Start {
        /// Registered process name
        name: String,
    },

    /// Stop a running process (SIGTERM)
    Stop {
        /// Registered process name
        name: String,
    },

    /// Stop a process and immediately relaunch it
    Restart {
        /// Registered process name
        name: String,
    },

    /// Show registered processes and their runtime state
    Status {
        /// Show only this process
        name: Option<String>,
    },

    /// Run one health-monitor cycle over all registered processes
    Healthcheck,

    /// Task tracker subcommands
    Task {
        #[command(subcommand)]
        action: TaskCommands,
    },

    /// Inspect a completed task's output for integrity problems
    Guard {
        /// Session key of the tracked task
        session_key: String,
    },

    /// Alert outbox subcommands
    Alerts {
        #[command(subcommand)]
        action: AlertCommands,
    },

    /// Internal detached-launch wrapper (invoked by `start`, not by hand)
    #[command(hide = true)]
    Wrapper {
        /// Registered process name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommands {
    /// Register a delegated task before dispatch (starts its SLA clock)
    Track {
        /// Unique session key of the delegated task
        session_key: String,

        /// Human-readable label for reports
        #[arg(long)]
        label: String,

        /// File the task is expected to produce
        #[arg(long)]
        output: PathBuf,
    },

    /// Mark a tracked task done
    Complete {
        /// Session key of the tracked task
        session_key: String,
    },

    /// Run one liveness cycle over running tasks
    Check,

    /// List tracked tasks
    List,
}

#[derive(Subcommand, Debug)]
enum AlertCommands {
    /// List pending alerts, oldest first
    List,

    /// Acknowledge (consume) a pending alert
    Ack {
        /// Alert UUID as shown by `alerts list`
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Register {
            name,
            command,
            duration,
            no_restart,
            max_restarts,
            restart_cooldown,
        } => {
            commands::process::register(
                &name,
                &command,
                duration,
                !no_restart,
                max_restarts,
                restart_cooldown,
            )?;
            0
        }
        Commands::Deregister { name } => {
            commands::process::deregister(&name)?;
            0
        }
        Commands::Start { name } => {
            commands::process::start(&name)?;
            0
        }
        Commands::Stop { name } => {
            commands::process::stop(&name)?;
            0
        }
        Commands::Restart { name } => {
            commands::process::restart(&name)?;
            0
        }
        Commands::Status { name } => {
            commands::process::status(name.as_deref())?;
            0
        }
        Commands::Healthcheck => commands::healthcheck::run()?,
        Commands::Task { action } => match action {
            TaskCommands::Track {
                session_key,
                label,
                output,
            } => {
                commands::task::track(&session_key, &label, &output)?;
                0
            }
            TaskCommands::Complete { session_key } => {
                commands::task::complete(&session_key)?;
                0
            }
            TaskCommands::Check => commands::task::check()?,
            TaskCommands::List => {
                commands::task::list()?;
                0
            }
        },
        Commands::Guard { session_key } => commands::guard::run(&session_key)?,
        Commands::Alerts { action } => match action {
            AlertCommands::List => {
                commands::alerts::list()?;
                0
            }
            AlertCommands::Ack { id } => {
                commands::alerts::ack(&id)?;
                0
            }
        },
        Commands::Wrapper { name } => commands::process::wrapper(&name)?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_parse_register_defaults() {
        let cli = Cli::try_parse_from(["vigil", "register", "worker", "--command", "sleep 300"]);
        assert!(cli.is_ok(), "should parse register with defaults: {cli:?}");
        let cli = cli.unwrap();
        match cli.command {
            Commands::Register {
                name,
                command,
                duration,
                no_restart,
                max_restarts,
                restart_cooldown,
            } => {
                assert_eq!(name, "worker");
                assert_eq!(command, "sleep 300");
                assert_eq!(duration, 0);
                assert!(!no_restart);
                assert_eq!(max_restarts, 3);
                assert_eq!(restart_cooldown, 60);
            }
            _ => panic!("expected Register command"),
        }
    }

    #[test]
    fn cli_parse_register_no_restart() {
        let cli = Cli::try_parse_from([
            "vigil",
            "register",
            "batch",
            "--command",
            "run.sh",
            "--duration",
            "30",
            "--no-restart",
        ]);
        assert!(cli.is_ok(), "should parse register flags: {cli:?}");
        match cli.unwrap().command {
            Commands::Register {
                duration, no_restart, ..
            } => {
                assert_eq!(duration, 30);
                assert!(no_restart);
            }
            _ => panic!("expected Register command"),
        }
    }

    #[test]
    fn cli_parse_status_optional_name() {
        let all = Cli::try_parse_from(["vigil", "status"]).unwrap();
        assert!(matches!(all.command, Commands::Status { name: None }));

        let one = Cli::try_parse_from(["vigil", "status", "worker"]).unwrap();
        match one.command {
            Commands::Status { name } => assert_eq!(name.as_deref(), Some("worker")),
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn cli_parse_task_track() {
        let cli = Cli::try_parse_from([
            "vigil",
            "task",
            "track",
            "agent-42",
            "--label",
            "research",
            "--output",
            "/tmp/out.md",
        ]);
        assert!(cli.is_ok(), "should parse task track: {cli:?}");
        match cli.unwrap().command {
            Commands::Task {
                action:
                    TaskCommands::Track {
                        session_key,
                        label,
                        output,
                    },
            } => {
                assert_eq!(session_key, "agent-42");
                assert_eq!(label, "research");
                assert_eq!(output, PathBuf::from("/tmp/out.md"));
            }
            _ => panic!("expected Task Track command"),
        }
    }

    #[test]
    fn cli_parse_guard() {
        let cli = Cli::try_parse_from(["vigil", "guard", "agent-42"]).unwrap();
        match cli.command {
            Commands::Guard { session_key } => assert_eq!(session_key, "agent-42"),
            _ => panic!("expected Guard command"),
        }
    }

    #[test]
    fn cli_parse_alerts_ack() {
        let cli = Cli::try_parse_from([
            "vigil",
            "alerts",
            "ack",
            "550e8400-e29b-41d4-a716-446655440000",
        ])
        .unwrap();
        match cli.command {
            Commands::Alerts {
                action: AlertCommands::Ack { id },
            } => assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000"),
            _ => panic!("expected Alerts Ack command"),
        }
    }

    #[test]
    fn cli_parse_hidden_wrapper() {
        let cli = Cli::try_parse_from(["vigil", "wrapper", "worker"]).unwrap();
        match cli.command {
            Commands::Wrapper { name } => assert_eq!(name, "worker"),
            _ => panic!("expected Wrapper command"),
        }
    }

    #[test]
    fn cli_missing_required_args_fails() {
        // register without --command should fail
        assert!(Cli::try_parse_from(["vigil", "register", "worker"]).is_err());
        // task track without --label should fail
        assert!(Cli::try_parse_from([
            "vigil", "task", "track", "k", "--output", "/tmp/x"
        ])
        .is_err());
        // start without a name should fail
        assert!(Cli::try_parse_from(["vigil", "start"]).is_err());
    }
}
