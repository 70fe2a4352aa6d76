//! Process definitions: what the registry stores for each supervised process.

use serde::{Deserialize, Serialize};

/// A registered process definition, keyed by `name` in the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessDefinition {
    /// Unique name, also the key of the per-process runtime directory.
    pub name: String,
    /// The command to launch.
    pub command: CommandSpec,
    /// Expected runtime in minutes. 0 means "runs indefinitely" -- the
    /// process must always be alive and any death is treated as a crash.
    /// Never used to kill anything; only to classify exits.
    #[serde(default)]
    pub duration_minutes: u64,
    /// Whether the health monitor may restart this process after a
    /// premature death.
    #[serde(default = "default_auto_restart")]
    pub auto_restart: bool,
    /// Upper bound on monitor-initiated restarts. 0 means unlimited.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,
    /// Minimum seconds between two monitor-initiated restarts.
    #[serde(default = "default_restart_cooldown")]
    pub restart_cooldown_seconds: u64,
}

fn default_auto_restart() -> bool {
    true
}

fn default_max_restarts() -> u32 {
    3
}

fn default_restart_cooldown() -> u64 {
    60
}

impl ProcessDefinition {
    /// Expected runtime in seconds, or `None` for indefinite processes.
    pub fn expected_runtime_secs(&self) -> Option<u64> {
        if self.duration_minutes == 0 {
            None
        } else {
            Some(self.duration_minutes * 60)
        }
    }
}

/// An executable specification.
///
/// Commands are stored as a structured argument vector whenever the raw
/// string contains no shell metacharacters, avoiding quoting hazards.
/// Strings that need shell features are kept verbatim and executed via
/// `sh -c` for legacy compatibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CommandSpec {
    /// Program plus argument vector, executed directly.
    Argv { program: String, args: Vec<String> },
    /// Raw string handed to `sh -c`.
    Shell { command: String },
}

/// Characters that force shell interpretation of a raw command string.
const SHELL_METACHARS: &[char] = &[
    '|', '&', ';', '<', '>', '(', ')', '$', '`', '"', '\'', '*', '?', '[', ']', '{', '}', '~', '\n',
];

impl CommandSpec {
    /// Parse a raw command string into the structured form where possible.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains(SHELL_METACHARS) {
            return Self::Shell {
                command: raw.to_string(),
            };
        }
        let mut parts = raw.split_whitespace().map(str::to_string);
        match parts.next() {
            Some(program) => Self::Argv {
                program,
                args: parts.collect(),
            },
            // Empty input degenerates to a shell no-op; register-level
            // validation rejects it before it gets here.
            None => Self::Shell {
                command: String::new(),
            },
        }
    }

    /// The program and argument vector actually handed to the OS.
    pub fn argv(&self) -> (String, Vec<String>) {
        match self {
            Self::Argv { program, args } => (program.clone(), args.clone()),
            Self::Shell { command } => (
                "sh".to_string(),
                vec!["-c".to_string(), command.clone()],
            ),
        }
    }

    /// Human-readable single-line rendering for status output and logs.
    pub fn display(&self) -> String {
        match self {
            Self::Argv { program, args } => {
                if args.is_empty() {
                    program.clone()
                } else {
                    format!("{program} {}", args.join(" "))
                }
            }
            Self::Shell { command } => command.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_command_becomes_argv() {
        let spec = CommandSpec::parse("sleep 300");
        assert_eq!(
            spec,
            CommandSpec::Argv {
                program: "sleep".into(),
                args: vec!["300".into()],
            }
        );
    }

    #[test]
    fn parse_shell_metacharacters_stay_raw() {
        let spec = CommandSpec::parse("sleep 5 && exit 0");
        assert_eq!(
            spec,
            CommandSpec::Shell {
                command: "sleep 5 && exit 0".into(),
            }
        );
    }

    #[test]
    fn parse_quotes_stay_raw() {
        let spec = CommandSpec::parse(r#"echo "hello world""#);
        assert!(matches!(spec, CommandSpec::Shell { .. }));
    }

    #[test]
    fn argv_of_shell_goes_through_sh() {
        let spec = CommandSpec::parse("echo a; echo b");
        let (program, args) = spec.argv();
        assert_eq!(program, "sh");
        assert_eq!(args, vec!["-c".to_string(), "echo a; echo b".to_string()]);
    }

    #[test]
    fn argv_of_structured_is_direct() {
        let spec = CommandSpec::parse("python3 worker.py --fast");
        let (program, args) = spec.argv();
        assert_eq!(program, "python3");
        assert_eq!(args, vec!["worker.py".to_string(), "--fast".to_string()]);
    }

    #[test]
    fn display_roundtrips_both_forms() {
        assert_eq!(CommandSpec::parse("sleep 300").display(), "sleep 300");
        assert_eq!(
            CommandSpec::parse("sleep 5 && exit 0").display(),
            "sleep 5 && exit 0"
        );
    }

    #[test]
    fn definition_serde_defaults() {
        let json = r#"{"name":"job-a","command":{"kind":"argv","program":"sleep","args":["300"]}}"#;
        let def: ProcessDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.duration_minutes, 0);
        assert!(def.auto_restart);
        assert_eq!(def.max_restarts, 3);
        assert_eq!(def.restart_cooldown_seconds, 60);
    }

    #[test]
    fn expected_runtime_zero_is_indefinite() {
        let mut def: ProcessDefinition = serde_json::from_str(
            r#"{"name":"a","command":{"kind":"shell","command":"true"}}"#,
        )
        .unwrap();
        assert_eq!(def.expected_runtime_secs(), None);
        def.duration_minutes = 2;
        assert_eq!(def.expected_runtime_secs(), Some(120));
    }
}
