//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Once;

use assert_cmd::Command;

static BUILD_ONCE: Once = Once::new();

/// Ensure the vigil binary is built, then return its path.
pub fn vigil_bin() -> PathBuf {
    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests/ should have a parent")
        .to_path_buf();

    BUILD_ONCE.call_once(|| {
        let status = std::process::Command::new("cargo")
            .args(["build", "-p", "vigil-cli"])
            .current_dir(&workspace_root)
            .status()
            .expect("failed to invoke cargo build");
        assert!(status.success(), "cargo build -p vigil-cli failed");
    });

    let bin = workspace_root.join("target").join("debug").join("vigil");
    assert!(bin.exists(), "vigil binary not found at {}", bin.display());
    bin
}

/// Get a Command for the `vigil` binary with VIGIL_HOME pointed at a
/// temp directory for complete isolation from the user's real state.
pub fn vigil_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(vigil_bin());
    cmd.env("VIGIL_HOME", home);
    cmd
}

/// Read the tracked PID of a process from its runtime artifact.
pub fn read_pid(home: &Path, name: &str) -> Option<u32> {
    let raw = std::fs::read_to_string(home.join("proc").join(name).join("pid")).ok()?;
    raw.trim().parse().ok()
}

/// Poll until `check` passes or the timeout elapses.
pub fn wait_for(timeout_secs: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(timeout_secs);
    while std::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    false
}
