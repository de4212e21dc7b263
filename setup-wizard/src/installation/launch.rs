//! "Launch now": run the installed binary in a new terminal session.

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Terminal emulators tried in order.
pub const TERMINAL_CANDIDATES: &[&str] =
    &["x-terminal-emulator", "gnome-terminal", "konsole", "xterm"];

/// First candidate terminal found on `PATH`.
pub fn find_terminal() -> Option<PathBuf> {
    TERMINAL_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Arguments passed to the terminal: `-e "<installed>; sleep <hold>"`.
pub fn terminal_args(installed: &Path, hold_secs: u64) -> Vec<String> {
    vec![
        "-e".to_string(),
        format!("bash -c \"{}; sleep {}\"", installed.display(), hold_secs),
    ]
}

/// Spawn the terminal and return without waiting for it.
pub fn launch_in_terminal(installed: &Path, hold_secs: u64) -> Result<()> {
    let terminal = find_terminal().ok_or_else(|| {
        warn!("[PHASE: launch] [STEP: terminal] no terminal emulator found on PATH");
        anyhow::anyhow!(
            "No terminal emulator found (tried {})",
            TERMINAL_CANDIDATES.join(", ")
        )
    })?;

    let args = terminal_args(installed, hold_secs);
    info!(
        "[PHASE: launch] [STEP: spawn] launching {:?} via {:?}",
        installed, terminal
    );

    // The terminal outlives the installer; its `Child` handle is dropped without waiting.
    Command::new(&terminal)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn terminal {:?}", terminal))?;
    Ok(())
}
