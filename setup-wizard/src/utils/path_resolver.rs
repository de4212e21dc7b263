use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::models::config::InstallerConfig;

/// Overrides the log folder when set.
pub const LOG_DIR_ENV: &str = "SETUP_WIZARD_LOG_DIR";

/// Resolve deployment folder (absolute path)
///
/// The payload, license text, and optional config file ship next to the installer executable.
pub fn resolve_deployment_folder() -> PathBuf {
    // Prefer the folder where the executable is running from
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return dir.to_path_buf();
        }
    }

    // Fallback: current working directory
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve log folder (absolute path), creating it when missing.
///
/// - `SETUP_WIZARD_LOG_DIR` when set
/// - Otherwise `<temp dir>/<program>-setup-logs`
pub fn resolve_log_folder(program_name: &str) -> Result<PathBuf> {
    let dir = match std::env::var_os(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(v) => PathBuf::from(v),
        None => std::env::temp_dir().join(format!("{}-setup-logs", slugify(program_name))),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log folder: {:?}", dir))?;
    Ok(dir)
}

fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "installer".to_string()
    } else {
        slug
    }
}

/// Payload binary bundled alongside the installer.
pub fn resolve_payload(deployment_folder: &Path, config: &InstallerConfig) -> PathBuf {
    deployment_folder.join(&config.payload_file)
}

/// License text bundled alongside the installer, when configured.
pub fn resolve_license_file(deployment_folder: &Path, config: &InstallerConfig) -> Option<PathBuf> {
    config
        .license_file
        .as_ref()
        .filter(|f| !f.trim().is_empty())
        .map(|f| deployment_folder.join(f))
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Unable to determine the home directory"))
}

/// `~/.local/bin`
pub fn default_user_bin_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".local").join("bin"))
}

/// Desktop folder (XDG), falling back to `~/Desktop`.
pub fn desktop_dir() -> Result<PathBuf> {
    match dirs::desktop_dir() {
        Some(d) => Ok(d),
        None => Ok(home_dir()?.join("Desktop")),
    }
}

/// Application-menu entries folder (`~/.local/share/applications`).
pub fn applications_dir() -> Result<PathBuf> {
    match dirs::data_dir() {
        Some(d) => Ok(d.join("applications")),
        None => Ok(home_dir()?.join(".local").join("share").join("applications")),
    }
}
