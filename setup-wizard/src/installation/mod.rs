// Installation logic
//
// This module contains the install sequence (resolve destination, chunked copy, permissions),
// existing-install detection, and the post-install helpers (shortcuts, launch).
//
// IMPORTANT:
// - Never retry automatically; every fault is reported to the wizard once.
// - Permissions are only set after a successful copy.

pub mod files;
pub mod launch;
pub mod shortcuts;

use anyhow::{Context, Result};
use log::{error, info, warn};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

use crate::models::config::InstallerConfig;
use crate::models::state::InstallScope;
use crate::utils::path_resolver;
use files::{ChunkedCopy, CopyObserver, CopyOutcome, CopyProgress};

/// Owner rwx, group r, other r.
pub const INSTALLED_MODE: u32 = 0o744;

/// Source and candidate destinations for one installer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    pub payload: PathBuf,
    pub system_bin_dir: PathBuf,
    pub user_bin_dir: PathBuf,
}

impl InstallPaths {
    pub fn resolve(deployment_folder: &Path, config: &InstallerConfig) -> Result<Self> {
        let user_bin_dir = match &config.user_bin_dir {
            Some(dir) => dir.clone(),
            None => path_resolver::default_user_bin_dir()?,
        };
        Ok(Self {
            payload: path_resolver::resolve_payload(deployment_folder, config),
            system_bin_dir: config.system_bin_dir.clone(),
            user_bin_dir,
        })
    }

    pub fn destination(&self, scope: InstallScope, binary_name: &str) -> PathBuf {
        match scope {
            InstallScope::AllUsers => self.system_bin_dir.join(binary_name),
            InstallScope::CurrentUser => self.user_bin_dir.join(binary_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallReport {
    pub outcome: CopyOutcome,
    pub destination: PathBuf,
    pub progress: CopyProgress,
    pub correlation_id: String,
}

/// The copy-and-permission step the wizard runs on its install page.
pub trait InstallSequence {
    fn install(&self, scope: InstallScope, observer: &mut dyn CopyObserver) -> InstallReport;
}

/// A binary already present at one of the destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingInstall {
    pub path: PathBuf,
    /// Same SHA-256 digest as the payload.
    pub identical: bool,
}

#[derive(Debug, Clone)]
pub struct Installer {
    config: InstallerConfig,
    paths: InstallPaths,
    engine: ChunkedCopy,
}

impl Installer {
    pub fn new(config: InstallerConfig, paths: InstallPaths) -> Self {
        let engine = ChunkedCopy::new(config.chunk_count_hint);
        Self {
            config,
            paths,
            engine,
        }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn paths(&self) -> &InstallPaths {
        &self.paths
    }

    pub fn destination(&self, scope: InstallScope) -> PathBuf {
        self.paths.destination(scope, &self.config.binary_name)
    }

    /// Look for a previous install at either destination (system-wide first).
    pub fn detect_existing(&self) -> Result<Option<ExistingInstall>> {
        for scope in [InstallScope::AllUsers, InstallScope::CurrentUser] {
            let path = self.destination(scope);
            if !path.is_file() {
                continue;
            }
            let installed = sha256_file(&path)?;
            let payload = sha256_file(&self.paths.payload)?;
            let identical = installed == payload;
            info!(
                "[PHASE: initialization] [STEP: existing_install] found {:?} (identical={})",
                path, identical
            );
            return Ok(Some(ExistingInstall { path, identical }));
        }
        Ok(None)
    }

    pub fn create_shortcut(
        &self,
        kind: shortcuts::ShortcutKind,
        installed: &Path,
    ) -> Result<PathBuf> {
        shortcuts::create_shortcut(kind, &self.config, installed)
    }

    pub fn launch(&self, installed: &Path) -> Result<()> {
        launch::launch_in_terminal(installed, self.config.terminal_hold_secs)
    }
}

impl InstallSequence for Installer {
    fn install(&self, scope: InstallScope, observer: &mut dyn CopyObserver) -> InstallReport {
        let started = Instant::now();
        let correlation_id = Uuid::new_v4().to_string();
        let destination = self.destination(scope);
        info!(
            "[PHASE: install] [STEP: start] install entered (correlation_id={}, scope={}, src={:?}, dst={:?})",
            correlation_id, scope, self.paths.payload, destination
        );

        let report = match prepare_parent(&destination) {
            Ok(()) => self.engine.copy(&self.paths.payload, &destination, observer),
            Err(e) => files::CopyReport {
                outcome: CopyOutcome::IoFailure(format!("{:#}", e)),
                progress: CopyProgress {
                    bytes_copied: 0,
                    total_bytes: 0,
                    percent_complete: 0.0,
                },
            },
        };

        let outcome = match report.outcome {
            CopyOutcome::Success => {
                info!(
                    "[PHASE: install] [STEP: chmod] setting permissions {:o} on {:?}",
                    INSTALLED_MODE, destination
                );
                match set_installed_mode(&destination) {
                    Ok(()) => CopyOutcome::Success,
                    Err(e) => CopyOutcome::IoFailure(format!(
                        "failed to set permissions on {:?}: {}",
                        destination, e
                    )),
                }
            }
            other => other,
        };

        match &outcome {
            CopyOutcome::Success => info!(
                "[PHASE: install] [STEP: exit] installed (correlation_id={}, bytes={}, duration_ms={})",
                correlation_id,
                report.progress.bytes_copied,
                started.elapsed().as_millis()
            ),
            CopyOutcome::CancelledByUser => warn!(
                "[PHASE: install] [STEP: exit] installation canceled by the user (correlation_id={})",
                correlation_id
            ),
            CopyOutcome::IoFailure(detail) => error!(
                "[PHASE: install] [STEP: exit] installation failed (correlation_id={}, err={})",
                correlation_id, detail
            ),
        }

        InstallReport {
            outcome,
            destination,
            progress: report.progress,
            correlation_id,
        }
    }
}

fn prepare_parent(destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create destination folder failed: {:?}", parent))?;
        }
    }
    Ok(())
}

/// Apply [`INSTALLED_MODE`] to `path`.
pub(crate) fn set_installed_mode(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(INSTALLED_MODE))
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

/// Hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut f =
        std::fs::File::open(path).with_context(|| format!("open failed: {:?}", path))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read failed: {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
