//! Launcher shortcuts (freedesktop `.desktop` descriptors).

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::models::config::InstallerConfig;
use crate::utils::path_resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    Desktop,
    Menu,
}

impl ShortcutKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShortcutKind::Desktop => "desktop entry",
            ShortcutKind::Menu => "menu entry",
        }
    }

    fn folder(&self) -> Result<PathBuf> {
        match self {
            ShortcutKind::Desktop => path_resolver::desktop_dir(),
            ShortcutKind::Menu => path_resolver::applications_dir(),
        }
    }
}

pub fn shortcut_path(folder: &Path, program_name: &str) -> Result<PathBuf> {
    if program_name.trim().is_empty() {
        anyhow::bail!("shortcut name is empty");
    }
    Ok(folder.join(format!("{}.desktop", program_name)))
}

/// Descriptor text for the installed binary.
pub fn desktop_entry_contents(config: &InstallerConfig, installed: &Path) -> String {
    format!(
        "#!/usr/bin/env xdg-open\n\
         [Desktop Entry]\n\
         Name={name} {version}\n\
         Comment={comment}\n\
         Exec=bash -c \"{exec}; sleep {hold}\"\n\
         Type=Application\n\
         Categories={categories}\n\
         Icon={icon}\n\
         Terminal=true\n",
        name = config.program_name,
        version = config.version,
        comment = config.description,
        exec = installed.display(),
        hold = config.terminal_hold_secs,
        categories = config.categories,
        icon = config.icon,
    )
}

/// Write the descriptor into `folder` and mark it executable.
pub fn write_shortcut(folder: &Path, config: &InstallerConfig, installed: &Path) -> Result<PathBuf> {
    let path = shortcut_path(folder, &config.program_name)?;
    std::fs::create_dir_all(folder).with_context(|| format!("create {}", folder.display()))?;
    std::fs::write(&path, desktop_entry_contents(config, installed))
        .with_context(|| format!("write {}", path.display()))?;
    super::set_installed_mode(&path).with_context(|| format!("chmod {}", path.display()))?;
    Ok(path)
}

pub fn create_shortcut(
    kind: ShortcutKind,
    config: &InstallerConfig,
    installed: &Path,
) -> Result<PathBuf> {
    let folder = kind.folder()?;
    let path = write_shortcut(&folder, config, installed)?;
    info!(
        "[PHASE: shortcuts] [STEP: {}] wrote {:?}",
        match kind {
            ShortcutKind::Desktop => "desktop",
            ShortcutKind::Menu => "menu",
        },
        path
    );
    Ok(path)
}
