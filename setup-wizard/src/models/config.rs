// Installer configuration
//
// Layered with the `config` crate:
// 1. compiled defaults (the shipped product identity)
// 2. optional `setup-wizard.toml` in the deployment folder
// 3. `SETUP_WIZARD_*` environment variables
//
// NOTE: read once at startup; the wizard never writes configuration back.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "setup-wizard.toml";
pub const ENV_PREFIX: &str = "SETUP_WIZARD";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallerConfig {
    pub program_name: String,
    pub binary_name: String,
    pub version: String,
    pub description: String,
    pub developer: String,
    pub maintainer: String,
    pub email: String,

    /// Payload file name, relative to the deployment folder.
    pub payload_file: String,
    /// License text file, relative to the deployment folder. Built-in text when unset.
    #[serde(default)]
    pub license_file: Option<String>,
    pub chunk_count_hint: u64,

    pub system_bin_dir: PathBuf,
    /// Per-user bin directory. `~/.local/bin` when unset.
    #[serde(default)]
    pub user_bin_dir: Option<PathBuf>,

    pub icon: String,
    pub categories: String,
    /// Seconds the launch terminal stays open after the program exits.
    pub terminal_hold_secs: u64,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            program_name: "IP-Geo".to_string(),
            binary_name: "ip-geo".to_string(),
            version: "1.42".to_string(),
            description: "Locate IP addresses and find information about them".to_string(),
            developer: "Derek Michael Baier".to_string(),
            maintainer: "Derek Michael Baier".to_string(),
            email: "Derek.m.baier@gmail.com".to_string(),
            payload_file: "binary".to_string(),
            license_file: None,
            chunk_count_hint: crate::installation::files::DEFAULT_CHUNK_COUNT_HINT,
            system_bin_dir: PathBuf::from("/usr/bin"),
            user_bin_dir: None,
            icon: "gnome-globe".to_string(),
            categories: "Utility;".to_string(),
            terminal_hold_secs: 10,
        }
    }
}

impl InstallerConfig {
    /// Load configuration for a deployment folder.
    pub fn load(deployment_folder: &Path) -> Result<Self> {
        Self::load_from(&deployment_folder.join(CONFIG_FILE_NAME), true)
    }

    fn load_from(config_file: &Path, with_env: bool) -> Result<Self> {
        let d = Self::default();
        let mut builder = config::Config::builder()
            .set_default("program_name", d.program_name)?
            .set_default("binary_name", d.binary_name)?
            .set_default("version", d.version)?
            .set_default("description", d.description)?
            .set_default("developer", d.developer)?
            .set_default("maintainer", d.maintainer)?
            .set_default("email", d.email)?
            .set_default("payload_file", d.payload_file)?
            .set_default("chunk_count_hint", d.chunk_count_hint)?
            .set_default("system_bin_dir", d.system_bin_dir.to_string_lossy().to_string())?
            .set_default("icon", d.icon)?
            .set_default("categories", d.categories)?
            .set_default("terminal_hold_secs", d.terminal_hold_secs)?
            .add_source(config::File::from(config_file).required(false));

        if with_env {
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_"),
            );
        }

        let cfg: InstallerConfig = builder
            .build()
            .with_context(|| format!("Failed to read installer configuration ({:?})", config_file))?
            .try_deserialize()
            .context("Invalid installer configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.program_name.trim().is_empty() {
            anyhow::bail!("program_name cannot be empty");
        }
        let name = self.binary_name.trim();
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            anyhow::bail!("binary_name must be a plain file name (got {:?})", self.binary_name);
        }
        if self.payload_file.trim().is_empty() {
            anyhow::bail!("payload_file cannot be empty");
        }
        Ok(())
    }
}
