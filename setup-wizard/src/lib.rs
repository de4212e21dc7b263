// Setup wizard for a single pre-built Linux binary
// Main library entry point

pub mod installation;
pub mod models;
pub mod tui;
pub mod unattended;
pub mod utils;
pub mod wizard;

use anyhow::{Context, Result};
use log::{error, info};
use std::path::{Path, PathBuf};

use installation::{InstallPaths, Installer};
use models::config::InstallerConfig;

/// Initialize logging system with dual format (JSON + human-readable)
pub fn init_logging(log_dir: &Path, with_stdout: bool) -> Result<()> {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S").to_string();
    let (json_log_file, txt_log_file) = utils::logging::log_file_paths(log_dir, &timestamp);

    // Configure dual-format logging:
    // - JSON format to .log file
    // - Human-readable format to .txt file
    // - Optional: human-readable to stdout (disabled for TUI to avoid corrupting the terminal UI)
    let mut dispatch = fern::Dispatch::new().level(log::LevelFilter::Debug);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .level(log::LevelFilter::Info)
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", json_line));
                })
                .chain(
                    fern::log_file(&json_log_file)
                        .with_context(|| format!("open log file {:?}", json_log_file))?,
                ),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(
                    fern::log_file(&txt_log_file)
                        .with_context(|| format!("open log file {:?}", txt_log_file))?,
                ),
        );

    dispatch.apply().context("install global logger")?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

/// Deployment folder, configuration and logging for one run.
fn bootstrap(with_stdout: bool) -> Result<(PathBuf, InstallerConfig)> {
    let deployment_folder = utils::path_resolver::resolve_deployment_folder();
    let config = InstallerConfig::load(&deployment_folder)?;

    match utils::path_resolver::resolve_log_folder(&config.program_name) {
        Ok(log_dir) => {
            if let Err(e) = init_logging(&log_dir, with_stdout) {
                eprintln!("Failed to initialize logging: {:#}", e);
            }
        }
        Err(e) => eprintln!("Failed to resolve log folder: {:#}", e),
    }

    info!(
        "[PHASE: initialization] {} {} installer starting at {}",
        config.program_name,
        config.version,
        chrono::Utc::now()
    );
    info!(
        "[PHASE: initialization] [STEP: deployment_folder] Deployment folder: {:?}",
        deployment_folder
    );
    Ok((deployment_folder, config))
}

fn build_installer(deployment_folder: &Path, config: InstallerConfig) -> Result<Installer> {
    let paths = InstallPaths::resolve(deployment_folder, &config)?;
    info!(
        "[PHASE: initialization] [STEP: paths] payload={:?}, system={:?}, user={:?}",
        paths.payload, paths.system_bin_dir, paths.user_bin_dir
    );
    Ok(Installer::new(config, paths))
}

/// Interactive terminal wizard.
pub fn run_tui() {
    let result = bootstrap(false).and_then(|(deployment_folder, config)| {
        let installer = build_installer(&deployment_folder, config)?;
        tui::run(&installer, &deployment_folder)
    });

    if let Err(e) = result {
        error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
        eprintln!("Installer error: {:#}", e);
        std::process::exit(1);
    }
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame into memory and exits 0/1.
pub fn run_tui_smoke(target: Option<String>) {
    let result = bootstrap(false).and_then(|(deployment_folder, config)| {
        let target = target.as_deref().unwrap_or("welcome");
        tui::smoke(&config, &deployment_folder, target)
    });

    if let Err(e) = result {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        eprintln!("Installer error: {:#}", e);
        std::process::exit(1);
    }
}

/// Non-interactive install driven by command-line answers. Exits 0/1.
pub fn run_unattended(args: &[String]) {
    let result = unattended::UnattendedArgs::parse(args).and_then(|parsed| {
        let (deployment_folder, config) = bootstrap(true)?;
        let installer = build_installer(&deployment_folder, config)?;
        unattended::run(&installer, &parsed)
    });

    match result {
        Ok(path) => {
            info!(
                "[PHASE: unattended] [STEP: exit] installed to {}",
                path.display()
            );
        }
        Err(e) => {
            error!("[PHASE: unattended] [STEP: fatal] {:#}", e);
            eprintln!("Installer error: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Installs the global logger; no other test may call `init_logging`.
    #[test]
    fn log_files_hold_one_entry_per_line() {
        let dir = tempfile::tempdir().unwrap();
        init_logging(dir.path(), false).unwrap();
        info!("[PHASE: test] [STEP: one] first entry");
        info!("[PHASE: test] [STEP: two] second entry");
        log::logger().flush();

        let mut seen = 0;
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            let text = std::fs::read_to_string(&path).unwrap();
            let lines: Vec<&str> = text.lines().collect();
            if path.extension().and_then(|e| e.to_str()) == Some("log") {
                assert!(!text.contains("\n\n"), "blank line in {:?}", path);
                for line in &lines {
                    serde_json::from_str::<serde_json::Value>(line).unwrap();
                }
            }
            let first = lines
                .iter()
                .position(|l| l.contains("first entry"))
                .unwrap();
            assert!(!lines[first + 1].is_empty(), "blank line in {:?}", path);
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn build_installer_uses_configured_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = InstallerConfig {
            user_bin_dir: Some(dir.path().join("bin")),
            system_bin_dir: dir.path().join("sbin"),
            ..InstallerConfig::default()
        };
        let installer = build_installer(dir.path(), config).unwrap();
        assert_eq!(installer.paths().payload, dir.path().join("binary"));
        assert_eq!(installer.paths().user_bin_dir, dir.path().join("bin"));
        assert_eq!(installer.paths().system_bin_dir, dir.path().join("sbin"));
    }
}
