//! Non-interactive host: drives the same wizard controller from command-line answers and
//! shows copy progress as an `indicatif` bar.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{error, info, warn};
use std::path::PathBuf;

use crate::installation::{InstallSequence, Installer};
use crate::models::state::{InstallScope, Page};
use crate::utils::privilege;
use crate::wizard::host::{Checkbox, Control, Notice, NoticeLevel, RadioGroup, WizardHost};
use crate::wizard::{Advance, FormState, WizardController};

/// Answers given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnattendedArgs {
    pub accept_license: bool,
    pub scope: Option<InstallScope>,
    pub overwrite: bool,
}

impl UnattendedArgs {
    /// Parse `--accept-license`, `--scope user|all` (or `--scope=...`) and `--overwrite`.
    /// Other arguments are ignored.
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut out = Self {
            accept_license: false,
            scope: None,
            overwrite: false,
        };
        let mut it = args.iter();
        while let Some(arg) = it.next() {
            let scope_value = if arg == "--scope" {
                Some(
                    it.next()
                        .context("--scope needs a value (user|all)")?
                        .as_str(),
                )
            } else {
                arg.strip_prefix("--scope=")
            };
            if let Some(v) = scope_value {
                out.scope = Some(
                    InstallScope::parse(v)
                        .with_context(|| format!("Invalid --scope '{}' (expected user|all)", v))?,
                );
                continue;
            }
            match arg.as_str() {
                "--accept-license" => out.accept_license = true,
                "--overwrite" => out.overwrite = true,
                _ => {}
            }
        }
        Ok(out)
    }
}

/// [`WizardHost`] that answers form questions from [`UnattendedArgs`].
pub struct UnattendedHost {
    license_accepted: bool,
    requested_scope: Option<InstallScope>,
    scope: InstallScope,
    page: usize,
    open: bool,
    bar: ProgressBar,
    notices: Vec<Notice>,
}

impl UnattendedHost {
    pub fn new(args: &UnattendedArgs, bar: ProgressBar) -> Self {
        Self {
            license_accepted: args.accept_license,
            requested_scope: args.scope,
            scope: args.scope.unwrap_or(InstallScope::CurrentUser),
            page: 0,
            open: true,
            bar,
            notices: Vec::new(),
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

impl WizardHost for UnattendedHost {
    fn checkbox_state(&self, _id: Checkbox) -> bool {
        self.license_accepted
    }

    fn radio_selection(&self, _id: RadioGroup) -> InstallScope {
        self.scope
    }

    fn set_radio_selection(&mut self, _id: RadioGroup, scope: InstallScope) {
        // An explicit --scope wins over the controller's default.
        self.scope = self.requested_scope.unwrap_or(scope);
    }

    fn set_label_text(&mut self, _id: Control, _text: &str) {}

    fn set_control_enabled(&mut self, _id: Control, _enabled: bool) {}

    fn set_control_visible(&mut self, _id: Control, _visible: bool) {}

    fn set_progress_value(&mut self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn set_page_index(&mut self, index: usize) -> bool {
        self.page = index;
        false
    }

    fn page_index(&self) -> usize {
        self.page
    }

    fn process_pending_events(&mut self) {}

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("[PHASE: unattended] [STEP: notice] {}", notice.body),
            NoticeLevel::Warning => warn!("[PHASE: unattended] [STEP: notice] {}", notice.body),
            NoticeLevel::Critical => error!("[PHASE: unattended] [STEP: notice] {}", notice.body),
        }
        self.bar.println(format!("{}: {}", notice.title, notice.body));
        self.notices.push(notice);
    }
}

fn progress_bar(visible: bool) -> Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    if !visible {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:50.cyan/blue}] {pos:>3}%  {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(bar)
}

/// Walk every page with the given answers. Returns the installed path.
pub fn drive<H, I>(
    host: &mut H,
    installer: &I,
    has_elevated_privilege: bool,
) -> Result<PathBuf>
where
    H: WizardHost,
    I: InstallSequence + ?Sized,
{
    let mut controller =
        WizardController::initialize(Page::ALL.len(), has_elevated_privilege, host);

    // Each page is visited at most once; the bound only guards against a stuck controller.
    for _ in 0..=Page::ALL.len() {
        let form = FormState::capture(&*host);
        match controller.request_advance(&form, host, installer) {
            Ok(Advance::Moved { to, .. }) => {
                info!("[PHASE: unattended] [STEP: next] now on page {}", to)
            }
            Ok(Advance::Installed { destination }) => return Ok(destination),
            Ok(Advance::InstallCancelled) => anyhow::bail!("Installation was canceled"),
            Ok(Advance::InstallFailed(detail)) => {
                anyhow::bail!("The installer failed to copy the required files: {}", detail)
            }
            Ok(Advance::AtLastPage) | Ok(Advance::Closed) => break,
            Err(reason) => return Err(anyhow::anyhow!(reason)),
        }
    }
    anyhow::bail!("The wizard finished without installing anything")
}

/// `--unattended` entry point.
pub fn run(installer: &Installer, args: &UnattendedArgs) -> Result<PathBuf> {
    info!(
        "[PHASE: unattended] [STEP: start] accept_license={}, scope={:?}, overwrite={}",
        args.accept_license, args.scope, args.overwrite
    );

    let elevated = privilege::has_elevated_privilege();
    if args.scope == Some(InstallScope::AllUsers) && !elevated {
        anyhow::bail!("--scope all requires root; rerun with sudo or use --scope user");
    }

    if let Some(existing) = installer.detect_existing()? {
        if !args.overwrite {
            let what = if existing.identical {
                "This version is already installed"
            } else {
                "A different version is already installed"
            };
            anyhow::bail!(
                "{} at {}; pass --overwrite to replace it",
                what,
                existing.path.display()
            );
        }
        warn!(
            "[PHASE: unattended] [STEP: existing_install] overwriting {:?}",
            existing.path
        );
    }

    let bar = progress_bar(true)?;
    bar.set_message(installer.config().program_name.clone());
    let mut host = UnattendedHost::new(args, bar.clone());
    let result = drive(&mut host, installer, elevated);
    match &result {
        Ok(path) => bar.finish_with_message(format!("installed to {}", path.display())),
        Err(_) => bar.abandon(),
    }
    result
}
