//! Wizard page controller.
//!
//! Owns the page sequence (Welcome -> License -> Install -> Done), gates each forward step,
//! and runs the install sequence when the user leaves the install page. Navigation is
//! forward-only; there is no back transition.
//!
//! Manual page changes (tab clicks) are rejected: the host reports every page change and the
//! controller puts the page back unless it made the change itself.

pub mod host;

use log::{debug, info, warn};
use std::path::PathBuf;
use thiserror::Error;

use crate::installation::files::CopyOutcome;
use crate::installation::InstallSequence;
use crate::models::state::{InstallScope, Page, WizardPhase, WizardState};
use host::{Checkbox, Control, HostObserver, Notice, NoticeLevel, RadioGroup, WizardHost};

pub const NEXT_LABEL: &str = "Next";
pub const INSTALL_LABEL: &str = "Install";
pub const EXIT_LABEL: &str = "Exit";

/// Why a forward step was refused. The wizard state is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockedReason {
    #[error("Please accept the terms and conditions in order to proceed!")]
    LicenseNotAccepted,
    /// A host re-entered `request_advance` from inside its yield while the copy was running.
    #[error("Installation is already in progress")]
    InstallInProgress,
    #[error("Installation failed; the wizard can only be closed")]
    InstallFailed,
    #[error("The wizard has been closed")]
    Closed,
}

/// What a successful `request_advance` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { from: usize, to: usize },
    AtLastPage,
    Installed { destination: PathBuf },
    InstallCancelled,
    InstallFailed(String),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageChange {
    Accepted,
    Reverted,
}

/// Whether a page change reported by the host right now is the controller's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationGuard {
    Programmatic,
    Locked,
}

/// Raw user intent reported by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    Next,
    Cancel,
    PageChanged,
}

/// Page-local form values, read from the host when the user presses next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormState {
    pub license_accepted: bool,
    pub install_scope: InstallScope,
}

impl FormState {
    pub fn capture<H: WizardHost + ?Sized>(host: &H) -> Self {
        Self {
            license_accepted: host.checkbox_state(Checkbox::AcceptLicense),
            install_scope: host.radio_selection(RadioGroup::InstallScope),
        }
    }
}

#[derive(Debug)]
pub struct WizardController {
    state: WizardState,
}

impl WizardController {
    /// Show page 0 and configure the install-scope choice for the current privilege level.
    pub fn initialize<H: WizardHost + ?Sized>(
        page_count: usize,
        has_elevated_privilege: bool,
        host: &mut H,
    ) -> Self {
        let state = WizardState::new(page_count, has_elevated_privilege);
        info!(
            "[PHASE: wizard] [STEP: init] pages={}, elevated={}, scope={}",
            state.page_count, has_elevated_privilege, state.install_scope
        );

        host.set_control_enabled(Control::AllUsersOption, has_elevated_privilege);
        host.set_radio_selection(RadioGroup::InstallScope, state.install_scope);
        host.set_label_text(Control::Next, NEXT_LABEL);
        host.set_control_enabled(Control::Next, true);

        let mut controller = Self { state };
        controller.reposition(host, 0);
        controller
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn guard(&self) -> NavigationGuard {
        if self.state.tab_change_allowed {
            NavigationGuard::Programmatic
        } else {
            NavigationGuard::Locked
        }
    }

    /// Dispatch one host event. Refusals are shown to the user as a notice.
    pub fn handle_event<H, I>(&mut self, event: WizardEvent, host: &mut H, installer: &I)
    where
        H: WizardHost + ?Sized,
        I: InstallSequence + ?Sized,
    {
        match event {
            WizardEvent::Next => {
                let form = FormState::capture(&*host);
                if let Err(reason) = self.request_advance(&form, host, installer) {
                    self.surface(reason, host);
                }
            }
            WizardEvent::Cancel => self.request_cancel(host),
            WizardEvent::PageChanged => {
                self.on_manual_page_change_attempt(host);
            }
        }
    }

    fn surface<H: WizardHost + ?Sized>(&self, reason: BlockedReason, host: &mut H) {
        match reason {
            BlockedReason::LicenseNotAccepted => {
                host.notify(Notice::new(NoticeLevel::Info, "License", reason.to_string()))
            }
            BlockedReason::InstallFailed => host.notify(Notice::new(
                NoticeLevel::Warning,
                "Setup",
                reason.to_string(),
            )),
            BlockedReason::InstallInProgress | BlockedReason::Closed => {
                debug!("[PHASE: wizard] [STEP: next] ignored: {}", reason)
            }
        }
    }

    /// The user asked for the next page.
    pub fn request_advance<H, I>(
        &mut self,
        form: &FormState,
        host: &mut H,
        installer: &I,
    ) -> Result<Advance, BlockedReason>
    where
        H: WizardHost + ?Sized,
        I: InstallSequence + ?Sized,
    {
        match self.state.phase {
            WizardPhase::Closed => return Err(BlockedReason::Closed),
            WizardPhase::Installing => return Err(BlockedReason::InstallInProgress),
            WizardPhase::InstallFailed(_) => return Err(BlockedReason::InstallFailed),
            WizardPhase::Browsing | WizardPhase::Installed { .. } => {}
        }

        self.absorb_form(form);

        if matches!(self.state.phase, WizardPhase::Installed { .. }) && self.state.is_last_page()
        {
            // "Next" reads Exit here.
            self.request_cancel(host);
            return Ok(Advance::Closed);
        }

        match self.state.page() {
            Some(Page::License) if !self.state.license_accepted => {
                warn!("[PHASE: wizard] [STEP: next] license not accepted; staying on page");
                return Err(BlockedReason::LicenseNotAccepted);
            }
            Some(Page::Install) if self.state.phase == WizardPhase::Browsing => {
                return Ok(self.run_install(host, installer));
            }
            _ => {}
        }

        Ok(self.step_forward(host))
    }

    /// The host reports that the visible page changed, for any reason.
    pub fn on_manual_page_change_attempt<H: WizardHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> PageChange {
        match self.guard() {
            NavigationGuard::Programmatic => PageChange::Accepted,
            NavigationGuard::Locked => {
                info!(
                    "[PHASE: wizard] [STEP: tab_change] blocked manual tab change (host={}, page={})",
                    host.page_index(),
                    self.state.current_page
                );
                self.reposition(host, self.state.current_page);
                PageChange::Reverted
            }
        }
    }

    /// Close the wizard. An in-flight copy sees the closed host at its next yield.
    pub fn request_cancel<H: WizardHost + ?Sized>(&mut self, host: &mut H) {
        info!("[PHASE: wizard] [STEP: close] closing");
        self.state.phase = WizardPhase::Closed;
        host.close();
    }

    fn absorb_form(&mut self, form: &FormState) {
        self.state.license_accepted = form.license_accepted;
        self.state.install_scope = if self.state.all_users_available {
            form.install_scope
        } else {
            if form.install_scope == InstallScope::AllUsers {
                warn!("[PHASE: wizard] [STEP: scope] all-users install needs root; using current user");
            }
            InstallScope::CurrentUser
        };
    }

    fn step_forward<H: WizardHost + ?Sized>(&mut self, host: &mut H) -> Advance {
        if self.state.is_last_page() {
            return Advance::AtLastPage;
        }
        let from = self.state.current_page;
        let to = from + 1;
        self.reposition(host, to);
        info!("[PHASE: wizard] [STEP: next] page {} -> {}", from, to);

        if self.state.page() == Some(Page::Install) && self.state.phase == WizardPhase::Browsing {
            host.set_label_text(Control::Next, INSTALL_LABEL);
        }
        Advance::Moved { from, to }
    }

    /// Move the page, bracketed so the host's side-effect notification is accepted.
    fn reposition<H: WizardHost + ?Sized>(&mut self, host: &mut H, index: usize) {
        self.state.tab_change_allowed = true;
        self.state.current_page = index.min(self.state.last_page());
        if host.set_page_index(self.state.current_page) {
            self.on_manual_page_change_attempt(host);
        }
        self.state.tab_change_allowed = false;
    }

    fn run_install<H, I>(&mut self, host: &mut H, installer: &I) -> Advance
    where
        H: WizardHost + ?Sized,
        I: InstallSequence + ?Sized,
    {
        let scope = self.state.install_scope;
        info!(
            "[PHASE: wizard] [STEP: install] install button pressed (scope={}); disabling next",
            scope
        );
        self.state.phase = WizardPhase::Installing;
        host.set_control_enabled(Control::Next, false);
        host.set_progress_value(0);

        let report = {
            let mut observer = HostObserver { host: &mut *host };
            installer.install(scope, &mut observer)
        };

        match report.outcome {
            CopyOutcome::Success => {
                self.state.phase = WizardPhase::Installed {
                    destination: report.destination.clone(),
                };
                info!("[PHASE: wizard] [STEP: install] installed; next becomes \"Exit\"");
                host.set_label_text(Control::Next, EXIT_LABEL);
                host.set_control_enabled(Control::Next, true);
                host.set_control_visible(Control::Cancel, false);
                self.step_forward(host);
                Advance::Installed {
                    destination: report.destination,
                }
            }
            CopyOutcome::CancelledByUser => {
                host.notify(Notice::new(
                    NoticeLevel::Warning,
                    "Installation Canceled",
                    "Installation was canceled by the user!",
                ));
                self.request_cancel(host);
                Advance::InstallCancelled
            }
            CopyOutcome::IoFailure(detail) => {
                self.state.phase = WizardPhase::InstallFailed(detail.clone());
                host.notify(Notice::new(
                    NoticeLevel::Critical,
                    "Failed",
                    format!(
                        "The installer failed to copy the required files!\nPlease retry as root.\n\n{}",
                        detail
                    ),
                ));
                host.set_label_text(Control::Cancel, EXIT_LABEL);
                host.set_control_visible(Control::Cancel, true);
                Advance::InstallFailed(detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installation::files::{CopyObserver, CopyProgress};
    use crate::installation::InstallReport;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingHost {
        page: usize,
        fires_on_set: bool,
        notifications: usize,
        license_checked: bool,
        scope: Option<InstallScope>,
        labels: HashMap<Control, String>,
        enabled: HashMap<Control, bool>,
        visible: HashMap<Control, bool>,
        progress: Vec<u8>,
        notices: Vec<Notice>,
        closed: bool,
        yields: usize,
        close_after_yields: Option<usize>,
    }

    impl RecordingHost {
        fn new() -> Self {
            Self::default()
        }

        /// Simulate the user clicking a page tab.
        fn click_tab(&mut self, index: usize) {
            self.page = index;
        }
    }

    impl WizardHost for RecordingHost {
        fn checkbox_state(&self, _id: Checkbox) -> bool {
            self.license_checked
        }

        fn radio_selection(&self, _id: RadioGroup) -> InstallScope {
            self.scope.unwrap_or(InstallScope::CurrentUser)
        }

        fn set_radio_selection(&mut self, _id: RadioGroup, scope: InstallScope) {
            self.scope = Some(scope);
        }

        fn set_label_text(&mut self, id: Control, text: &str) {
            self.labels.insert(id, text.to_string());
        }

        fn set_control_enabled(&mut self, id: Control, enabled: bool) {
            self.enabled.insert(id, enabled);
        }

        fn set_control_visible(&mut self, id: Control, visible: bool) {
            self.visible.insert(id, visible);
        }

        fn set_progress_value(&mut self, percent: u8) {
            self.progress.push(percent);
        }

        fn set_page_index(&mut self, index: usize) -> bool {
            self.page = index;
            if self.fires_on_set {
                self.notifications += 1;
            }
            self.fires_on_set
        }

        fn page_index(&self) -> usize {
            self.page
        }

        fn process_pending_events(&mut self) {
            self.yields += 1;
            if Some(self.yields) == self.close_after_yields {
                self.closed = true;
            }
        }

        fn is_open(&self) -> bool {
            !self.closed
        }

        fn close(&mut self) {
            self.closed = true;
        }

        fn notify(&mut self, notice: Notice) {
            self.notices.push(notice);
        }
    }

    /// Reports ten chunks, then the configured outcome.
    struct FakeInstall {
        outcome: CopyOutcome,
        seen_scope: Cell<Option<InstallScope>>,
        calls: RefCell<usize>,
    }

    impl FakeInstall {
        fn with(outcome: CopyOutcome) -> Self {
            Self {
                outcome,
                seen_scope: Cell::new(None),
                calls: RefCell::new(0),
            }
        }

        fn ok() -> Self {
            Self::with(CopyOutcome::Success)
        }
    }

    impl InstallSequence for FakeInstall {
        fn install(&self, scope: InstallScope, observer: &mut dyn CopyObserver) -> InstallReport {
            self.seen_scope.set(Some(scope));
            *self.calls.borrow_mut() += 1;
            let mut progress = CopyProgress {
                bytes_copied: 0,
                total_bytes: 1000,
                percent_complete: 0.0,
            };
            for chunk in 1..=10u64 {
                progress.bytes_copied = chunk * 100;
                progress.percent_complete = (chunk * 10) as f64;
                observer.on_progress(&progress);
                if chunk < 10 && !observer.should_continue() {
                    return InstallReport {
                        outcome: CopyOutcome::CancelledByUser,
                        destination: PathBuf::from("/tmp/ip-geo"),
                        progress,
                        correlation_id: "test".to_string(),
                    };
                }
            }
            InstallReport {
                outcome: self.outcome.clone(),
                destination: PathBuf::from("/tmp/ip-geo"),
                progress,
                correlation_id: "test".to_string(),
            }
        }
    }

    fn form(license_accepted: bool) -> FormState {
        FormState {
            license_accepted,
            install_scope: InstallScope::CurrentUser,
        }
    }

    fn to_install_page(c: &mut WizardController, host: &mut RecordingHost, inst: &FakeInstall) {
        c.request_advance(&form(false), host, inst).unwrap();
        c.request_advance(&form(true), host, inst).unwrap();
        assert_eq!(c.state().page(), Some(Page::Install));
    }

    #[test]
    fn initialize_without_privilege_forces_current_user() {
        let mut host = RecordingHost::new();
        host.page = 3;
        let c = WizardController::initialize(4, false, &mut host);

        assert_eq!(c.state().current_page, 0);
        assert_eq!(host.page, 0);
        assert_eq!(c.state().install_scope, InstallScope::CurrentUser);
        assert_eq!(host.scope, Some(InstallScope::CurrentUser));
        assert_eq!(host.enabled.get(&Control::AllUsersOption), Some(&false));
        assert!(!c.state().tab_change_allowed);
    }

    #[test]
    fn initialize_with_privilege_offers_all_users() {
        let mut host = RecordingHost::new();
        let c = WizardController::initialize(4, true, &mut host);
        assert_eq!(c.state().install_scope, InstallScope::AllUsers);
        assert_eq!(host.scope, Some(InstallScope::AllUsers));
        assert_eq!(host.enabled.get(&Control::AllUsersOption), Some(&true));
    }

    #[test]
    fn all_users_request_without_privilege_installs_for_current_user() {
        let mut host = RecordingHost::new();
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(4, false, &mut host);
        let sneaky = FormState {
            license_accepted: true,
            install_scope: InstallScope::AllUsers,
        };
        for _ in 0..3 {
            c.request_advance(&sneaky, &mut host, &inst).unwrap();
        }
        assert_eq!(inst.seen_scope.get(), Some(InstallScope::CurrentUser));
    }

    #[test]
    fn license_gate_blocks_for_any_history() {
        let inst = FakeInstall::ok();
        for bounces in 0..4 {
            let mut host = RecordingHost::new();
            let mut c = WizardController::initialize(4, false, &mut host);
            c.request_advance(&form(false), &mut host, &inst).unwrap();
            for _ in 0..bounces {
                c.on_manual_page_change_attempt(&mut host);
                assert_eq!(
                    c.request_advance(&form(false), &mut host, &inst),
                    Err(BlockedReason::LicenseNotAccepted)
                );
            }
            let before = c.state().clone();
            assert_eq!(
                c.request_advance(&form(false), &mut host, &inst),
                Err(BlockedReason::LicenseNotAccepted)
            );
            assert_eq!(c.state().current_page, before.current_page);
            assert_eq!(host.page, 1);
        }
    }

    #[test]
    fn blocked_license_is_surfaced_as_notice() {
        let mut host = RecordingHost::new();
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(4, false, &mut host);
        c.handle_event(WizardEvent::Next, &mut host, &inst);
        c.handle_event(WizardEvent::Next, &mut host, &inst);

        assert_eq!(c.state().current_page, 1);
        assert_eq!(host.notices.len(), 1);
        assert_eq!(host.notices[0].level, NoticeLevel::Info);
        assert!(host.notices[0].body.contains("accept the terms"));
    }

    #[test]
    fn happy_path_installs_and_exits() {
        let mut host = RecordingHost::new();
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(4, false, &mut host);
        to_install_page(&mut c, &mut host, &inst);
        assert_eq!(host.labels.get(&Control::Next).map(String::as_str), Some(INSTALL_LABEL));

        let out = c.request_advance(&form(true), &mut host, &inst).unwrap();
        assert_eq!(
            out,
            Advance::Installed {
                destination: PathBuf::from("/tmp/ip-geo")
            }
        );
        assert_eq!(c.state().page(), Some(Page::Done));
        assert_eq!(host.page, 3);
        assert_eq!(host.labels.get(&Control::Next).map(String::as_str), Some(EXIT_LABEL));
        assert_eq!(host.enabled.get(&Control::Next), Some(&true));
        assert_eq!(host.visible.get(&Control::Cancel), Some(&false));
        assert_eq!(host.progress.last(), Some(&100));
        assert_eq!(host.yields, 10);
        assert_eq!(
            c.state().installed_destination(),
            Some(std::path::Path::new("/tmp/ip-geo"))
        );

        assert_eq!(
            c.request_advance(&form(true), &mut host, &inst),
            Ok(Advance::Closed)
        );
        assert!(host.closed);
        assert_eq!(*inst.calls.borrow(), 1);
    }

    #[test]
    fn advance_is_monotonic_and_bounded() {
        for page_count in 1..=6 {
            for pattern in 0u32..64 {
                let mut host = RecordingHost::new();
                let inst = FakeInstall::ok();
                let mut c = WizardController::initialize(page_count, false, &mut host);
                for step in 0..8 {
                    let before = c.state().current_page;
                    let accepted = pattern & (1 << (step % 6)) != 0;
                    let _ = c.request_advance(&form(accepted), &mut host, &inst);
                    let after = c.state().current_page;
                    assert!(after >= before, "page went back");
                    assert!(after <= before + 1, "page skipped");
                    assert!(after < c.state().page_count, "page out of range");
                }
            }
        }
    }

    #[test]
    fn manual_tab_change_is_reverted() {
        let mut host = RecordingHost::new();
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(4, false, &mut host);
        c.request_advance(&form(false), &mut host, &inst).unwrap();

        for target in [0, 2, 3] {
            host.click_tab(target);
            assert_eq!(
                c.on_manual_page_change_attempt(&mut host),
                PageChange::Reverted
            );
            assert_eq!(host.page, 1);
            assert_eq!(c.state().current_page, 1);
            assert!(!c.state().tab_change_allowed);
        }
    }

    #[test]
    fn page_changed_event_reverts() {
        let mut host = RecordingHost::new();
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(4, false, &mut host);
        host.click_tab(3);
        c.handle_event(WizardEvent::PageChanged, &mut host, &inst);
        assert_eq!(host.page, 0);
    }

    #[test]
    fn side_effect_notifications_from_programmatic_moves_are_accepted() {
        let mut host = RecordingHost {
            fires_on_set: true,
            ..RecordingHost::default()
        };
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(4, false, &mut host);
        c.request_advance(&form(false), &mut host, &inst).unwrap();
        c.request_advance(&form(true), &mut host, &inst).unwrap();

        assert_eq!(host.page, 2);
        assert_eq!(c.state().current_page, 2);
        // init + two moves, each notified exactly once
        assert_eq!(host.notifications, 3);
        assert_eq!(c.guard(), NavigationGuard::Locked);
    }

    #[test]
    fn cancel_during_install_closes_without_advancing() {
        let mut host = RecordingHost {
            close_after_yields: Some(3),
            ..RecordingHost::default()
        };
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(4, false, &mut host);
        to_install_page(&mut c, &mut host, &inst);

        let out = c.request_advance(&form(true), &mut host, &inst).unwrap();

        assert_eq!(out, Advance::InstallCancelled);
        assert_eq!(c.state().phase, WizardPhase::Closed);
        assert_eq!(c.state().current_page, 2);
        assert!(host.closed);
        assert_eq!(host.progress.last(), Some(&30));
        assert_eq!(host.notices[0].level, NoticeLevel::Warning);
        assert_eq!(
            c.request_advance(&form(true), &mut host, &inst),
            Err(BlockedReason::Closed)
        );
    }

    #[test]
    fn advance_while_installing_is_refused() {
        let mut host = RecordingHost::new();
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(4, false, &mut host);
        to_install_page(&mut c, &mut host, &inst);
        c.state.phase = WizardPhase::Installing;

        assert_eq!(
            c.request_advance(&form(true), &mut host, &inst),
            Err(BlockedReason::InstallInProgress)
        );
        assert_eq!(c.state().current_page, 2);
        assert_eq!(*inst.calls.borrow(), 0);

        c.handle_event(WizardEvent::Next, &mut host, &inst);
        assert!(host.notices.is_empty());
        assert!(!host.closed);
    }

    #[test]
    fn io_failure_leaves_an_exitable_wizard() {
        let mut host = RecordingHost::new();
        let inst = FakeInstall::with(CopyOutcome::IoFailure("disk full".to_string()));
        let mut c = WizardController::initialize(4, false, &mut host);
        to_install_page(&mut c, &mut host, &inst);

        let out = c.request_advance(&form(true), &mut host, &inst).unwrap();

        assert_eq!(out, Advance::InstallFailed("disk full".to_string()));
        assert_eq!(c.state().current_page, 2);
        assert!(!host.closed);
        assert_eq!(host.enabled.get(&Control::Next), Some(&false));
        assert_eq!(host.labels.get(&Control::Cancel).map(String::as_str), Some(EXIT_LABEL));
        assert_eq!(host.notices[0].level, NoticeLevel::Critical);
        assert!(host.notices[0].body.contains("disk full"));
        assert_eq!(
            c.request_advance(&form(true), &mut host, &inst),
            Err(BlockedReason::InstallFailed)
        );
        assert_eq!(*inst.calls.borrow(), 1);

        c.handle_event(WizardEvent::Cancel, &mut host, &inst);
        assert!(host.closed);
    }

    #[test]
    fn install_on_last_page_stays_put() {
        let mut host = RecordingHost::new();
        let inst = FakeInstall::ok();
        let mut c = WizardController::initialize(3, false, &mut host);
        to_install_page(&mut c, &mut host, &inst);

        let out = c.request_advance(&form(true), &mut host, &inst).unwrap();
        assert!(matches!(out, Advance::Installed { .. }));
        assert_eq!(c.state().current_page, 2);
        assert_eq!(
            c.request_advance(&form(true), &mut host, &inst),
            Ok(Advance::Closed)
        );
    }
}
