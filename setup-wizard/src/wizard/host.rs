//! The boundary between the wizard controller and whatever draws it.
//!
//! Hosts own widgets and raw input. They report user intent to the controller and apply
//! what the controller tells them; they never change wizard state themselves.

use crate::installation::files::{CopyObserver, CopyProgress};
use crate::models::state::InstallScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkbox {
    AcceptLicense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioGroup {
    InstallScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Next,
    Cancel,
    AllUsersOption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Critical,
}

/// A modal message the host must show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: body.into(),
        }
    }
}

pub trait WizardHost {
    fn checkbox_state(&self, id: Checkbox) -> bool;
    fn radio_selection(&self, id: RadioGroup) -> InstallScope;
    fn set_radio_selection(&mut self, id: RadioGroup, scope: InstallScope);

    fn set_label_text(&mut self, id: Control, text: &str);
    fn set_control_enabled(&mut self, id: Control, enabled: bool);
    fn set_control_visible(&mut self, id: Control, visible: bool);
    fn set_progress_value(&mut self, percent: u8);

    /// Show page `index`. Returns true when the host fired its page-changed notification
    /// as a side effect; the controller handles that notification before returning.
    fn set_page_index(&mut self, index: usize) -> bool;
    fn page_index(&self) -> usize;

    /// Cooperative yield: handle input queued since the last call, then return.
    fn process_pending_events(&mut self);
    fn is_open(&self) -> bool;
    fn close(&mut self);

    fn notify(&mut self, notice: Notice);
}

/// Routes copy progress to a host: update the indicator and yield after every chunk,
/// keep going while the window is open.
pub(crate) struct HostObserver<'a, H: WizardHost + ?Sized> {
    pub(crate) host: &'a mut H,
}

impl<H: WizardHost + ?Sized> CopyObserver for HostObserver<'_, H> {
    fn on_progress(&mut self, progress: &CopyProgress) {
        self.host.set_progress_value(progress.percent_rounded());
        self.host.process_pending_events();
    }

    fn should_continue(&mut self) -> bool {
        self.host.is_open()
    }
}
