// Wizard state (in-memory)
//
// NOTE: This is NOT persisted; it lives exactly as long as the wizard window.
// Only `WizardController` mutates it. Hosts get a shared reference for rendering.

use std::fmt;
use std::path::{Path, PathBuf};

/// The pages of the linear install flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Welcome,
    License,
    Install,
    Done,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Welcome, Page::License, Page::Install, Page::Done];

    /// Page shown at `index`, if the index names one of the known pages.
    pub fn from_index(index: usize) -> Option<Page> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Page::Welcome => 0,
            Page::License => 1,
            Page::Install => 2,
            Page::Done => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Welcome => "Welcome",
            Page::License => "License",
            Page::Install => "Install",
            Page::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallScope {
    CurrentUser,
    AllUsers,
}

impl InstallScope {
    pub fn as_id(&self) -> &'static str {
        match self {
            InstallScope::CurrentUser => "user",
            InstallScope::AllUsers => "all",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "me" | "current" | "current-user" => Some(InstallScope::CurrentUser),
            "all" | "everyone" | "system" | "all-users" => Some(InstallScope::AllUsers),
            _ => None,
        }
    }
}

impl fmt::Display for InstallScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_id())
    }
}

/// Where the wizard is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    Browsing,
    Installing,
    Installed { destination: PathBuf },
    InstallFailed(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub current_page: usize,
    pub page_count: usize,
    /// True only while the controller itself repositions the page.
    pub tab_change_allowed: bool,
    pub license_accepted: bool,
    pub install_scope: InstallScope,
    pub all_users_available: bool,
    pub phase: WizardPhase,
}

impl WizardState {
    pub fn new(page_count: usize, has_elevated_privilege: bool) -> Self {
        Self {
            current_page: 0,
            page_count: page_count.max(1),
            tab_change_allowed: false,
            license_accepted: false,
            install_scope: if has_elevated_privilege {
                InstallScope::AllUsers
            } else {
                InstallScope::CurrentUser
            },
            all_users_available: has_elevated_privilege,
            phase: WizardPhase::Browsing,
        }
    }

    pub fn page(&self) -> Option<Page> {
        Page::from_index(self.current_page)
    }

    pub fn last_page(&self) -> usize {
        self.page_count - 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page >= self.last_page()
    }

    /// Where the binary went, once the install succeeded.
    pub fn installed_destination(&self) -> Option<&Path> {
        match &self.phase {
            WizardPhase::Installed { destination } => Some(destination),
            _ => None,
        }
    }
}
