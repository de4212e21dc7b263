//! Terminal UI (TUI) host for the setup wizard.
//!
//! Requirements (UI):
//! - Centered "installer window" frame titled "<Program> Setup"
//! - Page tab strip (Welcome / License / Install / Done); tabs can be "clicked" with F1-F4,
//!   the controller puts the page back
//! - Bottom button row: [ Next ] [ Cancel ]
//! - Modal notices and confirmations (cancel, overwrite existing install)
//!
//! Note: Logging is file-only in TUI mode (stdout logging is disabled) to avoid corrupting the terminal UI.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{error, info, warn};
use ratatui::backend::{Backend, CrosstermBackend, TestBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::installation::shortcuts::ShortcutKind;
use crate::installation::Installer;
use crate::models::config::InstallerConfig;
use crate::models::state::{InstallScope, Page};
use crate::utils::placeholders::Substitutions;
use crate::utils::{path_resolver, privilege};
use crate::wizard::host::{Checkbox, Control, Notice, NoticeLevel, RadioGroup, WizardHost};
use crate::wizard::{WizardController, WizardEvent, EXIT_LABEL, NEXT_LABEL};

const BUILTIN_LICENSE: &str = "\
{name} {version}
Copyright (c) {developer} <{email}>

Permission is hereby granted, free of charge, to any person obtaining a copy of this software,
to deal in the software without restriction, including without limitation the rights to use,
copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED,
INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR
PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE
FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY ARISING FROM, OUT OF OR IN CONNECTION WITH THE
SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.";

const LICENSE_VISIBLE_LINES: usize = 12;

/// Display strings, placeholder-substituted once before the first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTexts {
    pub window_title: String,
    pub welcome: String,
    pub description: String,
    pub license: String,
    pub install_for_me_only: String,
    pub install_for_everyone: String,
    pub thank_you: String,
}

impl PageTexts {
    pub fn load(config: &InstallerConfig, deployment_folder: &Path, user: &str) -> Result<Self> {
        let subs = Substitutions::for_product(config, user)?;

        let license_template = match path_resolver::resolve_license_file(deployment_folder, config)
        {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        "[PHASE: tui] [STEP: license] could not read {:?} ({}); using built-in text",
                        path, e
                    );
                    BUILTIN_LICENSE.to_string()
                }
            },
            None => BUILTIN_LICENSE.to_string(),
        };

        Ok(Self {
            window_title: subs.apply("{name} Setup"),
            welcome: subs.apply("Welcome to the {name} {version} setup wizard, {user}!"),
            description: subs.apply(&config.description),
            license: subs.apply(&license_template),
            install_for_me_only: subs.apply("Install for me only ({user})"),
            install_for_everyone: subs.apply("Install for all users"),
            thank_you: subs.apply(
                "Thank you for installing {name}, {user}!\n\n\
                 {name} is developed by {developer} and maintained by {maintainer} <{email}>.",
            ),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonFocus {
    Next,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    ConfirmCancel {
        yes_focused: bool,
    },
    ConfirmOverwrite {
        path: PathBuf,
        identical: bool,
        yes_focused: bool,
    },
    Message(Notice),
}

/// What a key press asks the run loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Wizard(WizardEvent),
    Shortcut(ShortcutKind),
    Launch,
    Quit,
}

/// Everything drawn on screen. Widgets only; wizard state lives in the controller.
#[derive(Debug, Clone)]
struct View {
    texts: PageTexts,
    page: usize,
    page_count: usize,
    license_checked: bool,
    license_scroll: usize,
    scope: InstallScope,
    all_users_enabled: bool,
    next_label: String,
    next_enabled: bool,
    next_visible: bool,
    cancel_label: String,
    cancel_enabled: bool,
    cancel_visible: bool,
    progress: u8,
    focus: ButtonFocus,
    modal: Option<Modal>,
    installed: Option<PathBuf>,
    open: bool,
}

impl View {
    fn new(texts: PageTexts) -> Self {
        Self {
            texts,
            page: 0,
            page_count: Page::ALL.len(),
            license_checked: false,
            license_scroll: 0,
            scope: InstallScope::CurrentUser,
            all_users_enabled: false,
            next_label: NEXT_LABEL.to_string(),
            next_enabled: true,
            next_visible: true,
            cancel_label: "Cancel".to_string(),
            cancel_enabled: true,
            cancel_visible: true,
            progress: 0,
            focus: ButtonFocus::Next,
            modal: None,
            installed: None,
            open: true,
        }
    }

    fn current_page(&self) -> Option<Page> {
        Page::from_index(self.page)
    }

    fn next_usable(&self) -> bool {
        self.next_visible && self.next_enabled
    }

    fn cancel_usable(&self) -> bool {
        self.cancel_visible && self.cancel_enabled
    }
}

/// Ratatui-backed [`WizardHost`].
pub struct TuiHost<B: Backend> {
    terminal: Terminal<B>,
    view: View,
    /// Read keys from the real terminal while copying and inside notices.
    interactive: bool,
}

impl<B: Backend> TuiHost<B> {
    fn new(terminal: Terminal<B>, view: View, interactive: bool) -> Self {
        Self {
            terminal,
            view,
            interactive,
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let view = &self.view;
        self.terminal.draw(|f| draw(f.size(), f, view))?;
        Ok(())
    }

    /// Keep showing the current notice until the user dismisses it.
    fn wait_for_dismiss(&mut self) -> Result<()> {
        while matches!(self.view.modal, Some(Modal::Message(_))) {
            self.redraw()?;
            if let Event::Key(key) = event::read()? {
                handle_key(&mut self.view, key.code);
            }
        }
        Ok(())
    }
}

impl<B: Backend> WizardHost for TuiHost<B> {
    fn checkbox_state(&self, id: Checkbox) -> bool {
        match id {
            Checkbox::AcceptLicense => self.view.license_checked,
        }
    }

    fn radio_selection(&self, id: RadioGroup) -> InstallScope {
        match id {
            RadioGroup::InstallScope => self.view.scope,
        }
    }

    fn set_radio_selection(&mut self, id: RadioGroup, scope: InstallScope) {
        match id {
            RadioGroup::InstallScope => self.view.scope = scope,
        }
    }

    fn set_label_text(&mut self, id: Control, text: &str) {
        match id {
            Control::Next => self.view.next_label = text.to_string(),
            Control::Cancel => self.view.cancel_label = text.to_string(),
            Control::AllUsersOption => self.view.texts.install_for_everyone = text.to_string(),
        }
    }

    fn set_control_enabled(&mut self, id: Control, enabled: bool) {
        match id {
            Control::Next => self.view.next_enabled = enabled,
            Control::Cancel => self.view.cancel_enabled = enabled,
            Control::AllUsersOption => self.view.all_users_enabled = enabled,
        }
        fix_focus(&mut self.view);
    }

    fn set_control_visible(&mut self, id: Control, visible: bool) {
        match id {
            Control::Next => self.view.next_visible = visible,
            Control::Cancel => self.view.cancel_visible = visible,
            Control::AllUsersOption => self.view.all_users_enabled &= visible,
        }
        fix_focus(&mut self.view);
    }

    fn set_progress_value(&mut self, percent: u8) {
        self.view.progress = percent.min(100);
    }

    fn set_page_index(&mut self, index: usize) -> bool {
        self.view.page = index.min(self.view.page_count.saturating_sub(1));
        false
    }

    fn page_index(&self) -> usize {
        self.view.page
    }

    fn process_pending_events(&mut self) {
        if let Err(e) = self.redraw() {
            warn!("[PHASE: tui] [STEP: yield] redraw failed: {:#}", e);
        }
        if !self.interactive {
            return;
        }
        loop {
            match event::poll(Duration::from_millis(0)) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("[PHASE: tui] [STEP: yield] event poll failed: {}", e);
                    break;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) => {
                    if matches!(key.code, KeyCode::Esc | KeyCode::Char('c')) {
                        info!("[PHASE: tui] [STEP: yield] window closed during copy");
                        self.view.open = false;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("[PHASE: tui] [STEP: yield] event read failed: {}", e);
                    break;
                }
            }
        }
    }

    fn is_open(&self) -> bool {
        self.view.open
    }

    fn close(&mut self) {
        self.view.open = false;
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("[PHASE: tui] [STEP: notice] {}: {}", notice.title, notice.body),
            NoticeLevel::Warning => {
                warn!("[PHASE: tui] [STEP: notice] {}: {}", notice.title, notice.body)
            }
            NoticeLevel::Critical => {
                error!("[PHASE: tui] [STEP: notice] {}: {}", notice.title, notice.body)
            }
        }
        self.view.modal = Some(Modal::Message(notice));
        if self.interactive {
            if let Err(e) = self.wait_for_dismiss() {
                warn!("[PHASE: tui] [STEP: notice] {:#}", e);
                self.view.modal = None;
            }
        }
    }
}

/// Interactive wizard on the real terminal.
pub fn run(installer: &Installer, deployment_folder: &Path) -> Result<()> {
    info!("[PHASE: tui] [STEP: start] Starting TUI wizard");

    let user = privilege::current_user_display_name();
    let texts = PageTexts::load(installer.config(), deployment_folder, &user)?;
    let mut view = View::new(texts);

    match installer.detect_existing() {
        Ok(Some(existing)) => {
            view.modal = Some(Modal::ConfirmOverwrite {
                path: existing.path,
                identical: existing.identical,
                yes_focused: false,
            });
        }
        Ok(None) => {}
        Err(e) => warn!(
            "[PHASE: tui] [STEP: existing_install] check failed: {:#}",
            e
        ),
    }

    let terminal = setup_terminal()?;
    let mut host = TuiHost::new(terminal, view, true);
    let result = run_loop(&mut host, installer);
    restore_terminal(&mut host.terminal)?;

    result
}

/// Non-interactive smoke mode: render a single frame and exit.
/// Target pages: welcome|license|install|done
pub fn smoke(config: &InstallerConfig, deployment_folder: &Path, target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={} license={}",
        target,
        license_source(config, deployment_folder)
    );

    let texts = PageTexts::load(
        config,
        deployment_folder,
        &privilege::current_user_display_name(),
    )?;
    let view = smoke_view(config, texts, target)?;

    // In-memory backend: no raw mode, no alternate screen.
    let backend = TestBackend::new(100, 30);
    let terminal = Terminal::new(backend)?;
    let mut host = TuiHost::new(terminal, view, false);
    host.redraw()
}

fn smoke_view(config: &InstallerConfig, texts: PageTexts, target: &str) -> Result<View> {
    let page = match target.trim().to_ascii_lowercase().as_str() {
        "" | "welcome" => Page::Welcome,
        "license" => Page::License,
        "install" => Page::Install,
        "done" => Page::Done,
        other => anyhow::bail!(
            "Unknown smoke target '{}' (expected welcome|license|install|done)",
            other
        ),
    };

    let mut view = View::new(texts);
    view.page = page.index();
    match page {
        Page::Welcome => {}
        Page::License => view.license_checked = true,
        Page::Install => {
            view.license_checked = true;
            view.next_label = crate::wizard::INSTALL_LABEL.to_string();
            view.progress = 42;
        }
        Page::Done => {
            view.license_checked = true;
            view.progress = 100;
            view.next_label = EXIT_LABEL.to_string();
            view.cancel_visible = false;
            view.installed = Some(config.system_bin_dir.join(&config.binary_name));
        }
    }
    Ok(view)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop<B: Backend>(host: &mut TuiHost<B>, installer: &Installer) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut controller = WizardController::initialize(
        Page::ALL.len(),
        privilege::has_elevated_privilege(),
        host,
    );

    while host.is_open() {
        host.redraw()?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = handle_key(&mut host.view, key.code) {
                    dispatch(action, &mut controller, host, installer);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    info!("[PHASE: tui] [STEP: exit] wizard closed");
    Ok(())
}

fn dispatch<B: Backend>(
    action: Action,
    controller: &mut WizardController,
    host: &mut TuiHost<B>,
    installer: &Installer,
) {
    match action {
        Action::Wizard(event) => controller.handle_event(event, host, installer),
        Action::Quit => controller.request_cancel(host),
        Action::Shortcut(kind) => {
            if let Some(installed) = controller.state().installed_destination() {
                let notice = match installer.create_shortcut(kind, installed) {
                    Ok(path) => Notice::new(
                        NoticeLevel::Info,
                        "Shortcut",
                        format!("Created {} at {}", kind.label(), path.display()),
                    ),
                    Err(e) => Notice::new(
                        NoticeLevel::Warning,
                        "Shortcut",
                        format!("Could not create the {}: {:#}", kind.label(), e),
                    ),
                };
                host.notify(notice);
            }
        }
        Action::Launch => {
            if let Some(installed) = controller.state().installed_destination() {
                if let Err(e) = installer.launch(installed) {
                    host.notify(Notice::new(
                        NoticeLevel::Warning,
                        "Launch",
                        format!("Could not launch the program: {:#}", e),
                    ));
                }
            }
        }
    }
    host.view.installed = controller
        .state()
        .installed_destination()
        .map(Path::to_path_buf);
}

fn fix_focus(view: &mut View) {
    let focus_ok = match view.focus {
        ButtonFocus::Next => view.next_usable(),
        ButtonFocus::Cancel => view.cancel_usable(),
    };
    if !focus_ok {
        view.focus = if view.next_usable() {
            ButtonFocus::Next
        } else {
            ButtonFocus::Cancel
        };
    }
}

fn cycle_focus(view: &mut View) {
    let other = match view.focus {
        ButtonFocus::Next => ButtonFocus::Cancel,
        ButtonFocus::Cancel => ButtonFocus::Next,
    };
    let usable = match other {
        ButtonFocus::Next => view.next_usable(),
        ButtonFocus::Cancel => view.cancel_usable(),
    };
    if usable {
        view.focus = other;
    }
}

fn cancel_action(view: &mut View) -> Option<Action> {
    // Nothing left to lose once installed or failed: close straight away.
    if !view.cancel_visible || view.cancel_label == EXIT_LABEL {
        return Some(Action::Wizard(WizardEvent::Cancel));
    }
    if view.cancel_enabled {
        view.modal = Some(Modal::ConfirmCancel { yes_focused: false });
    }
    None
}

fn handle_key(view: &mut View, code: KeyCode) -> Option<Action> {
    if let Some(modal) = view.modal.take() {
        return handle_modal_key(view, modal, code);
    }

    let page = view.current_page();
    match code {
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
            cycle_focus(view);
            None
        }
        KeyCode::Enter => match view.focus {
            ButtonFocus::Next if view.next_usable() => Some(Action::Wizard(WizardEvent::Next)),
            ButtonFocus::Cancel if view.cancel_usable() => cancel_action(view),
            _ => None,
        },
        KeyCode::Esc => cancel_action(view),
        KeyCode::Char(' ') if page == Some(Page::License) => {
            view.license_checked = !view.license_checked;
            None
        }
        KeyCode::PageDown if page == Some(Page::License) => {
            let max = view.texts.license.lines().count().saturating_sub(1);
            view.license_scroll = (view.license_scroll + LICENSE_VISIBLE_LINES / 2).min(max);
            None
        }
        KeyCode::PageUp if page == Some(Page::License) => {
            view.license_scroll = view.license_scroll.saturating_sub(LICENSE_VISIBLE_LINES / 2);
            None
        }
        KeyCode::Up if page == Some(Page::Install) => {
            view.scope = InstallScope::CurrentUser;
            None
        }
        KeyCode::Down if page == Some(Page::Install) => {
            if view.all_users_enabled {
                view.scope = InstallScope::AllUsers;
            }
            None
        }
        KeyCode::F(n) if n >= 1 && usize::from(n) <= view.page_count => {
            // Same as clicking a tab: the page moves first, then the change is reported.
            view.page = usize::from(n) - 1;
            Some(Action::Wizard(WizardEvent::PageChanged))
        }
        KeyCode::Char(c) if page == Some(Page::Done) && view.installed.is_some() => match c {
            'd' => Some(Action::Shortcut(ShortcutKind::Desktop)),
            'm' => Some(Action::Shortcut(ShortcutKind::Menu)),
            'l' => Some(Action::Launch),
            _ => None,
        },
        _ => None,
    }
}

fn handle_modal_key(view: &mut View, modal: Modal, code: KeyCode) -> Option<Action> {
    match modal {
        Modal::Message(notice) => {
            if !matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                view.modal = Some(Modal::Message(notice));
            }
            None
        }
        Modal::ConfirmCancel { yes_focused } => match code {
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
                view.modal = Some(Modal::ConfirmCancel {
                    yes_focused: !yes_focused,
                });
                None
            }
            KeyCode::Enter if yes_focused => Some(Action::Wizard(WizardEvent::Cancel)),
            KeyCode::Char('y') => Some(Action::Wizard(WizardEvent::Cancel)),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('n') => None,
            _ => {
                view.modal = Some(Modal::ConfirmCancel { yes_focused });
                None
            }
        },
        Modal::ConfirmOverwrite {
            path,
            identical,
            yes_focused,
        } => match code {
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
                view.modal = Some(Modal::ConfirmOverwrite {
                    path,
                    identical,
                    yes_focused: !yes_focused,
                });
                None
            }
            KeyCode::Enter if yes_focused => None,
            KeyCode::Char('y') => None,
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('n') => Some(Action::Quit),
            _ => {
                view.modal = Some(Modal::ConfirmOverwrite {
                    path,
                    identical,
                    yes_focused,
                });
                None
            }
        },
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame<'_>, view: &View) {
    let window_area = centered_window(area, 100, 30);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title(view.texts.window_title.as_str());
    f.render_widget(outer_block, window_area);

    // Inner layout: tabs + content + buttons row
    let inner = window_area.inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(inner);

    let titles: Vec<String> = Page::ALL
        .iter()
        .take(view.page_count)
        .enumerate()
        .map(|(i, p)| format!("F{} {}", i + 1, p.title()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(view.page)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_widget(tabs, rows[0]);

    let title = view.current_page().map(Page::title).unwrap_or("");
    let content = Paragraph::new(page_text(view))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(content, rows[1]);

    draw_buttons(f, rows[2], view);

    match &view.modal {
        Some(Modal::ConfirmCancel { yes_focused }) => draw_confirm_modal(
            f,
            window_area,
            "Cancel Setup?",
            "If you cancel now, the program will not be installed.",
            "Yes, cancel",
            *yes_focused,
        ),
        Some(Modal::ConfirmOverwrite {
            path,
            identical,
            yes_focused,
        }) => {
            let body = if *identical {
                format!(
                    "This version is already installed at {}.\nInstall it again?",
                    path.display()
                )
            } else {
                format!(
                    "A different version is installed at {}.\nReplace it?",
                    path.display()
                )
            };
            draw_confirm_modal(f, window_area, "Already Installed", &body, "Continue", *yes_focused)
        }
        Some(Modal::Message(notice)) => draw_message_modal(f, window_area, notice),
        None => {}
    }
}

fn page_text(view: &View) -> Text<'static> {
    match view.current_page() {
        Some(Page::Welcome) | None => Text::from(vec![
            Line::from(view.texts.welcome.clone()),
            Line::from(""),
            Line::from(view.texts.description.clone()),
            Line::from(""),
            Line::from("Press Enter to continue."),
        ]),
        Some(Page::License) => {
            let accept = if view.license_checked { "[x]" } else { "[ ]" };
            let mut lines: Vec<Line> = view
                .texts
                .license
                .lines()
                .skip(view.license_scroll)
                .take(LICENSE_VISIBLE_LINES)
                .map(|l| Line::from(l.to_string()))
                .collect();
            lines.push(Line::from(""));
            lines.push(Line::from(format!(
                "{} I accept the terms of the license agreement",
                accept
            )));
            lines.push(Line::from(""));
            lines.push(Line::from("Space toggles the checkbox. PgUp/PgDn scroll."));
            Text::from(lines)
        }
        Some(Page::Install) => {
            let me = if view.scope == InstallScope::CurrentUser {
                "(x)"
            } else {
                "( )"
            };
            let all = if view.scope == InstallScope::AllUsers {
                "(x)"
            } else {
                "( )"
            };
            let all_style = if view.all_users_enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let mut all_line = format!("{} {}", all, view.texts.install_for_everyone);
            if !view.all_users_enabled {
                all_line.push_str(" (requires root)");
            }

            let width = 30usize;
            let filled = (usize::from(view.progress) * width) / 100;
            let bar = format!(
                "[{}{}] {}%",
                "#".repeat(filled),
                " ".repeat(width.saturating_sub(filled)),
                view.progress
            );

            Text::from(vec![
                Line::from(format!("{} {}", me, view.texts.install_for_me_only)),
                Line::from(Span::styled(all_line, all_style)),
                Line::from(""),
                Line::from(bar),
                Line::from(""),
                Line::from("Up/Down selects where to install. Press Esc or 'c' to stop a running copy."),
            ])
        }
        Some(Page::Done) => {
            let mut lines: Vec<Line> = view
                .texts
                .thank_you
                .lines()
                .map(|l| Line::from(l.to_string()))
                .collect();
            lines.push(Line::from(""));
            if let Some(p) = view.installed.as_ref() {
                lines.push(Line::from(format!("Installed to: {}", p.display())));
                lines.push(Line::from(""));
                lines.push(Line::from(
                    "[d] Add desktop entry   [m] Add menu entry   [l] Launch now",
                ));
            }
            Text::from(lines)
        }
    }
}

fn centered_window(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(2)).max(60).min(area.width);
    let h = height.min(area.height.saturating_sub(2)).max(20).min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

fn draw_buttons(f: &mut ratatui::Frame<'_>, area: Rect, view: &View) {
    let mut spans = Vec::new();
    if view.next_visible {
        spans.push(button_text(
            &view.next_label,
            view.focus == ButtonFocus::Next,
            view.next_enabled,
        ));
    }
    if view.cancel_visible {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(button_text(
            &view.cancel_label,
            view.focus == ButtonFocus::Cancel,
            view.cancel_enabled,
        ));
    }

    let p = Paragraph::new(Text::from(Line::from(spans))).alignment(Alignment::Right);
    f.render_widget(p, area);
}

fn button_text(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default();
    if !enabled {
        style = style.fg(Color::DarkGray);
    }
    if focused && enabled {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(format!("[ {} ]", label), style)
}

fn modal_area(window_area: Rect, width: u16, height: u16) -> Rect {
    let modal_w = width.min(window_area.width.saturating_sub(4)).max(40);
    let modal_h = height.min(window_area.height.saturating_sub(4)).max(7);
    let x = window_area.x + (window_area.width.saturating_sub(modal_w)) / 2;
    let y = window_area.y + (window_area.height.saturating_sub(modal_h)) / 2;
    Rect {
        x,
        y,
        width: modal_w,
        height: modal_h,
    }
}

fn modal_buttons_area(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    }
}

fn draw_confirm_modal(
    f: &mut ratatui::Frame<'_>,
    window_area: Rect,
    title: &str,
    body: &str,
    yes_label: &str,
    yes_focused: bool,
) {
    let area = modal_area(window_area, 64, 8);
    f.render_widget(Clear, area);

    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let p = Paragraph::new(Text::from(body.to_string()))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);

    let yes = button_text(yes_label, yes_focused, true);
    let no = button_text("No", !yes_focused, true);
    let line = Line::from(vec![yes, Span::raw(" "), no]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}

fn draw_message_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, notice: &Notice) {
    let area = modal_area(window_area, 70, 10);
    f.render_widget(Clear, area);

    let border = match notice.level {
        NoticeLevel::Info => Style::default(),
        NoticeLevel::Warning => Style::default().fg(Color::Yellow),
        NoticeLevel::Critical => Style::default().fg(Color::Red),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(notice.title.clone());
    let p = Paragraph::new(Text::from(notice.body.clone()))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);

    let ok = button_text("OK", true, true);
    let p = Paragraph::new(Text::from(Line::from(vec![ok]))).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}

/// Text of the last frame drawn to an in-memory terminal, row by row.
fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buf = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buf.area.height {
        for x in 0..buf.area.width {
            out.push_str(buf.get(x, y).symbol());
        }
        out.push('\n');
    }
    out
}

/// Where the license text is read from, for diagnostics.
pub fn license_source(config: &InstallerConfig, deployment_folder: &Path) -> String {
    path_resolver::resolve_license_file(deployment_folder, config)
        .filter(|p| p.is_file())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string())
}

/// Renders `target` into an in-memory terminal and returns the screen text.
pub fn render_to_string(
    config: &InstallerConfig,
    deployment_folder: &Path,
    target: &str,
    width: u16,
    height: u16,
) -> Result<String> {
    let texts = PageTexts::load(config, deployment_folder, "User")?;
    let view = smoke_view(config, texts, target)?;
    let mut terminal =
        Terminal::new(TestBackend::new(width, height)).context("create in-memory terminal")?;
    terminal.draw(|f| draw(f.size(), f, &view))?;
    Ok(screen_text(&terminal))
}
