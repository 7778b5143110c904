//! Terminal front end for the kiosk
//!
//! `App` wraps the session with the purely visual state the machine does not
//! care about: list cursors, focus and toast notifications.

mod helpers;
mod render;
pub mod theme;

pub use render::render;

use crate::kiosk::{KioskSession, ResetReason, Step};
use std::time::{Duration, Instant};

/// Window in which a second quit chord confirms the first
const QUIT_CONFIRM_WINDOW: Duration = Duration::from_secs(3);

// ═══════════════════════════════════════════════════════════════════════════
//  TOASTS
// ═══════════════════════════════════════════════════════════════════════════

/// Toast notification kind - affects duration and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
}

impl ToastKind {
    /// Duration in seconds before toast expires
    pub fn duration_secs(&self) -> u64 {
        match self {
            ToastKind::Info => 3,
            ToastKind::Success => 4,
            ToastKind::Error => 8,
        }
    }
}

/// Toast notification
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub created_at: Instant,
    pub kind: ToastKind,
}

impl Toast {
    pub fn new(message: &str, kind: ToastKind) -> Self {
        Self {
            message: message.to_string(),
            created_at: Instant::now(),
            kind,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed().as_secs() >= self.kind.duration_secs()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  APP
// ═══════════════════════════════════════════════════════════════════════════

/// Which list has the cursor on the service selection step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Areas,
    Services,
}

/// Options offered on the client type step, in display order
pub const CLIENT_OPTIONS: [&str; 2] = ["No soy cliente", "Soy cliente"];

pub struct App {
    pub session: KioskSession,
    pub privacy_notice: String,
    pub client_cursor: usize,
    pub area_cursor: usize,
    pub service_cursor: usize,
    pub focus: Focus,
    pub toast: Option<Toast>,
    pub last_reset: Option<ResetReason>,
    quit_armed_at: Option<Instant>,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: KioskSession, privacy_notice: String) -> Self {
        Self {
            session,
            privacy_notice,
            client_cursor: 0,
            area_cursor: 0,
            service_cursor: 0,
            focus: Focus::default(),
            toast: None,
            last_reset: None,
            quit_armed_at: None,
            should_quit: false,
        }
    }

    pub fn show_toast(&mut self, message: &str, kind: ToastKind) {
        if message.is_empty() {
            return;
        }
        self.toast = Some(Toast::new(message, kind));
    }

    pub fn clear_expired_toast(&mut self) {
        if let Some(ref toast) = self.toast {
            if toast.is_expired() {
                self.toast = None;
            }
        }
    }

    /// Operator quit chord. The first press only arms it; a second press
    /// inside the confirmation window quits.
    pub fn request_quit(&mut self) {
        self.request_quit_at(Instant::now());
    }

    fn request_quit_at(&mut self, now: Instant) {
        match self.quit_armed_at {
            Some(armed) if now.duration_since(armed) <= QUIT_CONFIRM_WINDOW => {
                self.should_quit = true;
            }
            _ => {
                self.quit_armed_at = Some(now);
                self.show_toast("Presiona Ctrl+Q de nuevo para cerrar el kiosco", ToastKind::Info);
            }
        }
    }

    /// Visual state follows the session back to its first screen.
    pub fn on_session_reset(&mut self, reason: ResetReason) {
        self.client_cursor = 0;
        self.area_cursor = 0;
        self.service_cursor = 0;
        self.focus = Focus::Areas;
        self.last_reset = Some(reason);
    }

    /// Move the cursor of whatever list is active on the current step.
    pub fn move_cursor(&mut self, delta: isize) {
        match self.session.step() {
            Step::ClientType => {
                self.client_cursor = step_cursor(self.client_cursor, delta, CLIENT_OPTIONS.len());
            }
            Step::ServiceSelection => match self.focus {
                Focus::Areas => {
                    let len = self.session.selection().areas().len();
                    self.area_cursor = step_cursor(self.area_cursor, delta, len);
                }
                Focus::Services => {
                    let len = self.session.selection().services().len();
                    self.service_cursor = step_cursor(self.service_cursor, delta, len);
                }
            },
            Step::Ticket => {}
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Areas => Focus::Services,
            Focus::Services => Focus::Areas,
        };
    }

    /// Lists change underneath the cursors when responses arrive. Focus on
    /// an empty service list is kept while that list is still loading.
    pub fn clamp_cursors(&mut self) {
        let selection = self.session.selection();
        let areas = selection.areas().len();
        let services = selection.services().len();
        let services_loading = selection.is_loading_services();
        self.area_cursor = self.area_cursor.min(areas.saturating_sub(1));
        self.service_cursor = self.service_cursor.min(services.saturating_sub(1));
        if services == 0 && !services_loading && self.focus == Focus::Services {
            self.focus = Focus::Areas;
        }
    }

    pub fn area_under_cursor(&self) -> Option<&str> {
        self.session
            .selection()
            .areas()
            .get(self.area_cursor)
            .map(|a| a.id.as_str())
    }

    pub fn service_under_cursor(&self) -> Option<&str> {
        self.session
            .selection()
            .services()
            .get(self.service_cursor)
            .map(|s| s.id.as_str())
    }
}

fn step_cursor(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize).min(max)
    }
}
