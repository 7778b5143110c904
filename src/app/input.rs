//! Input handling for the kiosk TUI
//!
//! Keys are first translated into a `KeyAction` against the current screen,
//! then applied. Translation is pure so every binding can be tested without a
//! terminal or a runtime.

use crate::app::background::dispatch;
use crate::app::navigation::NavigationInterceptor;
use crate::app::RuntimeContext;
use crate::config::Config;
use crate::kiosk::{Event, Modal, Step};
use crate::ui::{App, Focus, ToastKind};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

#[derive(Debug)]
pub enum KeyAction {
    Dispatch(Event),
    MoveCursor(isize),
    ToggleFocus,
    CycleBranch,
    Quit,
    Ignore,
}

// ═══════════════════════════════════════════════════════════════════════════
//  KEY MAP
// ═══════════════════════════════════════════════════════════════════════════

pub fn map_key(app: &App, key: &KeyEvent) -> KeyAction {
    use KeyAction::{Dispatch, Ignore};

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('q') => KeyAction::Quit,
            KeyCode::Char('b') => KeyAction::CycleBranch,
            _ => Ignore,
        };
    }

    let modal = app.session.active_modal();
    let editing_text = modal == Modal::ContractValidation;
    if let Some(event) = NavigationInterceptor.intercept(key, editing_text) {
        return Dispatch(event);
    }

    match modal {
        Modal::ContractValidation => {
            return match key.code {
                KeyCode::Enter => Dispatch(Event::SubmitContract),
                KeyCode::Esc => Dispatch(Event::DismissContract),
                KeyCode::Backspace => Dispatch(Event::ContractBackspace),
                KeyCode::Char(c) => Dispatch(Event::ContractInput(c)),
                _ => Ignore,
            };
        }
        Modal::Confirm => {
            return match key.code {
                KeyCode::Enter | KeyCode::Char('s') => Dispatch(Event::ConfirmTurn),
                KeyCode::Esc | KeyCode::Char('n') => Dispatch(Event::DismissConfirm),
                _ => Ignore,
            };
        }
        Modal::CancelConfirm => {
            return match key.code {
                KeyCode::Enter | KeyCode::Char('s') => Dispatch(Event::ConfirmCancel),
                KeyCode::Esc | KeyCode::Char('n') => Dispatch(Event::DismissCancel),
                _ => Ignore,
            };
        }
        Modal::PrivacyNotice => {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('p') => {
                    Dispatch(Event::DismissPrivacyNotice)
                }
                _ => Ignore,
            };
        }
        Modal::None => {}
    }

    match app.session.step() {
        Step::ClientType => match key.code {
            KeyCode::Char('1') => Dispatch(Event::ChooseNonClient),
            KeyCode::Char('2') => Dispatch(Event::ChooseClient),
            KeyCode::Up => KeyAction::MoveCursor(-1),
            KeyCode::Down => KeyAction::MoveCursor(1),
            KeyCode::Enter if app.client_cursor == 0 => Dispatch(Event::ChooseNonClient),
            KeyCode::Enter => Dispatch(Event::ChooseClient),
            KeyCode::Char('p') => Dispatch(Event::ShowPrivacyNotice),
            _ => Ignore,
        },
        Step::ServiceSelection => match key.code {
            KeyCode::Up => KeyAction::MoveCursor(-1),
            KeyCode::Down => KeyAction::MoveCursor(1),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                KeyAction::ToggleFocus
            }
            KeyCode::Enter => {
                let picked = match app.focus {
                    Focus::Areas => app
                        .area_under_cursor()
                        .map(|id| Event::SelectArea(id.to_string())),
                    Focus::Services => app
                        .service_under_cursor()
                        .map(|id| Event::SelectService(id.to_string())),
                };
                picked.map(Dispatch).unwrap_or(Ignore)
            }
            KeyCode::Char('p') => Dispatch(Event::ShowPrivacyNotice),
            _ => Ignore,
        },
        Step::Ticket => match key.code {
            KeyCode::Char('c') => Dispatch(Event::RequestCancel),
            KeyCode::Char('r') => Dispatch(Event::ManualReturn),
            KeyCode::Char('d') => Dispatch(Event::DownloadTicket),
            KeyCode::Char('p') => Dispatch(Event::ShowPrivacyNotice),
            _ => Ignore,
        },
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  MAIN INPUT DISPATCHER
// ═══════════════════════════════════════════════════════════════════════════

pub fn handle_key_event(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) -> Result<()> {
    match map_key(app, &key) {
        KeyAction::Dispatch(event) => {
            let picked_area = matches!(event, Event::SelectArea(_));
            dispatch(app, event, ctx);
            if picked_area {
                app.focus = Focus::Services;
                app.service_cursor = 0;
            }
        }
        KeyAction::MoveCursor(delta) => {
            app.move_cursor(delta);
            dispatch(app, Event::Activity, ctx);
        }
        KeyAction::ToggleFocus => {
            app.toggle_focus();
            app.clamp_cursors();
            dispatch(app, Event::Activity, ctx);
        }
        KeyAction::CycleBranch => cycle_branch(app, ctx),
        KeyAction::Quit => app.request_quit(),
        KeyAction::Ignore => {}
    }
    Ok(())
}

/// Operator shortcut: move to the next configured branch. The session hears
/// about it through the branch subscription like any other change.
fn cycle_branch(app: &mut App, ctx: &RuntimeContext) {
    let current = ctx.branches.current();
    let next = ctx.config.next_branch(&current.id);
    if !ctx.branches.select(next.clone()) {
        app.show_toast("Solo hay una sucursal configurada", ToastKind::Info);
        return;
    }
    if let Err(e) = Config::remember_branch(&next) {
        warn!("could not persist branch selection: {}", e);
    }
}
