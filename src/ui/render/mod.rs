mod footer;
mod header;
mod overlays;
mod steps;
mod toast;

use crate::kiosk::Modal;
use crate::ui::theme::Theme;
use crate::ui::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
    Frame,
};
use std::time::{SystemTime, UNIX_EPOCH};

use footer::render_footer;
use header::render_header;
use overlays::{render_cancel_confirm, render_confirm, render_contract_gate, render_privacy_notice};
use steps::render_step;
use toast::render_toast;

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Block::default().style(Style::default().bg(Theme::BG)), area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Branch + session status
            Constraint::Min(10),   // Current step
            Constraint::Length(2), // Key hints
        ])
        .split(area);

    render_header(frame, layout[0], app);
    render_step(frame, layout[1], app);
    render_footer(frame, layout[2], app);

    match app.session.active_modal() {
        Modal::Confirm => render_confirm(frame, app),
        Modal::CancelConfirm => render_cancel_confirm(frame, app),
        Modal::ContractValidation => render_contract_gate(frame, app),
        Modal::PrivacyNotice => render_privacy_notice(frame, &app.privacy_notice),
        Modal::None => {}
    }

    if let Some(toast) = &app.toast {
        render_toast(frame, toast);
    }
}

/// Current frame of the loading spinner, advanced by wall clock.
fn spinner() -> char {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let frames = Theme::SPINNER_BRAILLE;
    frames[(millis / 100) as usize % frames.len()]
}
