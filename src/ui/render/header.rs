use crate::kiosk::Step;
use crate::ui::theme::Theme;
use crate::ui::App;
use crate::util::format_seconds;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub(super) fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let step_label = match session.step() {
        Step::ClientType => "Bienvenido",
        Step::ServiceSelection => "Elige tu trámite",
        Step::Ticket => "Tu turno",
    };

    let mut spans = vec![
        Span::styled(
            format!("   {}", session.branch().name),
            Style::default()
                .fg(Theme::WHITE)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}  ", Theme::DOT_SEPARATOR),
            Style::default().fg(Theme::GREY_500),
        ),
        Span::styled(step_label, Theme::text_muted()),
    ];

    let timer = session
        .idle_remaining()
        .map(|secs| ("inactividad", secs))
        .or_else(|| session.return_remaining().map(|secs| ("regreso", secs)));
    if let Some((label, secs)) = timer {
        spans.push(Span::styled(
            format!("  {}  {} ", Theme::DOT_SEPARATOR, label),
            Style::default().fg(Theme::GREY_500),
        ));
        spans.push(Span::styled(
            format_seconds(secs),
            Style::default()
                .fg(Theme::countdown(secs))
                .add_modifier(Modifier::BOLD),
        ));
    }

    let lines = vec![Line::from(""), Line::from(spans)];
    let header = Paragraph::new(lines).style(Style::default().bg(Theme::BG));
    frame.render_widget(header, area);
}
