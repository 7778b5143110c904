use super::spinner;
use crate::kiosk::contract::MAX_CONTRACT_LEN;
use crate::ui::helpers::{centered_box, centered_rect, wrap_text};
use crate::ui::theme::Theme;
use crate::ui::App;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn modal_block(title: &str) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .title_style(Theme::title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Theme::GREY_300))
        .style(Style::default().bg(Theme::GREY_700))
}

fn draw_modal(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    frame.render_widget(Clear, area);
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(modal_block(title));
    frame.render_widget(body, area);
}

fn busy_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {} {}", spinner(), text),
        Theme::text_muted(),
    ))
}

pub(super) fn render_confirm(frame: &mut Frame, app: &App) {
    let area = centered_box(56, 10, frame.area());
    let selection = app.session.selection();
    let area_name = selection
        .selected_area()
        .map(|a| a.name.clone())
        .unwrap_or_default();
    let service_name = selection
        .selected_service()
        .map(|s| s.name.clone())
        .unwrap_or_default();

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Área      ", Theme::text_muted()),
            Span::styled(area_name, Theme::text()),
        ]),
        Line::from(vec![
            Span::styled("  Servicio  ", Theme::text_muted()),
            Span::styled(service_name, Theme::text()),
        ]),
        Line::from(""),
    ];
    if app.session.is_creating() {
        lines.push(busy_line("Generando turno..."));
    } else {
        lines.push(Line::from(Span::styled(
            "  ¿Generar un turno para este servicio?",
            Theme::text(),
        )));
    }
    draw_modal(frame, area, "Confirmar turno", lines);
}

pub(super) fn render_cancel_confirm(frame: &mut Frame, app: &App) {
    let area = centered_box(52, 8, frame.area());
    let number = app
        .session
        .ticket()
        .map(|t| t.number.clone())
        .unwrap_or_default();

    let mut lines = vec![Line::from("")];
    if app.session.is_cancelling() {
        lines.push(busy_line("Cancelando turno..."));
    } else {
        lines.push(Line::from(vec![
            Span::styled("  ¿Cancelar el turno ", Theme::text()),
            Span::styled(
                number,
                Style::default()
                    .fg(Theme::WHITE)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("?", Theme::text()),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Esta acción no se puede deshacer.",
            Theme::text_muted(),
        )));
    }
    draw_modal(frame, area, "Cancelar turno", lines);
}

pub(super) fn render_contract_gate(frame: &mut Frame, app: &App) {
    let area = centered_box(54, 11, frame.area());
    let gate = app.session.contract();

    let padding = MAX_CONTRACT_LEN.saturating_sub(gate.input().chars().count());
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Escribe tu número de contrato",
            Theme::text(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!(" {}{} ", gate.input(), "_".repeat(padding)),
                Style::default()
                    .fg(Theme::WHITE)
                    .bg(Theme::GREY_600)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
    ];
    if gate.is_validating() {
        lines.push(busy_line("Validando..."));
    } else if let Some(error) = gate.error() {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Theme::RED),
        )));
    }
    draw_modal(frame, area, "Soy cliente", lines);
}

pub(super) fn render_privacy_notice(frame: &mut Frame, notice: &str) {
    let area = centered_rect(60, 50, frame.area());
    let width = area.width.saturating_sub(6) as usize;

    let mut lines = vec![Line::from("")];
    for paragraph in notice.split("\n\n") {
        for row in wrap_text(paragraph, width) {
            lines.push(Line::from(Span::styled(format!("  {}", row), Theme::text())));
        }
        lines.push(Line::from(""));
    }
    draw_modal(frame, area, "Aviso de privacidad", lines);
}
