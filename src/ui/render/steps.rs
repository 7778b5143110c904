use super::spinner;
use crate::kiosk::artifact::QrState;
use crate::kiosk::Step;
use crate::ui::helpers::centered_box;
use crate::ui::theme::Theme;
use crate::ui::{App, Focus, CLIENT_OPTIONS};
use crate::util::{format_seconds, truncate_to_width};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub(super) fn render_step(frame: &mut Frame, area: Rect, app: &App) {
    match app.session.step() {
        Step::ClientType => render_client_type(frame, area, app),
        Step::ServiceSelection => render_selection(frame, area, app),
        Step::Ticket => render_ticket(frame, area, app),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLIENT TYPE
// ═══════════════════════════════════════════════════════════════════════════

fn render_client_type(frame: &mut Frame, area: Rect, app: &App) {
    let boxed = centered_box(48, 11, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("  ¿Eres cliente?", Theme::title())),
        Line::from(""),
    ];
    for (i, label) in CLIENT_OPTIONS.iter().enumerate() {
        let selected = i == app.client_cursor;
        let marker = if selected {
            Theme::BULLET_FILLED
        } else {
            Theme::BULLET_EMPTY
        };
        let style = if selected {
            Theme::selected()
        } else {
            Theme::text()
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!(" {} {}. {} ", marker, i + 1, label), style),
        ]));
        lines.push(Line::from(""));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_active())
            .style(Style::default().bg(Theme::BG)),
    );
    frame.render_widget(panel, boxed);
}

// ═══════════════════════════════════════════════════════════════════════════
//  SERVICE SELECTION
// ═══════════════════════════════════════════════════════════════════════════

struct ListRow<'a> {
    label: &'a str,
    detail: &'a str,
    under_cursor: bool,
    chosen: bool,
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: Vec<ListRow<'_>>,
    focused: bool,
    placeholder: Line<'static>,
) {
    let width = area.width.saturating_sub(6) as usize;
    let mut lines = vec![Line::from("")];
    if rows.is_empty() {
        lines.push(placeholder);
    }
    for row in rows {
        let style = if row.under_cursor && focused {
            Theme::selected()
        } else if row.chosen {
            Theme::chosen()
        } else {
            Theme::text()
        };
        let prefix = if row.under_cursor {
            Theme::ARROW_RIGHT
        } else {
            ' '
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", prefix), Theme::text_muted()),
            Span::styled(truncate_to_width(row.label, width), style),
        ]));
        if !row.detail.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("   {}", truncate_to_width(row.detail, width)),
                Style::default().fg(Theme::GREY_400),
            )));
        }
    }

    let border = if focused {
        Theme::border_active()
    } else {
        Theme::border()
    };
    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" {} ", title))
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(border)
            .style(Style::default().bg(Theme::BG)),
    );
    frame.render_widget(panel, area);
}

fn loading_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {} {}", spinner(), text),
        Theme::text_muted(),
    ))
}

fn empty_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}", text),
        Style::default()
            .fg(Theme::GREY_400)
            .add_modifier(Modifier::ITALIC),
    ))
}

fn render_selection(frame: &mut Frame, area: Rect, app: &App) {
    let selection = app.session.selection();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let chosen_area = selection.selected_area().map(|a| a.id.as_str());
    let area_rows = selection
        .areas()
        .iter()
        .enumerate()
        .map(|(i, a)| ListRow {
            label: &a.name,
            detail: &a.description,
            under_cursor: i == app.area_cursor,
            chosen: Some(a.id.as_str()) == chosen_area,
        })
        .collect();
    let area_placeholder = if selection.is_loading_areas() {
        loading_line("Cargando áreas...")
    } else {
        empty_line("No hay áreas disponibles")
    };
    render_list(
        frame,
        columns[0],
        "Áreas",
        area_rows,
        app.focus == Focus::Areas,
        area_placeholder,
    );

    let chosen_service = selection.selected_service().map(|s| s.id.as_str());
    let service_rows = selection
        .services()
        .iter()
        .enumerate()
        .map(|(i, s)| ListRow {
            label: &s.name,
            detail: &s.description,
            under_cursor: i == app.service_cursor,
            chosen: Some(s.id.as_str()) == chosen_service,
        })
        .collect();
    let service_placeholder = if selection.is_loading_services() {
        loading_line("Cargando servicios...")
    } else if selection.selected_area().is_none() {
        empty_line("Elige un área")
    } else {
        empty_line("No hay servicios disponibles")
    };
    render_list(
        frame,
        columns[1],
        "Servicios",
        service_rows,
        app.focus == Focus::Services,
        service_placeholder,
    );
}

// ═══════════════════════════════════════════════════════════════════════════
//  TICKET
// ═══════════════════════════════════════════════════════════════════════════

fn render_ticket(frame: &mut Frame, area: Rect, app: &App) {
    let Some(issued) = app.session.issued() else {
        return;
    };
    let ticket = issued.ticket();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let field = |label: &str, value: &str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", label), Theme::text_muted()),
            Span::styled(value.to_string(), Theme::text()),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Turno", Theme::text_muted())),
        Line::from(Span::styled(
            format!("  {}", ticket.number),
            Style::default()
                .fg(Theme::WHITE)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("Área", &ticket.area_name),
        field("Servicio", &ticket.service_name),
        field("Sucursal", &ticket.branch_name),
    ];
    if let Some(minutes) = ticket.wait_time {
        lines.push(field("Espera", &format!("{} min aprox.", minutes)));
    }
    if let Some(created) = ticket.created_at {
        lines.push(field(
            "Emitido",
            &created.with_timezone(&chrono::Local).format("%H:%M").to_string(),
        ));
    }
    lines.push(Line::from(""));

    if app.session.is_cancelling() {
        lines.push(loading_line("Cancelando turno..."));
    } else if issued.is_downloading() {
        lines.push(loading_line("Descargando ticket..."));
    } else if let Some(secs) = app.session.return_remaining() {
        lines.push(Line::from(vec![
            Span::styled("  Regresando al inicio en ", Theme::text_muted()),
            Span::styled(
                format_seconds(secs),
                Style::default()
                    .fg(Theme::countdown(secs))
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    let summary = Paragraph::new(lines).block(
        Block::default()
            .title(" Tu turno ")
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(Theme::border_active())
            .style(Style::default().bg(Theme::BG)),
    );
    frame.render_widget(summary, columns[0]);

    let qr_lines: Vec<Line> = match issued.qr() {
        QrState::Ready(image) => image
            .rows
            .iter()
            .map(|row| Line::from(Span::styled(row.clone(), Theme::text())))
            .collect(),
        QrState::Pending => vec![Line::from(""), loading_line("Generando código QR...")],
        QrState::Failed(_) => match issued.pdf_url() {
            Some(url) => vec![
                Line::from(""),
                empty_line("No se pudo generar el código QR."),
                empty_line("Usa la descarga o la dirección:"),
                Line::from(Span::styled(format!("  {}", url), Theme::text_muted())),
            ],
            None => vec![
                Line::from(""),
                empty_line("Ticket no disponible para descarga."),
                empty_line("Conserva el número de tu turno."),
            ],
        },
    };
    let qr = Paragraph::new(qr_lines).block(
        Block::default()
            .title(" Escanea para descargar ")
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .style(Style::default().bg(Theme::BG)),
    );
    frame.render_widget(qr, columns[1]);
}
