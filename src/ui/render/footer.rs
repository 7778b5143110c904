use crate::kiosk::{Modal, Step};
use crate::ui::theme::Theme;
use crate::ui::App;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Key hints for whatever the visitor can do right now
fn hints(app: &App) -> Vec<(&'static str, &'static str)> {
    let session = &app.session;
    match session.active_modal() {
        Modal::ContractValidation => {
            return vec![("↵", "validar"), ("⌫", "borrar"), ("Esc", "cancelar")];
        }
        Modal::Confirm if session.is_creating() => return Vec::new(),
        Modal::Confirm => return vec![("↵", "generar turno"), ("Esc", "volver")],
        Modal::CancelConfirm if session.is_cancelling() => return Vec::new(),
        Modal::CancelConfirm => return vec![("↵", "sí, cancelar"), ("Esc", "no")],
        Modal::PrivacyNotice => return vec![("↵", "cerrar")],
        Modal::None => {}
    }

    match session.step() {
        Step::ClientType => vec![
            ("1", "no soy cliente"),
            ("2", "soy cliente"),
            ("↑↓", "mover"),
            ("↵", "elegir"),
            ("p", "aviso de privacidad"),
        ],
        Step::ServiceSelection => vec![
            ("↑↓", "mover"),
            ("Tab", "cambiar lista"),
            ("↵", "elegir"),
            ("⌫", "inicio"),
            ("p", "aviso de privacidad"),
        ],
        Step::Ticket => {
            let downloadable = session
                .issued()
                .is_some_and(|issued| issued.pdf_url().is_some());
            let mut hints = Vec::new();
            if downloadable {
                hints.push(("d", "descargar"));
            }
            hints.push(("c", "cancelar turno"));
            hints.push(("r", "terminar"));
            hints
        }
    }
}

pub(super) fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled("  ", Style::default())];
    for (key, label) in hints(app) {
        spans.push(Span::styled(format!(" {} ", key), Theme::key()));
        spans.push(Span::styled(format!(" {}   ", label), Theme::text_muted()));
    }

    let footer = Paragraph::new(vec![Line::from(""), Line::from(spans)])
        .style(Style::default().bg(Theme::BG));
    frame.render_widget(footer, area);
}
