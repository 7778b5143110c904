//! Ticket artifacts: canonical PDF URL, QR rendering and manual download
//!
//! The QR payload and the download button share one URL, derived once when
//! the ticket is issued. QR rendering runs off the UI loop and its failure
//! only affects the QR panel, never the ticket summary.

use crate::api::{join_segments, ApiError};
use crate::kiosk::state::{InFlight, RequestTag};
use crate::models::Ticket;
use qrcode::render::unicode;
use qrcode::QrCode;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// `{base}/turnos/ticket/{id}/pdf`
pub fn ticket_pdf_url(base: &Url, ticket_id: &str) -> Result<Url, ApiError> {
    join_segments(base, &["turnos", "ticket", ticket_id, "pdf"])
}

/// A QR code rendered for a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub payload: String,
    /// Half-block rows, one string per terminal line
    pub rows: Vec<String>,
}

/// Encode `payload` as a dense unicode QR (two modules per character cell).
pub fn encode_qr(payload: &str) -> Result<QrImage, String> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| e.to_string())?;
    let rendered = code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build();
    Ok(QrImage {
        payload: payload.to_string(),
        rows: rendered.lines().map(str::to_string).collect(),
    })
}

pub fn pdf_file_name(ticket: &Ticket) -> String {
    let number: String = ticket
        .number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if number.is_empty() {
        format!("turno-{}.pdf", ticket.id)
    } else {
        format!("turno-{}.pdf", number)
    }
}

pub fn save_pdf(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, bytes)?;
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrState {
    Pending,
    Ready(QrImage),
    Failed(String),
}

/// A ticket on screen together with its derived artifacts.
#[derive(Debug, Clone)]
pub struct IssuedTicket {
    ticket: Ticket,
    /// `None` when no canonical URL could be derived; QR and download are off.
    pdf_url: Option<Url>,
    qr: QrState,
    qr_request: Option<RequestTag>,
    download: InFlight,
}

impl IssuedTicket {
    pub fn new(ticket: Ticket, pdf_url: Url, qr_tag: RequestTag) -> Self {
        Self {
            ticket,
            pdf_url: Some(pdf_url),
            qr: QrState::Pending,
            qr_request: Some(qr_tag),
            download: InFlight::default(),
        }
    }

    /// A ticket whose PDF URL could not be derived. It is still shown, but
    /// neither a QR nor a download may point anywhere else.
    pub fn without_artifacts(ticket: Ticket, reason: String) -> Self {
        Self {
            ticket,
            pdf_url: None,
            qr: QrState::Failed(reason),
            qr_request: None,
            download: InFlight::default(),
        }
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn pdf_url(&self) -> Option<&Url> {
        self.pdf_url.as_ref()
    }

    pub fn qr(&self) -> &QrState {
        &self.qr
    }

    pub fn is_downloading(&self) -> bool {
        self.download.is_pending()
    }

    /// Returns false when the result belongs to a request we no longer track.
    pub fn apply_qr(&mut self, tag: RequestTag, result: Result<QrImage, String>) -> bool {
        if self.qr_request != Some(tag) {
            return false;
        }
        self.qr_request = None;
        self.qr = match result {
            Ok(image) if Some(image.payload.as_str()) == self.pdf_url.as_ref().map(Url::as_str) => {
                QrState::Ready(image)
            }
            Ok(_) => QrState::Failed("QR payload does not match ticket URL".to_string()),
            Err(e) => QrState::Failed(e),
        };
        true
    }

    /// Stop waiting for any artifact work still running in the background.
    pub fn discard_pending(&mut self) {
        self.qr_request = None;
        self.download.clear();
    }

    /// Claim the download slot; yields the canonical URL and target file name.
    pub fn begin_download(&mut self, tag: RequestTag) -> Option<(Url, String)> {
        let url = self.pdf_url.clone()?;
        if !self.download.begin(tag) {
            return None;
        }
        Some((url, pdf_file_name(&self.ticket)))
    }

    pub fn settle_download(&mut self, tag: RequestTag) -> bool {
        self.download.settle(tag)
    }
}
