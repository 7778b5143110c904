//! Error taxonomy for the kiosk session
//!
//! Listing failures degrade silently, user-initiated actions surface their
//! failure at the point of action, and stale responses never leave the core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KioskError {
    /// Area/service listing failed; the list degrades to empty.
    #[error("could not load {what}: {detail}")]
    TransientLoad { what: &'static str, detail: String },

    /// Contract check failed; the gate stays open for another attempt.
    #[error("contract validation failed: {0}")]
    Validation(String),

    /// Turn creation failed; the selection is kept for retry.
    #[error("turn creation failed: {0}")]
    Creation(String),

    /// Turn cancellation failed; the ticket stays on screen.
    #[error("turn cancellation failed: {0}")]
    Cancellation(String),

    /// A response arrived for a request the session no longer tracks.
    #[error("stale {0} response discarded")]
    StaleResponse(&'static str),
}

impl KioskError {
    /// Text shown to the person at the kiosk.
    pub fn user_message(&self) -> String {
        match self {
            KioskError::TransientLoad { .. } => {
                "No hay opciones disponibles en este momento.".to_string()
            }
            KioskError::Validation(detail) => {
                format!("No pudimos validar el contrato: {}", detail)
            }
            KioskError::Creation(detail) => {
                format!("No se pudo generar el turno: {}", detail)
            }
            KioskError::Cancellation(detail) => {
                format!("No se pudo cancelar el turno: {}", detail)
            }
            KioskError::StaleResponse(_) => String::new(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, KioskError::StaleResponse(_))
    }
}
