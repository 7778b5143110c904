//! Contract validation gate for the client path

use crate::api::ApiError;
use crate::error::KioskError;
use crate::kiosk::state::{InFlight, RequestTag};
use crate::models::ValidatedClient;

pub const MAX_CONTRACT_LEN: usize = 20;

/// Why a submit did not produce a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRefusal {
    Empty,
    Busy,
}

#[derive(Debug, Clone, Default)]
pub struct ContractGate {
    input: String,
    error: Option<String>,
    request: InFlight,
}

impl ContractGate {
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Inline message from the last failed attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_validating(&self) -> bool {
        self.request.is_pending()
    }

    pub fn push(&mut self, c: char) {
        if self.is_validating() || !c.is_ascii_alphanumeric() {
            return;
        }
        if self.input.len() < MAX_CONTRACT_LEN {
            self.input.push(c.to_ascii_uppercase());
            self.error = None;
        }
    }

    pub fn pop(&mut self) {
        if !self.is_validating() {
            self.input.pop();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Claim the request slot and hand back the contract to validate.
    pub fn submit(&mut self, tag: RequestTag) -> Result<String, SubmitRefusal> {
        if self.is_validating() {
            return Err(SubmitRefusal::Busy);
        }
        let contract = self.input.trim().to_string();
        if contract.is_empty() {
            self.error = Some("Ingresa tu número de contrato.".to_string());
            return Err(SubmitRefusal::Empty);
        }
        self.request.begin(tag);
        self.error = None;
        Ok(contract)
    }

    /// Settle the outstanding validation. On failure the typed input is kept
    /// so the visitor can correct it.
    pub fn apply(
        &mut self,
        tag: RequestTag,
        result: Result<ValidatedClient, ApiError>,
    ) -> Result<ValidatedClient, KioskError> {
        if !self.request.settle(tag) {
            return Err(KioskError::StaleResponse("contract validation"));
        }
        match result {
            Ok(client) => {
                self.reset();
                Ok(client)
            }
            Err(err) => {
                let err = KioskError::Validation(err.to_string());
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }
}
