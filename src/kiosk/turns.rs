//! Turn creation and cancellation with single-in-flight discipline
//!
//! The slot is claimed before the request effect is emitted and released only
//! by the response carrying the same tag, so repeated confirm presses while a
//! request is outstanding never produce a second ticket.

use crate::api::ApiError;
use crate::error::KioskError;
use crate::kiosk::state::{ClientKind, InFlight, RequestTag};
use crate::models::{Area, Branch, CreateTurnRequest, Service, Ticket};

#[derive(Debug, Clone, Default)]
pub struct TurnAdapter {
    create: InFlight,
    cancel: InFlight,
}

impl TurnAdapter {
    pub fn is_creating(&self) -> bool {
        self.create.is_pending()
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancel.is_pending()
    }

    /// Drop both slots; late responses will no longer match.
    pub fn reset(&mut self) {
        self.create.clear();
        self.cancel.clear();
    }

    pub fn begin_create(
        &mut self,
        tag: RequestTag,
        branch: &Branch,
        area: &Area,
        service: &Service,
        client: &ClientKind,
    ) -> Option<CreateTurnRequest> {
        let es_cliente = client.as_flag()?;
        if !self.create.begin(tag) {
            return None;
        }
        Some(CreateTurnRequest {
            ck_area: area.id.clone(),
            ck_sucursal: branch.id.clone(),
            ck_servicio: service.id.clone(),
            es_cliente,
            ck_cliente: client.validated_client().map(|c| c.id.clone()),
        })
    }

    pub fn settle_create(
        &mut self,
        tag: RequestTag,
        result: Result<Ticket, ApiError>,
    ) -> Result<Ticket, KioskError> {
        if !self.create.settle(tag) {
            return Err(KioskError::StaleResponse("turn creation"));
        }
        result.map_err(|e| KioskError::Creation(e.to_string()))
    }

    pub fn begin_cancel(&mut self, tag: RequestTag) -> bool {
        self.cancel.begin(tag)
    }

    pub fn settle_cancel(
        &mut self,
        tag: RequestTag,
        result: Result<String, ApiError>,
    ) -> Result<String, KioskError> {
        if !self.cancel.settle(tag) {
            return Err(KioskError::StaleResponse("turn cancellation"));
        }
        result.map_err(|e| KioskError::Cancellation(e.to_string()))
    }
}
