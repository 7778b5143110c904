//! Kiosk session state machine
//!
//! `KioskSession::handle` consumes one event and returns the side effects the
//! host must perform. It never does I/O itself. Requests leave with a
//! `RequestTag`; their responses come back as events carrying the same tag
//! and are applied only if the session still waits for exactly that request.
//!
//! ```text
//!   ClientType ──non-client──────────────▶ ServiceSelection ──confirm ok──▶ Ticket
//!       │  ▲                                  ▲    │ idle = 0                │
//!       │  └── contract failed / dismissed    │    ▼                         │
//!       └──client──▶ [contract gate] ──ok─────┘  hard reset ◀── return = 0 ──┘
//!                                                      ◀── manual return / cancelled
//! ```

use crate::api::ApiError;
use crate::error::KioskError;
use crate::kiosk::artifact::{ticket_pdf_url, IssuedTicket, QrImage};
use crate::kiosk::contract::{ContractGate, SubmitRefusal};
use crate::kiosk::modal::{Modal, ModalOrchestrator};
use crate::kiosk::selection::{AreaPick, SelectionEngine};
use crate::kiosk::state::{ClientKind, RequestTag, ResetReason, SessionId, Step};
use crate::kiosk::timer::{Countdown, TickOutcome};
use crate::kiosk::turns::TurnAdapter;
use crate::models::{Area, Branch, CreateTurnRequest, Service, Ticket, ValidatedClient};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_IDLE_SECS: u32 = 60;
pub const DEFAULT_RETURN_SECS: u32 = 20;

#[derive(Debug, Clone)]
pub struct KioskSettings {
    pub api_base: Url,
    pub idle_secs: u32,
    pub return_secs: u32,
}

/// Everything that can happen to a session.
#[derive(Debug)]
pub enum Event {
    // Visitor actions
    ChooseNonClient,
    ChooseClient,
    ContractInput(char),
    ContractBackspace,
    SubmitContract,
    DismissContract,
    SelectArea(String),
    SelectService(String),
    ConfirmTurn,
    DismissConfirm,
    RequestCancel,
    ConfirmCancel,
    DismissCancel,
    ManualReturn,
    DownloadTicket,
    ShowPrivacyNotice,
    DismissPrivacyNotice,
    /// Any other interaction (cursor movement) that proves someone is there
    Activity,

    // Host signals
    Tick,
    BranchChanged(Branch),
    BackNavigation,

    // Responses
    AreasLoaded {
        tag: RequestTag,
        result: Result<Vec<Area>, ApiError>,
    },
    ServicesLoaded {
        tag: RequestTag,
        result: Result<Vec<Service>, ApiError>,
    },
    ContractValidated {
        tag: RequestTag,
        result: Result<ValidatedClient, ApiError>,
    },
    TurnCreated {
        tag: RequestTag,
        result: Result<Ticket, ApiError>,
    },
    TurnCancelled {
        tag: RequestTag,
        result: Result<String, ApiError>,
    },
    QrRendered {
        tag: RequestTag,
        result: Result<QrImage, String>,
    },
    TicketDownloaded {
        tag: RequestTag,
        result: Result<PathBuf, String>,
    },
}

/// Work the host performs on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadAreas {
        tag: RequestTag,
        branch_id: String,
        is_client: bool,
    },
    LoadServices {
        tag: RequestTag,
        area_id: String,
        is_client: bool,
    },
    ValidateContract {
        tag: RequestTag,
        contract: String,
    },
    CreateTurn {
        tag: RequestTag,
        request: CreateTurnRequest,
    },
    CancelTurn {
        tag: RequestTag,
        ticket_id: String,
    },
    RenderQr {
        tag: RequestTag,
        payload: String,
    },
    DownloadTicket {
        tag: RequestTag,
        url: Url,
        file_name: String,
    },
    /// Blocking user-facing failure
    Alert(String),
    /// Short confirmation that outlives a reset
    Notify(String),
    /// The session collapsed to its initial step
    SessionReset(ResetReason),
}

enum Stage {
    ClientType,
    ServiceSelection,
    Ticket(Box<IssuedTicket>),
}

pub struct KioskSession {
    settings: KioskSettings,
    branch: Branch,
    id: SessionId,
    seq: u64,
    stage: Stage,
    client: ClientKind,
    selection: SelectionEngine,
    contract: ContractGate,
    modals: ModalOrchestrator,
    turns: TurnAdapter,
    idle: Countdown,
    return_countdown: Countdown,
}

impl KioskSession {
    pub fn new(branch: Branch, settings: KioskSettings) -> Self {
        let idle = Countdown::new(settings.idle_secs);
        let return_countdown = Countdown::new(settings.return_secs);
        let session = Self {
            settings,
            branch,
            id: SessionId::new(),
            seq: 0,
            stage: Stage::ClientType,
            client: ClientKind::Unresolved,
            selection: SelectionEngine::default(),
            contract: ContractGate::default(),
            modals: ModalOrchestrator::default(),
            turns: TurnAdapter::default(),
            idle,
            return_countdown,
        };
        info!(session = %session.id, branch = %session.branch.id, "kiosk session started");
        session
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn step(&self) -> Step {
        match self.stage {
            Stage::ClientType => Step::ClientType,
            Stage::ServiceSelection => Step::ServiceSelection,
            Stage::Ticket(_) => Step::Ticket,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    pub fn branch(&self) -> &Branch {
        &self.branch
    }

    /// `None` while unresolved.
    pub fn client_type(&self) -> Option<bool> {
        self.client.as_flag()
    }

    pub fn validated_client(&self) -> Option<&ValidatedClient> {
        self.client.validated_client()
    }

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    pub fn contract(&self) -> &ContractGate {
        &self.contract
    }

    pub fn active_modal(&self) -> Modal {
        self.modals.active()
    }

    pub fn issued(&self) -> Option<&IssuedTicket> {
        match &self.stage {
            Stage::Ticket(issued) => Some(&**issued),
            _ => None,
        }
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.issued().map(|i| i.ticket())
    }

    pub fn idle_remaining(&self) -> Option<u32> {
        self.idle.remaining()
    }

    pub fn return_remaining(&self) -> Option<u32> {
        self.return_countdown.remaining()
    }

    pub fn is_creating(&self) -> bool {
        self.turns.is_creating()
    }

    pub fn is_cancelling(&self) -> bool {
        self.turns.is_cancelling()
    }

    /// Structural invariants that must hold between events.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.selection.selected_service().is_some() && self.selection.selected_area().is_none()
        {
            return Err("service selected without area".into());
        }
        if self.selection.selected_area().is_some() && self.client.as_flag().is_none() {
            return Err("area selected with unresolved client type".into());
        }
        let step = self.step();
        if self.idle.is_running() != (step == Step::ServiceSelection) {
            return Err(format!("idle timer running={} in {:?}", self.idle.is_running(), step));
        }
        if self.return_countdown.is_running() && step != Step::Ticket {
            return Err(format!("return countdown running in {:?}", step));
        }
        if step == Step::ClientType && self.client.as_flag().is_some() {
            return Err("client type resolved on the initial step".into());
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  EVENT HANDLING
    // ═══════════════════════════════════════════════════════════════════════

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let effects = match event {
            Event::ChooseNonClient => self.choose_non_client(),
            Event::ChooseClient => self.choose_client(),
            Event::ContractInput(c) => {
                if self.modals.is(Modal::ContractValidation) {
                    self.contract.push(c);
                }
                Vec::new()
            }
            Event::ContractBackspace => {
                if self.modals.is(Modal::ContractValidation) {
                    self.contract.pop();
                }
                Vec::new()
            }
            Event::SubmitContract => self.submit_contract(),
            Event::DismissContract => {
                if self.modals.close(Modal::ContractValidation) {
                    // An answer still in flight will no longer match
                    self.contract.reset();
                }
                Vec::new()
            }
            Event::SelectArea(area_id) => self.select_area(&area_id),
            Event::SelectService(service_id) => self.select_service(&service_id),
            Event::ConfirmTurn => self.confirm_turn(),
            Event::DismissConfirm => {
                if !self.turns.is_creating() && self.modals.close(Modal::Confirm) {
                    self.selection.clear_service_selection();
                    self.touch_idle();
                }
                Vec::new()
            }
            Event::RequestCancel => self.request_cancel(),
            Event::ConfirmCancel => self.confirm_cancel(),
            Event::DismissCancel => {
                if !self.turns.is_cancelling() && self.modals.close(Modal::CancelConfirm) {
                    self.return_countdown.start();
                }
                Vec::new()
            }
            Event::ManualReturn => self.manual_return(),
            Event::DownloadTicket => self.download_ticket(),
            Event::ShowPrivacyNotice => {
                if self.modals.open(Modal::PrivacyNotice) {
                    self.touch_idle();
                }
                Vec::new()
            }
            Event::DismissPrivacyNotice => {
                if self.modals.close(Modal::PrivacyNotice) {
                    self.touch_idle();
                }
                Vec::new()
            }
            Event::Activity => {
                self.touch_idle();
                Vec::new()
            }
            Event::Tick => self.tick(),
            Event::BranchChanged(branch) => {
                self.branch = branch;
                self.hard_reset(ResetReason::BranchChanged)
            }
            Event::BackNavigation => self.hard_reset(ResetReason::BackNavigation),
            Event::AreasLoaded { tag, result } => self.areas_loaded(tag, result),
            Event::ServicesLoaded { tag, result } => self.services_loaded(tag, result),
            Event::ContractValidated { tag, result } => self.contract_validated(tag, result),
            Event::TurnCreated { tag, result } => self.turn_created(tag, result),
            Event::TurnCancelled { tag, result } => self.turn_cancelled(tag, result),
            Event::QrRendered { tag, result } => self.qr_rendered(tag, result),
            Event::TicketDownloaded { tag, result } => self.ticket_downloaded(tag, result),
        };
        debug_assert!(
            self.check_invariants().is_ok(),
            "{:?}",
            self.check_invariants()
        );
        effects
    }

    fn next_tag(&mut self) -> RequestTag {
        self.seq += 1;
        RequestTag {
            session: self.id,
            seq: self.seq,
        }
    }

    fn is_current(&self, tag: RequestTag) -> bool {
        tag.session == self.id
    }

    fn touch_idle(&mut self) {
        if matches!(self.stage, Stage::ServiceSelection) {
            self.idle.start();
        }
    }

    fn discard(&self, err: KioskError) -> Vec<Effect> {
        debug!(session = %self.id, "{}", err);
        Vec::new()
    }

    // ─────────────────────────────────────────────────────────────────────
    //  Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Collapse to the initial step under a fresh identity. Timers are
    /// stopped explicitly and every outstanding request is forgotten.
    fn hard_reset(&mut self, reason: ResetReason) -> Vec<Effect> {
        self.idle.stop();
        self.return_countdown.stop();
        if let Stage::Ticket(issued) = &mut self.stage {
            issued.discard_pending();
        }
        self.modals.close_all();
        self.turns.reset();
        self.contract.reset();
        self.selection.reset();
        self.client = ClientKind::Unresolved;
        self.stage = Stage::ClientType;

        let previous = self.id;
        self.id = SessionId::new();
        self.seq = 0;
        info!(
            previous = %previous,
            session = %self.id,
            reason = reason.label(),
            "session reset"
        );
        vec![Effect::SessionReset(reason)]
    }

    fn enter_service_selection(&mut self, client: ClientKind) -> Vec<Effect> {
        let Some(is_client) = client.as_flag() else {
            return Vec::new();
        };
        self.client = client;
        self.stage = Stage::ServiceSelection;
        self.return_countdown.stop();
        self.idle.start();

        let tag = self.next_tag();
        self.selection.request_areas(tag);
        info!(session = %self.id, is_client, "service selection entered");
        vec![Effect::LoadAreas {
            tag,
            branch_id: self.branch.id.clone(),
            is_client,
        }]
    }

    fn enter_ticket(&mut self, ticket: Ticket) -> Vec<Effect> {
        self.idle.stop();
        self.modals.close_all();

        info!(session = %self.id, ticket = %ticket.number, "ticket issued");
        self.return_countdown.start();

        let pdf_url = match ticket_pdf_url(&self.settings.api_base, &ticket.id) {
            Ok(url) => url,
            Err(e) => {
                // The ticket exists server-side; show it even without artifacts
                warn!(session = %self.id, "could not derive ticket url: {}", e);
                self.stage = Stage::Ticket(Box::new(IssuedTicket::without_artifacts(
                    ticket,
                    e.to_string(),
                )));
                return Vec::new();
            }
        };
        let tag = self.next_tag();
        self.stage = Stage::Ticket(Box::new(IssuedTicket::new(ticket, pdf_url.clone(), tag)));

        vec![Effect::RenderQr {
            tag,
            payload: pdf_url.to_string(),
        }]
    }

    // ─────────────────────────────────────────────────────────────────────
    //  Client type
    // ─────────────────────────────────────────────────────────────────────

    fn choose_non_client(&mut self) -> Vec<Effect> {
        if !matches!(self.stage, Stage::ClientType) || self.modals.is_open() {
            return Vec::new();
        }
        self.enter_service_selection(ClientKind::NonClient)
    }

    fn choose_client(&mut self) -> Vec<Effect> {
        if !matches!(self.stage, Stage::ClientType) {
            return Vec::new();
        }
        if self.modals.open(Modal::ContractValidation) {
            self.contract.reset();
        }
        Vec::new()
    }

    fn submit_contract(&mut self) -> Vec<Effect> {
        if !self.modals.is(Modal::ContractValidation) {
            return Vec::new();
        }
        let tag = self.next_tag();
        match self.contract.submit(tag) {
            Ok(contract) => {
                info!(session = %self.id, "validating contract");
                vec![Effect::ValidateContract { tag, contract }]
            }
            Err(SubmitRefusal::Empty) | Err(SubmitRefusal::Busy) => Vec::new(),
        }
    }

    fn contract_validated(
        &mut self,
        tag: RequestTag,
        result: Result<ValidatedClient, ApiError>,
    ) -> Vec<Effect> {
        if !self.is_current(tag) || !matches!(self.stage, Stage::ClientType) {
            return self.discard(KioskError::StaleResponse("contract validation"));
        }
        match self.contract.apply(tag, result) {
            Ok(client) => {
                self.modals.close(Modal::ContractValidation);
                self.enter_service_selection(ClientKind::Client(client))
            }
            Err(err) if err.is_stale() => self.discard(err),
            Err(err) => {
                info!(session = %self.id, "{}", err);
                Vec::new()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    //  Area / service selection
    // ─────────────────────────────────────────────────────────────────────

    fn select_area(&mut self, area_id: &str) -> Vec<Effect> {
        if !matches!(self.stage, Stage::ServiceSelection) || self.modals.is_open() {
            return Vec::new();
        }
        self.idle.start();
        let Some(is_client) = self.client.as_flag() else {
            return Vec::new();
        };
        let tag = self.next_tag();
        match self.selection.select_area(area_id, tag) {
            AreaPick::Fetch(area) => vec![Effect::LoadServices {
                tag,
                area_id: area.id,
                is_client,
            }],
            AreaPick::Unchanged | AreaPick::Unknown => Vec::new(),
        }
    }

    fn areas_loaded(&mut self, tag: RequestTag, result: Result<Vec<Area>, ApiError>) -> Vec<Effect> {
        if !self.is_current(tag) || !matches!(self.stage, Stage::ServiceSelection) {
            return self.discard(KioskError::StaleResponse("areas"));
        }
        match self.selection.apply_areas(tag, result) {
            Ok(count) => {
                debug!(session = %self.id, count, "areas loaded");
                Vec::new()
            }
            Err(err) if err.is_stale() => self.discard(err),
            Err(err) => {
                warn!(session = %self.id, "{}", err);
                Vec::new()
            }
        }
    }

    fn services_loaded(
        &mut self,
        tag: RequestTag,
        result: Result<Vec<Service>, ApiError>,
    ) -> Vec<Effect> {
        if !self.is_current(tag) || !matches!(self.stage, Stage::ServiceSelection) {
            return self.discard(KioskError::StaleResponse("services"));
        }
        match self.selection.apply_services(tag, result) {
            Ok(count) => {
                debug!(session = %self.id, count, "services loaded");
                Vec::new()
            }
            Err(err) if err.is_stale() => self.discard(err),
            Err(err) => {
                warn!(session = %self.id, "{}", err);
                Vec::new()
            }
        }
    }

    fn select_service(&mut self, service_id: &str) -> Vec<Effect> {
        if !matches!(self.stage, Stage::ServiceSelection) || self.modals.is_open() {
            return Vec::new();
        }
        if self.selection.select_service(service_id).is_some() {
            self.modals.open(Modal::Confirm);
            self.idle.start();
        }
        Vec::new()
    }

    // ─────────────────────────────────────────────────────────────────────
    //  Turn creation
    // ─────────────────────────────────────────────────────────────────────

    fn confirm_turn(&mut self) -> Vec<Effect> {
        if !self.modals.is(Modal::Confirm) || !matches!(self.stage, Stage::ServiceSelection) {
            return Vec::new();
        }
        let (Some(area), Some(service)) = (
            self.selection.selected_area().cloned(),
            self.selection.selected_service().cloned(),
        ) else {
            return Vec::new();
        };
        let tag = self.next_tag();
        match self
            .turns
            .begin_create(tag, &self.branch, &area, &service, &self.client)
        {
            Some(request) => {
                info!(session = %self.id, area = %area.id, service = %service.id, "creating turn");
                vec![Effect::CreateTurn { tag, request }]
            }
            None => Vec::new(),
        }
    }

    fn turn_created(&mut self, tag: RequestTag, result: Result<Ticket, ApiError>) -> Vec<Effect> {
        if !self.is_current(tag) || !matches!(self.stage, Stage::ServiceSelection) {
            return self.discard(KioskError::StaleResponse("turn creation"));
        }
        match self.turns.settle_create(tag, result) {
            Ok(ticket) => self.enter_ticket(ticket),
            Err(err) if err.is_stale() => self.discard(err),
            Err(err) => {
                // Confirmation stays open so the visitor can retry
                warn!(session = %self.id, "{}", err);
                self.idle.start();
                vec![Effect::Alert(err.user_message())]
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    //  Ticket step
    // ─────────────────────────────────────────────────────────────────────

    fn request_cancel(&mut self) -> Vec<Effect> {
        if !matches!(self.stage, Stage::Ticket(_)) {
            return Vec::new();
        }
        if self.modals.open(Modal::CancelConfirm) {
            self.return_countdown.stop();
        }
        Vec::new()
    }

    fn confirm_cancel(&mut self) -> Vec<Effect> {
        if !self.modals.is(Modal::CancelConfirm) {
            return Vec::new();
        }
        let Some(ticket_id) = self.ticket().map(|t| t.id.clone()) else {
            return Vec::new();
        };
        let tag = self.next_tag();
        if !self.turns.begin_cancel(tag) {
            return Vec::new();
        }
        info!(session = %self.id, ticket = %ticket_id, "cancelling turn");
        vec![Effect::CancelTurn { tag, ticket_id }]
    }

    fn turn_cancelled(&mut self, tag: RequestTag, result: Result<String, ApiError>) -> Vec<Effect> {
        if !self.is_current(tag) || !matches!(self.stage, Stage::Ticket(_)) {
            return self.discard(KioskError::StaleResponse("turn cancellation"));
        }
        match self.turns.settle_cancel(tag, result) {
            Ok(message) => {
                self.return_countdown.stop();
                if let Stage::Ticket(issued) = &mut self.stage {
                    issued.discard_pending();
                }
                let mut effects = vec![Effect::Notify(message)];
                effects.extend(self.hard_reset(ResetReason::TurnCancelled));
                effects
            }
            Err(err) if err.is_stale() => self.discard(err),
            Err(err) => {
                warn!(session = %self.id, "{}", err);
                self.modals.close(Modal::CancelConfirm);
                self.return_countdown.start();
                vec![Effect::Alert(err.user_message())]
            }
        }
    }

    fn manual_return(&mut self) -> Vec<Effect> {
        if !matches!(self.stage, Stage::Ticket(_)) || self.turns.is_cancelling() {
            return Vec::new();
        }
        self.hard_reset(ResetReason::ManualReturn)
    }

    fn qr_rendered(&mut self, tag: RequestTag, result: Result<QrImage, String>) -> Vec<Effect> {
        if !self.is_current(tag) {
            return self.discard(KioskError::StaleResponse("qr"));
        }
        if let Stage::Ticket(issued) = &mut self.stage {
            if let Err(e) = &result {
                warn!(session = %self.id, "qr rendering failed: {}", e);
            }
            issued.apply_qr(tag, result);
        }
        Vec::new()
    }

    fn download_ticket(&mut self) -> Vec<Effect> {
        let tag = self.next_tag();
        let Stage::Ticket(issued) = &mut self.stage else {
            return Vec::new();
        };
        match issued.begin_download(tag) {
            Some((url, file_name)) => vec![Effect::DownloadTicket {
                tag,
                url,
                file_name,
            }],
            None => Vec::new(),
        }
    }

    fn ticket_downloaded(
        &mut self,
        tag: RequestTag,
        result: Result<PathBuf, String>,
    ) -> Vec<Effect> {
        if !self.is_current(tag) {
            return self.discard(KioskError::StaleResponse("ticket download"));
        }
        let Stage::Ticket(issued) = &mut self.stage else {
            return Vec::new();
        };
        if !issued.settle_download(tag) {
            return self.discard(KioskError::StaleResponse("ticket download"));
        }
        match result {
            Ok(path) => vec![Effect::Notify(format!(
                "Ticket guardado en {}",
                path.display()
            ))],
            Err(e) => {
                warn!(session = %self.id, "ticket download failed: {}", e);
                vec![Effect::Alert("No se pudo descargar el ticket.".to_string())]
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    //  Heartbeat
    // ─────────────────────────────────────────────────────────────────────

    fn tick(&mut self) -> Vec<Effect> {
        if self.idle.tick() == TickOutcome::Expired {
            return self.hard_reset(ResetReason::IdleTimeout);
        }
        if self.return_countdown.tick() == TickOutcome::Expired {
            return self.hard_reset(ResetReason::ReturnTimeout);
        }
        Vec::new()
    }
}
