//! Session identity, request tags and the observable step

use crate::models::ValidatedClient;
use std::fmt;
use uuid::Uuid;

/// Identity of one kiosk occupancy, minted fresh on every hard reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to correlate log lines
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// Stamped on every outgoing request and echoed back with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag {
    pub session: SessionId,
    pub seq: u64,
}

/// Single-outstanding-request slot for one kind of side effect.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InFlight {
    pending: Option<RequestTag>,
}

impl InFlight {
    /// Claim the slot. Fails while another request is outstanding.
    pub fn begin(&mut self, tag: RequestTag) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(tag);
        true
    }

    /// Release the slot if `tag` is the request it is waiting on.
    pub fn settle(&mut self, tag: RequestTag) -> bool {
        if self.pending == Some(tag) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// Externally observable step of the kiosk flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    ClientType,
    ServiceSelection,
    Ticket,
}

/// Resolved client type. Being a client always carries the validated record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClientKind {
    #[default]
    Unresolved,
    NonClient,
    Client(ValidatedClient),
}

impl ClientKind {
    /// `None` while unresolved, otherwise whether the visitor is a client.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ClientKind::Unresolved => None,
            ClientKind::NonClient => Some(false),
            ClientKind::Client(_) => Some(true),
        }
    }

    pub fn validated_client(&self) -> Option<&ValidatedClient> {
        match self {
            ClientKind::Client(client) => Some(client),
            _ => None,
        }
    }
}

/// Why the session collapsed back to its initial step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    IdleTimeout,
    ReturnTimeout,
    BranchChanged,
    ManualReturn,
    TurnCancelled,
    BackNavigation,
}

impl ResetReason {
    pub fn label(&self) -> &'static str {
        match self {
            ResetReason::IdleTimeout => "idle timeout",
            ResetReason::ReturnTimeout => "return countdown",
            ResetReason::BranchChanged => "branch changed",
            ResetReason::ManualReturn => "manual return",
            ResetReason::TurnCancelled => "turn cancelled",
            ResetReason::BackNavigation => "back navigation",
        }
    }
}
