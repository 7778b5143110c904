//! Kiosk turn-issuance session controller
//!
//! The controller is a pure state machine (`machine`) composed from small
//! parts: the cascading selection engine, the contract gate, the modal
//! orchestrator, the turn adapter, the ticket artifacts and two countdowns.
//! All I/O is expressed as `Effect`s executed by the host.

pub mod artifact;
pub mod contract;
pub mod machine;
pub mod modal;
pub mod selection;
pub mod state;
pub mod timer;
pub mod turns;

pub use machine::{Effect, Event, KioskSession, KioskSettings};
pub use modal::Modal;
pub use state::{RequestTag, ResetReason, SessionId, Step};

#[cfg(test)]
mod tests;
