//! Mutually exclusive modal overlays

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    None,
    /// Confirm the selected service before creating the turn
    Confirm,
    /// Confirm cancellation of the issued ticket
    CancelConfirm,
    /// Contract entry for the client path
    ContractValidation,
    PrivacyNotice,
}

/// At most one modal is open at a time; opening another one while a modal
/// is showing is refused rather than stacked.
#[derive(Debug, Clone, Default)]
pub struct ModalOrchestrator {
    active: Modal,
}

impl ModalOrchestrator {
    pub fn active(&self) -> Modal {
        self.active
    }

    pub fn is_open(&self) -> bool {
        self.active != Modal::None
    }

    pub fn is(&self, modal: Modal) -> bool {
        self.active == modal
    }

    pub fn open(&mut self, modal: Modal) -> bool {
        if modal == Modal::None || (self.is_open() && self.active != modal) {
            return false;
        }
        self.active = modal;
        true
    }

    /// Close `modal` if it is the one showing.
    pub fn close(&mut self, modal: Modal) -> bool {
        if self.active == modal && modal != Modal::None {
            self.active = Modal::None;
            true
        } else {
            false
        }
    }

    pub fn close_all(&mut self) {
        self.active = Modal::None;
    }
}
