//! Branch context holder
//!
//! Holds the branch the kiosk is serving and notifies subscribers when an
//! operator switches it. Subscribers get a receiver they can poll from the
//! UI loop or await from a task; the kiosk core never reaches into it.

use crate::models::Branch;
use tokio::sync::watch;

#[derive(Clone)]
pub struct BranchContext {
    tx: watch::Sender<Branch>,
}

impl BranchContext {
    pub fn new(initial: Branch) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Branch {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> BranchSubscription {
        BranchSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Replace the active branch. Subscribers are only notified when the id
    /// actually changes; returns whether a notification was sent.
    pub fn select(&self, branch: Branch) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if current.id == branch.id {
                return false;
            }
            *current = branch;
            true
        });
        if changed {
            tracing::info!(branch = %self.tx.borrow().id, "branch changed");
        }
        changed
    }
}

pub struct BranchSubscription {
    rx: watch::Receiver<Branch>,
}

impl BranchSubscription {
    /// Non-blocking check used by the UI loop.
    pub fn poll_change(&mut self) -> Option<Branch> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Wait for the next change. Returns `None` once the holder is dropped.
    pub async fn changed(&mut self) -> Option<Branch> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
