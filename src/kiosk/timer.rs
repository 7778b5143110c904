//! Second-granularity countdowns
//!
//! The host delivers one tick per second. A countdown only reacts to ticks
//! between an explicit `start` and the matching `stop` (or expiry), so a
//! countdown that was stopped on leaving its step can never fire later.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; the tick was ignored.
    Inactive,
    /// Still running with this many seconds left.
    Running(u32),
    /// Reached zero on this tick and stopped itself.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    budget: u32,
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn new(budget_secs: u32) -> Self {
        Self {
            budget: budget_secs.max(1),
            remaining: 0,
            running: false,
        }
    }

    /// Start (or restart) at the full budget.
    pub fn start(&mut self) {
        self.remaining = self.budget;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.remaining = 0;
        self.running = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Inactive;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds left, or `None` when stopped.
    pub fn remaining(&self) -> Option<u32> {
        self.running.then_some(self.remaining)
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }
}
