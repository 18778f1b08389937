//! Modal lifecycle — the closed/opening/open/closing dialog state machine.
//!
//! DESIGN
//! ======
//! Every dialog follows the same linear lifecycle:
//! `Closed → Opening → Open → Closing → Closed`. `Opening` gives the host a
//! fixed mount delay before the enter animation; `Closing` holds the dialog
//! mounted for the exit animation's duration before releasing its subject.
//!
//! Transitions are deadline-driven: callers pass `Instant::now()` into
//! `open`/`close`/`poll` and the machine advances when a deadline passes.
//! No real timers, so the lifecycle is deterministic under test and the
//! embedding UI drives `poll` from whatever tick it already has.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Lifecycle state for one dialog, holding the subject being edited (the
/// order, item, or user the dialog is about) until the close animation has
/// finished.
#[derive(Debug)]
pub struct ModalLifecycle<S> {
    phase: ModalPhase,
    mount_delay: Duration,
    exit_duration: Duration,
    deadline: Option<Instant>,
    submit_in_flight: bool,
    subject: Option<S>,
}

impl<S> ModalLifecycle<S> {
    #[must_use]
    pub fn new(mount_delay: Duration, exit_duration: Duration) -> Self {
        Self {
            phase: ModalPhase::Closed,
            mount_delay,
            exit_duration,
            deadline: None,
            submit_in_flight: false,
            subject: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    #[must_use]
    pub fn subject(&self) -> Option<&S> {
        self.subject.as_ref()
    }

    #[must_use]
    pub fn is_submit_in_flight(&self) -> bool {
        self.submit_in_flight
    }

    /// Open the dialog for `subject`. Only valid from `Closed`; returns
    /// whether the transition happened.
    pub fn open(&mut self, subject: S, now: Instant) -> bool {
        if self.phase != ModalPhase::Closed {
            return false;
        }
        self.phase = ModalPhase::Opening;
        self.subject = Some(subject);
        self.deadline = Some(now + self.mount_delay);
        true
    }

    /// Begin closing. Valid from `Opening` or `Open`; a re-entrant call
    /// while already `Closing` (or while closed) is a no-op.
    pub fn close(&mut self, now: Instant) -> bool {
        match self.phase {
            ModalPhase::Opening | ModalPhase::Open => {
                self.phase = ModalPhase::Closing;
                self.deadline = Some(now + self.exit_duration);
                true
            }
            ModalPhase::Closing | ModalPhase::Closed => false,
        }
    }

    /// Escape key or backdrop click. Equivalent to `close`, except it is
    /// ignored while a submit tied to this dialog is in flight.
    pub fn dismiss(&mut self, now: Instant) -> bool {
        if self.submit_in_flight {
            return false;
        }
        self.close(now)
    }

    /// Mark a submit as in flight, blocking dismissal until it settles.
    pub fn begin_submit(&mut self) {
        self.submit_in_flight = true;
    }

    pub fn finish_submit(&mut self) {
        self.submit_in_flight = false;
    }

    /// Advance past any expired deadline and return the current phase.
    /// Reaching `Closed` releases the subject.
    pub fn poll(&mut self, now: Instant) -> ModalPhase {
        let due = self.deadline.is_some_and(|d| now >= d);
        if due {
            match self.phase {
                ModalPhase::Opening => {
                    self.phase = ModalPhase::Open;
                    self.deadline = None;
                }
                ModalPhase::Closing => {
                    self.phase = ModalPhase::Closed;
                    self.deadline = None;
                    self.subject = None;
                }
                ModalPhase::Open | ModalPhase::Closed => self.deadline = None,
            }
        }
        self.phase
    }
}

#[cfg(test)]
#[path = "modal_test.rs"]
mod tests;
