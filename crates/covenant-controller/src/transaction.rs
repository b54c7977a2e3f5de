//! All-or-nothing call execution
//!
//! Every mutating controller call runs inside [`Controller::transact`]. The
//! call starts by capturing a [`Checkpoint`] of the controller state and of
//! all three collaborators. On success the pending events are committed; on
//! any error the checkpoint is restored and the pending events are dropped,
//! so nothing the call did is observable.
//!
//! [`Controller::transact`]: crate::Controller

use crate::collaborators::{Avatar, ReputationLedger, TokenLedger};
use crate::schemes::SchemeRegistry;
use covenant_constraints::ConstraintRegistry;
use covenant_core::{Address, ControllerEvent};

/// Mutable controller state
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    /// Principal → scheme binding
    pub schemes: SchemeRegistry,
    /// Pre and post global constraints
    pub constraints: ConstraintRegistry,
    /// Successor controller; zero until upgraded, terminal afterwards
    pub new_controller: Address,
}

/// Copy of everything a call may change
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint<A, T, R> {
    pub(crate) state: ControllerState,
    pub(crate) avatar: A,
    pub(crate) token: T,
    pub(crate) reputation: R,
}

impl<A, T, R> Checkpoint<A, T, R>
where
    A: Avatar,
    T: TokenLedger,
    R: ReputationLedger,
{
    pub(crate) fn capture(state: &ControllerState, avatar: &A, token: &T, reputation: &R) -> Self {
        Self {
            state: state.clone(),
            avatar: avatar.clone(),
            token: token.clone(),
            reputation: reputation.clone(),
        }
    }
}

/// Committed events plus the buffer of the call in flight
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    committed: Vec<ControllerEvent>,
    pending: Vec<ControllerEvent>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an event for the call in flight
    pub fn emit(&mut self, event: ControllerEvent) {
        self.pending.push(event);
    }

    /// Publish buffered events; returns how many were published
    pub fn commit(&mut self) -> usize {
        let count = self.pending.len();
        for event in &self.pending {
            tracing::info!(event = event.name(), ?event, "controller event");
        }
        self.committed.append(&mut self.pending);
        count
    }

    /// Drop buffered events; returns how many were dropped
    pub fn discard(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Committed events, oldest first
    pub fn committed(&self) -> &[ControllerEvent] {
        &self.committed
    }

    /// Take every committed event, leaving the log empty
    pub fn drain(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.committed)
    }

    /// Events buffered by the call in flight
    pub fn pending(&self) -> &[ControllerEvent] {
        &self.pending
    }
}
