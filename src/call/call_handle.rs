use std::sync::Arc;

use crate::call::call_board::CallBoard;
use crate::call::{CallId, CallStatus, SessionEvents};
use crate::negotiation::{FailureReason, NegotiationState};
use crate::signaling::protocol::ParticipantId;

/// Read-only view of a call, returned by `start_call`. Cloneable and usable
/// from any thread; stays valid (reporting `Ended`) after the call ends.
#[derive(Debug, Clone)]
pub struct CallHandle {
    board: Arc<CallBoard>,
}

impl CallHandle {
    pub(crate) fn new(board: Arc<CallBoard>) -> Self {
        Self { board }
    }

    pub fn call_id(&self) -> CallId {
        self.board.call_id()
    }

    pub fn status(&self) -> CallStatus {
        self.board.status()
    }

    pub fn is_ended(&self) -> bool {
        self.board.is_ended()
    }

    pub fn member_states(&self) -> Vec<(ParticipantId, NegotiationState)> {
        self.board.member_states()
    }

    pub fn member_state(&self, peer: &str) -> Option<NegotiationState> {
        self.board.member_state(peer)
    }

    pub fn failure(&self, peer: &str) -> Option<FailureReason> {
        self.board.failure(peer)
    }

    /// Transitions of `peer`'s session from now on.
    pub fn subscribe(&self, peer: &str) -> SessionEvents {
        self.board.subscribe(peer)
    }

    /// Transitions of every member from now on.
    pub fn subscribe_all(&self) -> SessionEvents {
        self.board.subscribe_all()
    }
}
