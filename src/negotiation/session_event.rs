use crate::negotiation::{FailureReason, NegotiationState};
use crate::signaling::protocol::ParticipantId;

/// One state transition of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub peer: ParticipantId,
    pub state: NegotiationState,
    /// Wall clock, milliseconds since the UNIX epoch.
    pub at_ms: u128,
    /// Set when `state` is `Failed`.
    pub reason: Option<FailureReason>,
}

/// Receives every transition of the sessions it is attached to.
pub trait SessionObserver {
    fn on_session_event(&self, event: &SessionEvent);
}

#[derive(Debug, Default)]
pub struct NoopSessionObserver;

impl SessionObserver for NoopSessionObserver {
    fn on_session_event(&self, _event: &SessionEvent) {}
}
