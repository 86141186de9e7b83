use std::fmt;

use crate::negotiation::{NegotiationState, PeerConnectionError};
use crate::signaling_client::SignalingClientError;

#[derive(Debug)]
pub enum NegotiationError {
    /// The operation is not valid in the session's current state.
    InvalidState {
        op: &'static str,
        state: NegotiationState,
    },
    PeerConnection(PeerConnectionError),
    Signaling(SignalingClientError),
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState { op, state } => write!(f, "cannot {op} while {state}"),
            Self::PeerConnection(e) => write!(f, "peer connection: {e}"),
            Self::Signaling(e) => write!(f, "signaling: {e}"),
        }
    }
}

impl std::error::Error for NegotiationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PeerConnection(e) => Some(e),
            Self::Signaling(e) => Some(e),
            Self::InvalidState { .. } => None,
        }
    }
}

impl From<PeerConnectionError> for NegotiationError {
    fn from(e: PeerConnectionError) -> Self {
        Self::PeerConnection(e)
    }
}

impl From<SignalingClientError> for NegotiationError {
    fn from(e: SignalingClientError) -> Self {
        Self::Signaling(e)
    }
}
