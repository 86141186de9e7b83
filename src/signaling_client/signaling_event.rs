use crate::signaling::protocol::SignalingEnvelope;

/// Inbound traffic surfaced to the application loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingEvent {
    /// Offer / answer / candidate relayed from another participant; `from`
    /// is the server-verified sender.
    Envelope(SignalingEnvelope),
    Pong { nonce: u64 },
    /// The connection closed; no further events follow.
    Disconnected,
}
