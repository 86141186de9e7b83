use crate::signaling::protocol::EnvelopeKind;
use crate::signaling_client::SignalingClientError;

/// Outbound half of the signaling channel as seen by a session.
///
/// Implementations send `{kind, to, payload}`; the relay stamps `from`.
pub trait SignalingOutbox {
    fn send_envelope(
        &self,
        kind: EnvelopeKind,
        to: &str,
        payload: Vec<u8>,
    ) -> Result<(), SignalingClientError>;
}
