use std::fmt;

use super::MsgType;

// ---- Basic types ----------------------------------------------------------

/// Opaque identity of an authenticated participant.
pub type ParticipantId = String;

/// The three negotiation messages the relay understands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    Offer,
    Answer,
    IceCandidate,
}

impl EnvelopeKind {
    pub fn msg_type(self) -> MsgType {
        match self {
            EnvelopeKind::Offer => MsgType::Offer,
            EnvelopeKind::Answer => MsgType::Answer,
            EnvelopeKind::IceCandidate => MsgType::IceCandidate,
        }
    }

    pub fn from_msg_type(t: MsgType) -> Option<Self> {
        match t {
            MsgType::Offer => Some(EnvelopeKind::Offer),
            MsgType::Answer => Some(EnvelopeKind::Answer),
            MsgType::IceCandidate => Some(EnvelopeKind::IceCandidate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeKind::Offer => "offer",
            EnvelopeKind::Answer => "answer",
            EnvelopeKind::IceCandidate => "ice-candidate",
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signaling message routed between two participants.
///
/// `payload` is an opaque session description or candidate blob; neither the
/// codec nor the relay looks inside it. Senders leave `from` empty, the relay
/// stamps the authenticated sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalingEnvelope {
    pub kind: EnvelopeKind,
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub payload: Vec<u8>,
}

impl SignalingEnvelope {
    /// Envelope as built by a sender: no `from`.
    pub fn outbound(kind: EnvelopeKind, to: impl Into<ParticipantId>, payload: Vec<u8>) -> Self {
        Self {
            kind,
            from: ParticipantId::new(),
            to: to.into(),
            payload,
        }
    }

    /// Size of the encoded frame body: two `str16` fields and one blob.
    pub fn encoded_len(&self) -> usize {
        2 + self.from.len() + 2 + self.to.len() + 4 + self.payload.len()
    }
}
