use crate::signaling::protocol::{ParticipantId, SignalingEnvelope};

// ---- Public message enum --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    // Handshake (must be the first frame a client sends)
    Authenticate {
        identity: ParticipantId,
        secret: String, // plain text, protect with TLS
    },
    AuthOk {
        identity: ParticipantId,
    },
    AuthErr {
        code: u16, // see AuthErrorCode
    },

    // Offer / Answer / IceCandidate
    Signal(SignalingEnvelope),

    // Keepalive
    Ping {
        nonce: u64,
    },
    Pong {
        nonce: u64,
    },
}

impl Msg {
    /// Short variant name for logs; never includes payloads or secrets.
    pub fn name(&self) -> &'static str {
        match self {
            Msg::Authenticate { .. } => "Authenticate",
            Msg::AuthOk { .. } => "AuthOk",
            Msg::AuthErr { .. } => "AuthErr",
            Msg::Signal(env) => env.kind.as_str(),
            Msg::Ping { .. } => "Ping",
            Msg::Pong { .. } => "Pong",
        }
    }
}
