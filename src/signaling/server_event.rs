use crate::signaling::{
    protocol::{Msg, ParticipantId},
    registry::Endpoint,
    types::ConnId,
};

/// Events sent *to* the central server thread.
pub enum ServerEvent {
    /// A connection completed the auth handshake as `identity`.
    Register {
        conn_id: ConnId,
        identity: ParticipantId,
        endpoint: Endpoint,
    },

    /// An authenticated client sent a message.
    MsgFromClient { conn_id: ConnId, msg: Msg },

    /// A client disconnected (TCP/TLS closed or errored).
    Disconnected { conn_id: ConnId },

    /// Stop the loop and drop every endpoint.
    Shutdown,
}
