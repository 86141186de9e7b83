use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerConnectionError {
    /// The connection refused the operation (bad description, bad candidate).
    Rejected(String),
    /// The connection is already closed.
    Closed,
    /// The factory could not build a connection.
    Create(String),
}

impl fmt::Display for PeerConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerConnectionError::Rejected(msg) => write!(f, "rejected: {msg}"),
            PeerConnectionError::Closed => write!(f, "peer connection closed"),
            PeerConnectionError::Create(msg) => write!(f, "cannot create peer connection: {msg}"),
        }
    }
}

impl std::error::Error for PeerConnectionError {}
