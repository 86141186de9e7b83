use std::fmt;

/// Why a session ended up `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No progress within the negotiation window.
    Timeout,
    TransportDisconnected,
    TransportFailed,
    /// A description could not be produced, applied or sent.
    Negotiation(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout => write!(f, "negotiation timed out"),
            FailureReason::TransportDisconnected => write!(f, "transport disconnected"),
            FailureReason::TransportFailed => write!(f, "transport failed"),
            FailureReason::Negotiation(msg) => write!(f, "negotiation error: {msg}"),
        }
    }
}
