use std::fmt;

/// Lifecycle of one peer pair.
///
/// ```text
/// idle -> offering -> awaiting-answer -> ice-exchanging -> connected -> closed
/// idle -> answering ----------------> ice-exchanging
/// any non-terminal -> failed (absorbing, except for hangup -> closed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    Offering,
    Answering,
    AwaitingAnswer,
    IceExchanging,
    Connected,
    Failed,
    Closed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }

    /// Between the first description and `Connected`.
    pub fn is_negotiating(self) -> bool {
        matches!(
            self,
            Self::Offering | Self::Answering | Self::AwaitingAnswer | Self::IceExchanging
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Offering => "offering",
            Self::Answering => "answering",
            Self::AwaitingAnswer => "awaiting-answer",
            Self::IceExchanging => "ice-exchanging",
            Self::Connected => "connected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Initiator,
    Responder,
}
