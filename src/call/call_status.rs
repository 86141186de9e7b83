use std::fmt;

use crate::negotiation::NegotiationState;

/// Aggregate state of a call, derived from its members' session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStatus {
    /// In progress with no remote members yet.
    Waiting,
    /// Some member is still negotiating and none is connected.
    Connecting,
    /// At least one member is connected.
    Active,
    /// Every member has failed.
    Degraded,
    Ended,
}

impl CallStatus {
    pub(crate) fn aggregate<I>(ended: bool, states: I) -> Self
    where
        I: IntoIterator<Item = NegotiationState>,
    {
        if ended {
            return Self::Ended;
        }
        let mut any = false;
        let mut all_terminal = true;
        for state in states {
            any = true;
            if state == NegotiationState::Connected {
                return Self::Active;
            }
            if !state.is_terminal() {
                all_terminal = false;
            }
        }
        match (any, all_terminal) {
            (false, _) => Self::Waiting,
            (true, true) => Self::Degraded,
            (true, false) => Self::Connecting,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NegotiationState::*;

    #[test]
    fn aggregate_status() {
        assert_eq!(CallStatus::aggregate(false, []), CallStatus::Waiting);
        assert_eq!(
            CallStatus::aggregate(false, [AwaitingAnswer, Failed]),
            CallStatus::Connecting
        );
        assert_eq!(
            CallStatus::aggregate(false, [Failed, Connected, Offering]),
            CallStatus::Active
        );
        assert_eq!(CallStatus::aggregate(false, [Failed, Failed]), CallStatus::Degraded);
        assert_eq!(CallStatus::aggregate(true, [Connected]), CallStatus::Ended);
    }
}
