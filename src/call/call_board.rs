use std::collections::BTreeMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::call::{CallId, CallStatus, SessionEvents};
use crate::negotiation::{FailureReason, NegotiationState, SessionEvent, SessionObserver};
use crate::signaling::protocol::ParticipantId;

#[derive(Debug)]
struct MemberEntry {
    state: NegotiationState,
    failure: Option<FailureReason>,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl MemberEntry {
    fn new() -> Self {
        Self {
            state: NegotiationState::Idle,
            failure: None,
            subscribers: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct BoardInner {
    ended: bool,
    members: BTreeMap<ParticipantId, MemberEntry>,
    /// Subscribed to every member.
    everyone: Vec<Sender<SessionEvent>>,
}

/// Last known state of every member of one call, plus the subscriptions
/// fed from session transitions.
///
/// Shared between the orchestrator (as the sessions' observer) and every
/// [`CallHandle`](crate::call::CallHandle).
#[derive(Debug)]
pub struct CallBoard {
    call_id: CallId,
    inner: Mutex<BoardInner>,
}

impl CallBoard {
    pub fn new(call_id: CallId) -> Self {
        Self {
            call_id,
            inner: Mutex::new(BoardInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Starts tracking `peer` at `Idle`. A previous entry for the same peer
    /// is replaced and its subscriptions end.
    pub fn add_member(&self, peer: &str) {
        let mut inner = self.lock();
        if inner.ended {
            return;
        }
        inner.members.insert(peer.to_owned(), MemberEntry::new());
    }

    pub fn remove_member(&self, peer: &str) {
        self.lock().members.remove(peer);
    }

    /// Marks the call ended; every subscription ends.
    pub fn end(&self) {
        let mut inner = self.lock();
        inner.ended = true;
        inner.everyone.clear();
        for member in inner.members.values_mut() {
            member.subscribers.clear();
        }
    }

    pub fn is_ended(&self) -> bool {
        self.lock().ended
    }

    pub fn status(&self) -> CallStatus {
        let inner = self.lock();
        CallStatus::aggregate(inner.ended, inner.members.values().map(|m| m.state))
    }

    pub fn member_states(&self) -> Vec<(ParticipantId, NegotiationState)> {
        self.lock()
            .members
            .iter()
            .map(|(peer, m)| (peer.clone(), m.state))
            .collect()
    }

    pub fn member_state(&self, peer: &str) -> Option<NegotiationState> {
        self.lock().members.get(peer).map(|m| m.state)
    }

    pub fn failure(&self, peer: &str) -> Option<FailureReason> {
        self.lock().members.get(peer).and_then(|m| m.failure.clone())
    }

    /// Subscription to `peer`'s transitions. Already finished when `peer` is
    /// not a member, its session is closed, or the call has ended.
    pub fn subscribe(&self, peer: &str) -> SessionEvents {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.lock();
        if !inner.ended {
            if let Some(member) = inner.members.get_mut(peer) {
                if member.state != NegotiationState::Closed {
                    member.subscribers.push(tx);
                }
            }
        }
        SessionEvents::new(rx)
    }

    /// Subscription to every member's transitions, until the call ends.
    pub fn subscribe_all(&self) -> SessionEvents {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.lock();
        if !inner.ended {
            inner.everyone.push(tx);
        }
        SessionEvents::new(rx)
    }
}

impl SessionObserver for CallBoard {
    fn on_session_event(&self, event: &SessionEvent) {
        let mut inner = self.lock();
        if inner.ended {
            return;
        }
        inner.everyone.retain(|tx| tx.send(event.clone()).is_ok());

        let Some(member) = inner.members.get_mut(&event.peer) else {
            return;
        };
        member.state = event.state;
        member.failure = event.reason.clone();
        member.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if event.state == NegotiationState::Closed {
            member.subscribers.clear();
        }
    }
}
