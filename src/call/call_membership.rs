use std::collections::BTreeMap;

use crate::negotiation::NegotiationSession;
use crate::signaling::protocol::ParticipantId;

/// Sessions of the current call, keyed by remote identity.
///
/// Sessions live here until explicitly removed; a terminal session is kept
/// (and keeps dropping envelopes) until the call ends or the member is
/// replaced or removed.
#[derive(Default)]
pub struct CallMembership {
    sessions: BTreeMap<ParticipantId, NegotiationSession>,
}

impl CallMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `session` under its peer, returning the one it replaces.
    pub fn insert(&mut self, session: NegotiationSession) -> Option<NegotiationSession> {
        self.sessions.insert(session.peer().to_owned(), session)
    }

    pub fn get(&self, peer: &str) -> Option<&NegotiationSession> {
        self.sessions.get(peer)
    }

    pub fn get_mut(&mut self, peer: &str) -> Option<&mut NegotiationSession> {
        self.sessions.get_mut(peer)
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.sessions.contains_key(peer)
    }

    pub fn remove(&mut self, peer: &str) -> Option<NegotiationSession> {
        self.sessions.remove(peer)
    }

    pub fn peers(&self) -> Vec<ParticipantId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NegotiationSession> {
        self.sessions.values_mut()
    }

    /// Removes every session.
    pub fn drain(&mut self) -> Vec<NegotiationSession> {
        std::mem::take(&mut self.sessions).into_values().collect()
    }
}
