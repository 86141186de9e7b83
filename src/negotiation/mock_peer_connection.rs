use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::media::MediaTrack;
use crate::negotiation::{IceConfig, PeerConnection, PeerConnectionError, PeerConnectionFactory, SdpType};
use crate::signaling::protocol::ParticipantId;

/// One call made on a [`MockPeerConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PcCall {
    AddLocalTracks(usize),
    CreateOffer,
    CreateAnswer,
    SetLocalDescription(SdpType),
    SetRemoteDescription(SdpType, Vec<u8>),
    Rollback,
    AddIceCandidate(Vec<u8>),
    Close,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<PcCall>,
    closed: bool,
    fail_create_offer: bool,
    rejected_candidates: HashSet<Vec<u8>>,
}

/// Scripted peer connection that records every call.
///
/// Clones share state, so a test keeps one clone to inspect what the session
/// did with the other.
#[derive(Debug, Clone)]
pub struct MockPeerConnection {
    peer: ParticipantId,
    state: Arc<Mutex<MockState>>,
}

impl MockPeerConnection {
    pub fn new(peer: impl Into<ParticipantId>) -> Self {
        Self {
            peer: peer.into(),
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn calls(&self) -> Vec<PcCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&PcCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Candidates accepted so far, in order.
    pub fn applied_candidates(&self) -> Vec<Vec<u8>> {
        let state = self.lock();
        state
            .calls
            .iter()
            .filter_map(|c| match c {
                PcCall::AddIceCandidate(cand) if !state.rejected_candidates.contains(cand) => {
                    Some(cand.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn fail_create_offer(&self) {
        self.lock().fail_create_offer = true;
    }

    pub fn reject_candidate(&self, candidate: &[u8]) {
        self.lock().rejected_candidates.insert(candidate.to_vec());
    }

    fn record(&self, call: PcCall) -> Result<MutexGuard<'_, MockState>, PeerConnectionError> {
        let mut state = self.lock();
        if state.closed {
            return Err(PeerConnectionError::Closed);
        }
        state.calls.push(call);
        Ok(state)
    }
}

impl PeerConnection for MockPeerConnection {
    fn add_local_tracks(&mut self, tracks: &[MediaTrack]) -> Result<(), PeerConnectionError> {
        self.record(PcCall::AddLocalTracks(tracks.len()))?;
        Ok(())
    }

    fn create_offer(&mut self) -> Result<Vec<u8>, PeerConnectionError> {
        let state = self.record(PcCall::CreateOffer)?;
        if state.fail_create_offer {
            return Err(PeerConnectionError::Rejected("scripted offer failure".into()));
        }
        Ok(format!("mock-offer-to-{}", self.peer).into_bytes())
    }

    fn create_answer(&mut self) -> Result<Vec<u8>, PeerConnectionError> {
        self.record(PcCall::CreateAnswer)?;
        Ok(format!("mock-answer-to-{}", self.peer).into_bytes())
    }

    fn set_local_description(&mut self, kind: SdpType, _sdp: &[u8]) -> Result<(), PeerConnectionError> {
        self.record(PcCall::SetLocalDescription(kind))?;
        Ok(())
    }

    fn set_remote_description(&mut self, kind: SdpType, sdp: &[u8]) -> Result<(), PeerConnectionError> {
        self.record(PcCall::SetRemoteDescription(kind, sdp.to_vec()))?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PeerConnectionError> {
        self.record(PcCall::Rollback)?;
        Ok(())
    }

    fn add_ice_candidate(&mut self, candidate: &[u8]) -> Result<(), PeerConnectionError> {
        let state = self.record(PcCall::AddIceCandidate(candidate.to_vec()))?;
        if state.rejected_candidates.contains(candidate) {
            return Err(PeerConnectionError::Rejected("scripted candidate rejection".into()));
        }
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            state.calls.push(PcCall::Close);
        }
    }
}

#[derive(Debug, Default)]
struct FactoryState {
    created: Vec<MockPeerConnection>,
    fail_for: HashSet<ParticipantId>,
}

/// Factory handing out [`MockPeerConnection`]s; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct MockPeerConnectionFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockPeerConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FactoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `create` fail for `peer`.
    pub fn fail_for(&self, peer: &str) {
        self.lock().fail_for.insert(peer.to_owned());
    }

    /// Latest connection created for `peer`.
    pub fn last_for(&self, peer: &str) -> Option<MockPeerConnection> {
        self.lock().created.iter().rev().find(|pc| pc.peer == peer).cloned()
    }

    pub fn created(&self) -> Vec<MockPeerConnection> {
        self.lock().created.clone()
    }
}

impl PeerConnectionFactory for MockPeerConnectionFactory {
    fn create(&self, peer: &str, _ice: &IceConfig) -> Result<Box<dyn PeerConnection>, PeerConnectionError> {
        let mut state = self.lock();
        if state.fail_for.contains(peer) {
            return Err(PeerConnectionError::Create(format!("scripted failure for {peer}")));
        }
        let pc = MockPeerConnection::new(peer);
        state.created.push(pc.clone());
        Ok(Box::new(pc))
    }
}
