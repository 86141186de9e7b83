use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::log::{LogSink, NoopLogSink};
use crate::media::{LocalCapture, MediaTrack};
use crate::negotiation::{
    FailureReason, NegotiationError, NegotiationRole, NegotiationState, NoopSessionObserver,
    PeerConnection, SdpType, SessionEvent, SessionObserver, SignalingOutbox, TransportState,
};
use crate::signaling::protocol::{EnvelopeKind, ParticipantId};
use crate::utils::now_millis;
use crate::{sink_debug, sink_info, sink_warn};

/// What every session of one call shares.
#[derive(Clone)]
pub struct SessionContext {
    /// Our own identity; decides glare.
    pub local: ParticipantId,
    pub timeout: Duration,
    pub observer: Arc<dyn SessionObserver>,
    pub log: Arc<dyn LogSink>,
}

impl SessionContext {
    pub fn new(local: impl Into<ParticipantId>, timeout: Duration) -> Self {
        Self {
            local: local.into(),
            timeout,
            observer: Arc::new(NoopSessionObserver),
            log: Arc::new(NoopLogSink),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }
}

/// Negotiation with one remote peer.
///
/// Every method is an event handler: it runs to completion, may emit
/// envelopes through the outbox, and reports each state change to the
/// observer. Once `Failed` or `Closed`, inbound envelopes are dropped.
pub struct NegotiationSession {
    ctx: SessionContext,
    peer: ParticipantId,
    role: NegotiationRole,
    state: NegotiationState,
    pc: Box<dyn PeerConnection>,
    local_capture: Option<Arc<LocalCapture>>,
    local_tracks_added: bool,
    remote_tracks: Vec<MediaTrack>,
    /// Remote candidates that arrived before the remote description.
    pending_candidates: Vec<Vec<u8>>,
    remote_description_set: bool,
    deadline: Option<Instant>,
    failure: Option<FailureReason>,
}

impl NegotiationSession {
    pub fn new(
        ctx: SessionContext,
        peer: impl Into<ParticipantId>,
        role: NegotiationRole,
        pc: Box<dyn PeerConnection>,
        local_capture: Arc<LocalCapture>,
    ) -> Self {
        Self {
            ctx,
            peer: peer.into(),
            role,
            state: NegotiationState::Idle,
            pc,
            local_capture: Some(local_capture),
            local_tracks_added: false,
            remote_tracks: Vec::new(),
            pending_candidates: Vec::new(),
            remote_description_set: false,
            deadline: None,
            failure: None,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether this session still holds a reference to the local capture.
    pub fn holds_local_capture(&self) -> bool {
        self.local_capture.is_some()
    }

    /// Remote tracks; empty until `Connected`.
    pub fn remote_tracks(&self) -> &[MediaTrack] {
        if self.state == NegotiationState::Connected {
            &self.remote_tracks
        } else {
            &[]
        }
    }

    // ---- transitions ----------------------------------------------------

    fn transition(&mut self, next: NegotiationState) {
        if self.state == next {
            return;
        }
        sink_debug!(self.ctx.log, "[{}] {} -> {}", self.peer, self.state, next);
        self.state = next;
        let reason = match next {
            NegotiationState::Failed => self.failure.clone(),
            _ => None,
        };
        self.ctx.observer.on_session_event(&SessionEvent {
            peer: self.peer.clone(),
            state: next,
            at_ms: now_millis(),
            reason,
        });
    }

    /// A deadline past what `Instant` can represent never fires.
    fn arm_deadline(&mut self, now: Instant) {
        self.deadline = now.checked_add(self.ctx.timeout);
    }

    fn release_resources(&mut self) {
        self.pc.close();
        self.remote_tracks.clear();
        self.pending_candidates.clear();
        self.local_capture = None;
        self.deadline = None;
    }

    /// Moves a non-terminal session to `Failed`, releasing what hangup
    /// releases.
    pub fn fail(&mut self, reason: FailureReason) {
        if self.state.is_terminal() {
            return;
        }
        sink_info!(self.ctx.log, "[{}] failed: {}", self.peer, reason);
        self.release_resources();
        self.failure = Some(reason);
        self.transition(NegotiationState::Failed);
    }

    /// Hangup. Terminal from any state, `Failed` included.
    pub fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.release_resources();
        self.transition(NegotiationState::Closed);
    }

    /// Fails the session when `result` is an error and passes the error on.
    fn or_fail<T>(&mut self, result: Result<T, NegotiationError>) -> Result<T, NegotiationError> {
        if let Err(e) = &result {
            self.fail(FailureReason::Negotiation(e.to_string()));
        }
        result
    }

    fn add_local_tracks_once(&mut self) -> Result<(), NegotiationError> {
        if self.local_tracks_added {
            return Ok(());
        }
        if let Some(capture) = &self.local_capture {
            self.pc.add_local_tracks(capture.tracks())?;
        }
        self.local_tracks_added = true;
        Ok(())
    }

    // ---- initiator ------------------------------------------------------

    /// `idle -> offering -> awaiting-answer`.
    pub fn start_offer(
        &mut self,
        outbox: &dyn SignalingOutbox,
        now: Instant,
    ) -> Result<(), NegotiationError> {
        if self.state != NegotiationState::Idle {
            return Err(NegotiationError::InvalidState {
                op: "start an offer",
                state: self.state,
            });
        }
        self.role = NegotiationRole::Initiator;
        self.arm_deadline(now);
        self.transition(NegotiationState::Offering);

        let sent = self.send_offer(outbox);
        self.or_fail(sent)?;
        self.transition(NegotiationState::AwaitingAnswer);
        Ok(())
    }

    fn send_offer(&mut self, outbox: &dyn SignalingOutbox) -> Result<(), NegotiationError> {
        self.add_local_tracks_once()?;
        let offer = self.pc.create_offer()?;
        self.pc.set_local_description(SdpType::Offer, &offer)?;
        outbox.send_envelope(EnvelopeKind::Offer, &self.peer, offer)?;
        Ok(())
    }

    /// Remote answer: `awaiting-answer -> ice-exchanging`. Dropped in any
    /// other state.
    pub fn handle_answer(&mut self, sdp: &[u8], now: Instant) -> Result<(), NegotiationError> {
        if self.state != NegotiationState::AwaitingAnswer {
            sink_debug!(self.ctx.log, "[{}] dropping answer while {}", self.peer, self.state);
            return Ok(());
        }
        let applied = self.apply_remote_description(SdpType::Answer, sdp);
        self.or_fail(applied)?;
        self.arm_deadline(now);
        self.transition(NegotiationState::IceExchanging);
        Ok(())
    }

    // ---- responder ------------------------------------------------------

    /// Remote offer.
    ///
    /// From `idle` this answers. While our own offer is outstanding (glare)
    /// the side with the byte-wise smaller identity rolls back and answers;
    /// the other side ignores the incoming offer. Later offers
    /// (renegotiation) are ignored.
    pub fn handle_offer(
        &mut self,
        sdp: &[u8],
        outbox: &dyn SignalingOutbox,
        now: Instant,
    ) -> Result<(), NegotiationError> {
        match self.state {
            NegotiationState::Idle => {}
            NegotiationState::Offering | NegotiationState::AwaitingAnswer => {
                if self.ctx.local.as_bytes() >= self.peer.as_bytes() {
                    sink_info!(self.ctx.log, "[{}] glare: keeping our offer", self.peer);
                    return Ok(());
                }
                sink_info!(self.ctx.log, "[{}] glare: rolling back our offer", self.peer);
                let rolled_back = self.pc.rollback().map_err(NegotiationError::from);
                self.or_fail(rolled_back)?;
            }
            NegotiationState::Answering
            | NegotiationState::IceExchanging
            | NegotiationState::Connected => {
                sink_warn!(
                    self.ctx.log,
                    "[{}] ignoring offer while {} (renegotiation unsupported)",
                    self.peer,
                    self.state
                );
                return Ok(());
            }
            NegotiationState::Failed | NegotiationState::Closed => {
                sink_debug!(self.ctx.log, "[{}] dropping offer while {}", self.peer, self.state);
                return Ok(());
            }
        }

        self.role = NegotiationRole::Responder;
        self.arm_deadline(now);
        self.transition(NegotiationState::Answering);

        let answered = self.send_answer(sdp, outbox);
        self.or_fail(answered)?;
        self.transition(NegotiationState::IceExchanging);
        Ok(())
    }

    fn send_answer(&mut self, offer: &[u8], outbox: &dyn SignalingOutbox) -> Result<(), NegotiationError> {
        self.apply_remote_description(SdpType::Offer, offer)?;
        self.add_local_tracks_once()?;
        let answer = self.pc.create_answer()?;
        self.pc.set_local_description(SdpType::Answer, &answer)?;
        outbox.send_envelope(EnvelopeKind::Answer, &self.peer, answer)?;
        Ok(())
    }

    fn apply_remote_description(&mut self, kind: SdpType, sdp: &[u8]) -> Result<(), NegotiationError> {
        self.pc.set_remote_description(kind, sdp)?;
        self.remote_description_set = true;
        for cand in std::mem::take(&mut self.pending_candidates) {
            self.apply_candidate(&cand);
        }
        Ok(())
    }

    // ---- ICE ------------------------------------------------------------

    /// Remote candidate: queued until the remote description is set, then
    /// applied in arrival order. Dropped once terminal.
    pub fn handle_remote_candidate(&mut self, candidate: &[u8], now: Instant) {
        if self.state.is_terminal() {
            sink_debug!(self.ctx.log, "[{}] dropping candidate while {}", self.peer, self.state);
            return;
        }
        if self.state.is_negotiating() {
            self.arm_deadline(now);
        }
        if self.remote_description_set {
            self.apply_candidate(candidate);
        } else {
            self.pending_candidates.push(candidate.to_vec());
        }
    }

    fn apply_candidate(&mut self, candidate: &[u8]) {
        if let Err(e) = self.pc.add_ice_candidate(candidate) {
            sink_warn!(self.ctx.log, "[{}] skipping remote candidate: {}", self.peer, e);
        }
    }

    /// Locally gathered candidate: sent while negotiating or connected,
    /// dropped otherwise.
    pub fn handle_local_candidate(&mut self, candidate: Vec<u8>, outbox: &dyn SignalingOutbox) {
        if !(self.state.is_negotiating() || self.state == NegotiationState::Connected) {
            sink_debug!(self.ctx.log, "[{}] not sending candidate while {}", self.peer, self.state);
            return;
        }
        if let Err(e) = outbox.send_envelope(EnvelopeKind::IceCandidate, &self.peer, candidate) {
            sink_warn!(self.ctx.log, "[{}] candidate not sent: {}", self.peer, e);
        }
    }

    // ---- transport ------------------------------------------------------

    pub fn handle_transport_state(&mut self, transport: TransportState) {
        match transport {
            TransportState::Connected => {
                if self.state == NegotiationState::IceExchanging {
                    self.deadline = None;
                    self.transition(NegotiationState::Connected);
                }
            }
            TransportState::Disconnected | TransportState::Closed => {
                self.fail(FailureReason::TransportDisconnected);
            }
            TransportState::Failed => self.fail(FailureReason::TransportFailed),
            TransportState::New | TransportState::Connecting => {}
        }
    }

    /// Remote media announced by the peer connection; owned by the session
    /// and visible from `Connected`.
    pub fn handle_remote_track(&mut self, track: MediaTrack) {
        if self.state.is_terminal() {
            return;
        }
        if !self.remote_tracks.contains(&track) {
            self.remote_tracks.push(track);
        }
    }

    /// Fails the session with `Timeout` once `now` passes the deadline.
    /// Returns whether it fired.
    pub fn poll_timeout(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline && !self.state.is_terminal() => {
                self.fail(FailureReason::Timeout);
                true
            }
            _ => false,
        }
    }
}

impl Drop for NegotiationSession {
    fn drop(&mut self) {
        self.pc.close();
    }
}
