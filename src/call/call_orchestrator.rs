use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::call::call_board::CallBoard;
use crate::call::{
    CallError, CallHandle, CallId, CallMembership, CallRecord, CallRecorder, NoopCallRecorder,
};
use crate::log::LogSink;
use crate::media::{CaptureDevice, LocalCapture, MediaConstraints, MediaTrack};
use crate::negotiation::{
    NegotiationConfig, NegotiationRole, NegotiationSession, PeerConnection, PeerConnectionFactory,
    SessionContext, SignalingOutbox, TransportState,
};
use crate::signaling::protocol::{EnvelopeKind, ParticipantId, SignalingEnvelope};
use crate::utils::now_millis;
use crate::{sink_debug, sink_info, sink_warn};

struct ActiveCall {
    id: CallId,
    board: Arc<CallBoard>,
    members: CallMembership,
    ctx: SessionContext,
    capture: Arc<LocalCapture>,
}

/// Owns the local participant's current call.
///
/// Single-threaded: the application feeds it relayed envelopes, transport
/// and media events and a periodic [`poll`](Self::poll), one at a time.
/// Observers read state through the [`CallHandle`] returned by
/// [`start_call`](Self::start_call).
pub struct CallOrchestrator {
    local: ParticipantId,
    config: NegotiationConfig,
    factory: Box<dyn PeerConnectionFactory>,
    device: Arc<dyn CaptureDevice>,
    outbox: Arc<dyn SignalingOutbox>,
    recorder: Box<dyn CallRecorder>,
    log: Arc<dyn LogSink>,
    call: Option<ActiveCall>,
    next_call_id: CallId,
}

impl CallOrchestrator {
    pub fn new(
        local: impl Into<ParticipantId>,
        factory: Box<dyn PeerConnectionFactory>,
        device: Arc<dyn CaptureDevice>,
        outbox: Arc<dyn SignalingOutbox>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            local: local.into(),
            config: NegotiationConfig::default(),
            factory,
            device,
            outbox,
            recorder: Box::new(NoopCallRecorder),
            log,
            call: None,
            next_call_id: 1,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: NegotiationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_recorder(mut self, recorder: Box<dyn CallRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn is_in_call(&self) -> bool {
        self.call.is_some()
    }

    pub fn call_handle(&self) -> Option<CallHandle> {
        self.call.as_ref().map(|c| CallHandle::new(Arc::clone(&c.board)))
    }

    pub fn session(&self, peer: &str) -> Option<&NegotiationSession> {
        self.call.as_ref().and_then(|c| c.members.get(peer))
    }

    pub fn members(&self) -> Vec<ParticipantId> {
        self.call.as_ref().map(|c| c.members.peers()).unwrap_or_default()
    }

    /// Audio and video call to `targets`.
    pub fn start_call<I, S>(&mut self, targets: I) -> Result<CallHandle, CallError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ParticipantId>,
    {
        self.start_call_with(targets, &MediaConstraints::default())
    }

    /// Acquires local capture once and offers to every target.
    ///
    /// The local identity and duplicate targets are skipped. An empty target
    /// set yields a call holding only local capture, answering whoever offers.
    /// Nothing is left behind when capture or a peer connection cannot be
    /// created. A member whose offer fails is reported as failed; the call
    /// goes on.
    pub fn start_call_with<I, S>(
        &mut self,
        targets: I,
        constraints: &MediaConstraints,
    ) -> Result<CallHandle, CallError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ParticipantId>,
    {
        if self.call.is_some() {
            return Err(CallError::AlreadyInCall);
        }

        let mut seen = BTreeSet::new();
        let targets: Vec<ParticipantId> = targets
            .into_iter()
            .map(Into::into)
            .filter(|t| *t != self.local && seen.insert(t.clone()))
            .collect();

        let capture = LocalCapture::acquire(Arc::clone(&self.device), constraints)?;

        let mut pcs: Vec<(ParticipantId, Box<dyn PeerConnection>)> = Vec::with_capacity(targets.len());
        for target in &targets {
            match self.factory.create(target, &self.config.ice) {
                Ok(pc) => pcs.push((target.clone(), pc)),
                Err(e) => {
                    sink_warn!(self.log, "[call] peer connection for {} failed: {}", target, e);
                    for (_, mut pc) in pcs {
                        pc.close();
                    }
                    return Err(CallError::PeerConnection(e));
                }
            }
        }

        let id = self.next_call_id;
        self.next_call_id += 1;
        let board = Arc::new(CallBoard::new(id));
        let ctx = SessionContext::new(self.local.clone(), self.config.timeout)
            .with_observer(board.clone())
            .with_log(self.log.clone());

        sink_info!(self.log, "[call] call {} starting with {} member(s)", id, targets.len());

        let now = Instant::now();
        let mut members = CallMembership::new();
        for (peer, pc) in pcs {
            board.add_member(&peer);
            let mut session = NegotiationSession::new(
                ctx.clone(),
                peer,
                NegotiationRole::Initiator,
                pc,
                Arc::clone(&capture),
            );
            if let Err(e) = session.start_offer(self.outbox.as_ref(), now) {
                sink_warn!(self.log, "[call] offer to {} failed: {}", session.peer(), e);
            }
            members.insert(session);
        }

        self.recorder.call_started(&CallRecord {
            call_id: id,
            participants: targets,
            started_at_ms: now_millis(),
            ended_at_ms: None,
        });

        let handle = CallHandle::new(Arc::clone(&board));
        self.call = Some(ActiveCall {
            id,
            board,
            members,
            ctx,
            capture,
        });
        Ok(handle)
    }

    /// Closes every member and releases local capture. Idempotent.
    pub fn end_call(&mut self) {
        let Some(mut call) = self.call.take() else {
            return;
        };
        for mut session in call.members.drain() {
            session.close();
        }
        call.board.end();
        let id = call.id;
        // Last reference to the capture; its tracks are released here.
        drop(call);
        self.recorder.call_ended(id, now_millis());
        sink_info!(self.log, "[call] call {} ended", id);
    }

    /// Routes a relayed envelope to the session for its sender.
    ///
    /// An offer from a new peer during a call creates a responder session.
    /// Everything else is for existing members only; the rest is dropped.
    pub fn handle_envelope(&mut self, env: SignalingEnvelope) {
        let Some(call) = self.call.as_mut() else {
            sink_debug!(self.log, "[call] no call; dropping {:?} from {}", env.kind, env.from);
            return;
        };
        let now = Instant::now();

        if env.kind == EnvelopeKind::Offer && !call.members.contains(&env.from) {
            if env.from == self.local || env.from.is_empty() {
                return;
            }
            let pc = match self.factory.create(&env.from, &self.config.ice) {
                Ok(pc) => pc,
                Err(e) => {
                    sink_warn!(self.log, "[call] cannot answer {}: {}", env.from, e);
                    return;
                }
            };
            sink_info!(self.log, "[call] {} joined call {}", env.from, call.id);
            call.board.add_member(&env.from);
            call.members.insert(NegotiationSession::new(
                call.ctx.clone(),
                env.from.clone(),
                NegotiationRole::Responder,
                pc,
                Arc::clone(&call.capture),
            ));
            self.recorder.participant_joined(call.id, &env.from);
        }

        let Some(session) = call.members.get_mut(&env.from) else {
            sink_debug!(self.log, "[call] dropping {:?} from non-member {}", env.kind, env.from);
            return;
        };
        let result = match env.kind {
            EnvelopeKind::Offer => session.handle_offer(&env.payload, self.outbox.as_ref(), now),
            EnvelopeKind::Answer => session.handle_answer(&env.payload, now),
            EnvelopeKind::IceCandidate => {
                session.handle_remote_candidate(&env.payload, now);
                Ok(())
            }
        };
        if let Err(e) = result {
            sink_warn!(self.log, "[call] {:?} from {} failed: {}", env.kind, env.from, e);
        }
    }

    pub fn on_transport_state(&mut self, peer: &str, state: TransportState) {
        if let Some(session) = self.member_mut(peer) {
            session.handle_transport_state(state);
        }
    }

    pub fn on_local_candidate(&mut self, peer: &str, candidate: Vec<u8>) {
        let Some(call) = self.call.as_mut() else {
            return;
        };
        if let Some(session) = call.members.get_mut(peer) {
            session.handle_local_candidate(candidate, self.outbox.as_ref());
        }
    }

    pub fn on_remote_track(&mut self, peer: &str, track: MediaTrack) {
        if let Some(session) = self.member_mut(peer) {
            session.handle_remote_track(track);
        }
    }

    /// Fires negotiation timeouts due at `now`; returns the members that
    /// failed.
    pub fn poll(&mut self, now: Instant) -> Vec<ParticipantId> {
        let Some(call) = self.call.as_mut() else {
            return Vec::new();
        };
        call.members
            .iter_mut()
            .filter_map(|s| s.poll_timeout(now).then(|| s.peer().to_owned()))
            .collect()
    }

    /// Offers to `peer` during the current call. A failed or closed member
    /// is replaced by a fresh session; a live one is left alone.
    pub fn add_participant(&mut self, peer: &str) -> Result<(), CallError> {
        let Some(call) = self.call.as_mut() else {
            return Err(CallError::NoActiveCall);
        };
        if peer == self.local {
            return Ok(());
        }
        if call
            .members
            .get(peer)
            .is_some_and(|s| !s.state().is_terminal())
        {
            return Ok(());
        }

        let pc = self.factory.create(peer, &self.config.ice)?;
        if let Some(mut replaced) = call.members.remove(peer) {
            replaced.close();
        }
        call.board.add_member(peer);
        let mut session = NegotiationSession::new(
            call.ctx.clone(),
            peer,
            NegotiationRole::Initiator,
            pc,
            Arc::clone(&call.capture),
        );
        if let Err(e) = session.start_offer(self.outbox.as_ref(), Instant::now()) {
            sink_warn!(self.log, "[call] offer to {} failed: {}", peer, e);
        }
        call.members.insert(session);
        self.recorder.participant_joined(call.id, peer);
        Ok(())
    }

    /// Hangs up on one member. Removing the last member ends the call.
    /// Returns whether `peer` was a member.
    pub fn remove_participant(&mut self, peer: &str) -> Result<bool, CallError> {
        let Some(call) = self.call.as_mut() else {
            return Err(CallError::NoActiveCall);
        };
        let Some(mut session) = call.members.remove(peer) else {
            return Ok(false);
        };
        session.close();
        call.board.remove_member(peer);
        if call.members.is_empty() {
            self.end_call();
        }
        Ok(true)
    }

    /// Mutes or unmutes the local microphone; `Ok(false)` when the call has
    /// no audio track.
    pub fn set_audio_enabled(&mut self, enabled: bool) -> Result<bool, CallError> {
        let call = self.call.as_ref().ok_or(CallError::NoActiveCall)?;
        Ok(call.capture.set_audio_enabled(enabled))
    }

    pub fn set_video_enabled(&mut self, enabled: bool) -> Result<bool, CallError> {
        let call = self.call.as_ref().ok_or(CallError::NoActiveCall)?;
        Ok(call.capture.set_video_enabled(enabled))
    }

    fn member_mut(&mut self, peer: &str) -> Option<&mut NegotiationSession> {
        self.call.as_mut().and_then(|c| c.members.get_mut(peer))
    }
}

impl Drop for CallOrchestrator {
    fn drop(&mut self) {
        self.end_call();
    }
}
