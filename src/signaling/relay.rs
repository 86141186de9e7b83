use std::sync::Arc;

use crate::log::{LogSink, NoopLogSink};
use crate::signaling::protocol::{MAX_BODY_LEN, Msg, SignalingEnvelope};
use crate::signaling::registry::TransportRegistry;
use crate::signaling::types::ConnId;
use crate::{sink_debug, sink_warn};

/// What happened to one relayed envelope. Informational only: every outcome
/// other than `Delivered` is a silent drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered(ConnId),
    UnknownTarget,
    Unauthenticated,
    EndpointClosed,
    /// Would exceed the frame limit once `from` is stamped.
    TooLarge,
}

/// Forwards offer / answer / candidate envelopes between registered endpoints.
///
/// At-most-once, fire and forget. The payload is never inspected.
pub struct SignalingRelay {
    registry: Arc<TransportRegistry>,
    log: Arc<dyn LogSink>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<TransportRegistry>) -> Self {
        Self::with_log(registry, Arc::new(NoopLogSink))
    }

    pub fn with_log(registry: Arc<TransportRegistry>, log: Arc<dyn LogSink>) -> Self {
        Self { registry, log }
    }

    pub fn registry(&self) -> &Arc<TransportRegistry> {
        &self.registry
    }

    /// Routes `env` from the connection `from_conn` to `env.to`.
    ///
    /// `from` is overwritten with the identity authenticated on `from_conn`.
    pub fn relay(&self, from_conn: ConnId, mut env: SignalingEnvelope) -> RelayOutcome {
        let Some(sender) = self.registry.identity_for(from_conn) else {
            sink_warn!(
                self.log,
                "[relay] dropping {} from unauthenticated conn {}",
                env.kind,
                from_conn
            );
            return RelayOutcome::Unauthenticated;
        };

        let Some(target) = self.registry.lookup(&env.to) else {
            sink_debug!(
                self.log,
                "[relay] dropping {} from {} to offline {}",
                env.kind,
                sender,
                env.to
            );
            return RelayOutcome::UnknownTarget;
        };

        env.from = sender;
        if env.encoded_len() > MAX_BODY_LEN {
            sink_warn!(
                self.log,
                "[relay] dropping {} from {}: {} bytes exceeds the frame limit",
                env.kind,
                env.from,
                env.encoded_len()
            );
            return RelayOutcome::TooLarge;
        }
        let kind = env.kind;
        let to_conn = target.conn_id;

        if target.send(Msg::Signal(env)) {
            sink_debug!(self.log, "[relay] {} delivered to conn {}", kind, to_conn);
            RelayOutcome::Delivered(to_conn)
        } else {
            sink_warn!(
                self.log,
                "[relay] {} for conn {} dropped (endpoint closed)",
                kind,
                to_conn
            );
            RelayOutcome::EndpointClosed
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::signaling::protocol::EnvelopeKind;
    use crate::signaling::registry::Endpoint;
    use std::sync::mpsc::{self, Receiver};

    fn setup() -> (SignalingRelay, Receiver<Msg>, Receiver<Msg>) {
        let registry = Arc::new(TransportRegistry::new());
        let (a_tx, a_rx) = mpsc::channel();
        let (b_tx, b_rx) = mpsc::channel();
        registry.register("alice".into(), Endpoint::new(1, a_tx));
        registry.register("bob".into(), Endpoint::new(2, b_tx));
        (SignalingRelay::new(registry), a_rx, b_rx)
    }

    #[test]
    fn forwards_with_sender_stamped() {
        let (relay, a_rx, b_rx) = setup();
        let mut env = SignalingEnvelope::outbound(EnvelopeKind::Offer, "alice", b"v=0".to_vec());
        env.from = "mallory".into();

        assert_eq!(relay.relay(2, env), RelayOutcome::Delivered(1));

        match a_rx.try_recv().unwrap() {
            Msg::Signal(got) => {
                assert_eq!(got.from, "bob");
                assert_eq!(got.to, "alice");
                assert_eq!(got.kind, EnvelopeKind::Offer);
                assert_eq!(got.payload, b"v=0");
            }
            other => panic!("expected Signal, got {other:?}"),
        }
        assert!(a_rx.try_recv().is_err());
        assert!(b_rx.try_recv().is_err());
    }

    #[test]
    fn unknown_target_is_dropped() {
        let (relay, a_rx, b_rx) = setup();
        let env = SignalingEnvelope::outbound(EnvelopeKind::Answer, "carol", vec![1]);
        assert_eq!(relay.relay(1, env), RelayOutcome::UnknownTarget);
        assert!(a_rx.try_recv().is_err());
        assert!(b_rx.try_recv().is_err());
    }

    #[test]
    fn unauthenticated_sender_is_dropped() {
        let (relay, a_rx, _b_rx) = setup();
        let env = SignalingEnvelope::outbound(EnvelopeKind::IceCandidate, "alice", vec![]);
        assert_eq!(relay.relay(99, env), RelayOutcome::Unauthenticated);
        assert!(a_rx.try_recv().is_err());
    }

    #[test]
    fn closed_endpoint_is_reported() {
        let (relay, a_rx, _b_rx) = setup();
        drop(a_rx);
        let env = SignalingEnvelope::outbound(EnvelopeKind::Offer, "alice", vec![]);
        assert_eq!(relay.relay(2, env), RelayOutcome::EndpointClosed);
    }

    #[test]
    fn envelope_too_large_after_stamping_is_dropped() {
        let (relay, a_rx, _b_rx) = setup();
        // Fits with an empty `from`; "bob" pushes it over the limit.
        let payload = vec![0u8; MAX_BODY_LEN - 2 - 2 - "alice".len() - 4];
        let env = SignalingEnvelope::outbound(EnvelopeKind::Offer, "alice", payload);
        assert_eq!(env.encoded_len(), MAX_BODY_LEN);

        assert_eq!(relay.relay(2, env), RelayOutcome::TooLarge);
        assert!(a_rx.try_recv().is_err());

        let small = SignalingEnvelope::outbound(EnvelopeKind::IceCandidate, "alice", vec![1]);
        assert_eq!(relay.relay(2, small), RelayOutcome::Delivered(1));
    }

    #[test]
    fn superseded_connection_counts_as_unauthenticated() {
        let (relay, a_rx, _b_rx) = setup();
        let (b2_tx, _b2_rx) = mpsc::channel();
        relay
            .registry()
            .register("bob".into(), Endpoint::new(3, b2_tx));

        let env = SignalingEnvelope::outbound(EnvelopeKind::Offer, "alice", vec![]);
        assert_eq!(relay.relay(2, env.clone()), RelayOutcome::Unauthenticated);
        assert_eq!(relay.relay(3, env), RelayOutcome::Delivered(1));
        assert!(matches!(a_rx.try_recv(), Ok(Msg::Signal(e)) if e.from == "bob"));
    }
}
