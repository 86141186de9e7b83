use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crate::log::LogSink;
use crate::signaling::protocol::Msg;
use crate::signaling::relay::SignalingRelay;
use crate::signaling::server_event::ServerEvent;
use crate::{sink_debug, sink_info, sink_warn};

/// Central server loop: the only writer of the registry during a run.
///
/// Events from one connection arrive in the order its reader produced them,
/// which keeps per-sender delivery FIFO.
pub fn run_server_loop(relay: SignalingRelay, log: Arc<dyn LogSink>, rx: Receiver<ServerEvent>) {
    use ServerEvent::*;

    let registry = Arc::clone(relay.registry());

    while let Ok(ev) = rx.recv() {
        match ev {
            Register {
                conn_id,
                identity,
                endpoint,
            } => {
                let ack = endpoint.clone();
                if let Some(old) = registry.register(identity.clone(), endpoint) {
                    sink_info!(
                        log,
                        "{} reconnected on conn {} (superseding conn {})",
                        identity,
                        conn_id,
                        old.conn_id
                    );
                } else {
                    sink_info!(
                        log,
                        "registered {} on conn {} (now {} online)",
                        identity,
                        conn_id,
                        registry.len()
                    );
                }
                if !ack.send(Msg::AuthOk { identity }) {
                    sink_warn!(log, "conn {} closed before AuthOk", conn_id);
                }
            }

            MsgFromClient { conn_id, msg } => {
                sink_debug!(log, "MsgFromClient from {}: {}", conn_id, msg.name());
                match msg {
                    Msg::Signal(env) => {
                        relay.relay(conn_id, env);
                    }
                    Msg::Ping { nonce } => {
                        if let Some(ep) = registry
                            .identity_for(conn_id)
                            .and_then(|id| registry.lookup(&id))
                        {
                            ep.send(Msg::Pong { nonce });
                        }
                    }
                    Msg::Pong { .. } => {}
                    other => {
                        sink_warn!(
                            log,
                            "ignoring unexpected {} from conn {}",
                            other.name(),
                            conn_id
                        );
                    }
                }
            }

            Disconnected { conn_id } => {
                match registry.unregister(conn_id) {
                    Some(identity) => {
                        sink_info!(log, "{} disconnected (conn {})", identity, conn_id);
                    }
                    None => {
                        sink_debug!(log, "conn {} closed (not current)", conn_id);
                    }
                }
            }

            Shutdown => {
                sink_info!(log, "shutdown requested ({} online)", registry.len());
                break;
            }
        }
    }

    registry.clear();
    sink_info!(log, "server loop stopped");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use crate::log::NoopLogSink;
    use crate::signaling::protocol::{EnvelopeKind, SignalingEnvelope};
    use crate::signaling::registry::{Endpoint, TransportRegistry};

    fn spawn_loop() -> (
        mpsc::Sender<ServerEvent>,
        Arc<TransportRegistry>,
        thread::JoinHandle<()>,
    ) {
        let (ev_tx, ev_rx) = mpsc::channel::<ServerEvent>();
        let registry = Arc::new(TransportRegistry::new());
        let relay = SignalingRelay::new(Arc::clone(&registry));
        let handle = thread::spawn(move || run_server_loop(relay, Arc::new(NoopLogSink), ev_rx));
        (ev_tx, registry, handle)
    }

    fn register(ev_tx: &mpsc::Sender<ServerEvent>, conn_id: u64, identity: &str) -> mpsc::Receiver<Msg> {
        let (tx, rx) = mpsc::channel();
        ev_tx
            .send(ServerEvent::Register {
                conn_id,
                identity: identity.into(),
                endpoint: Endpoint::new(conn_id, tx),
            })
            .unwrap();
        rx
    }

    #[test]
    fn register_acks_and_relays_in_order() {
        let (ev_tx, _registry, handle) = spawn_loop();
        let alice_rx = register(&ev_tx, 1, "alice");
        let bob_rx = register(&ev_tx, 2, "bob");

        let ack = alice_rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(ack, Msg::AuthOk { identity: "alice".into() });
        bob_rx.recv_timeout(Duration::from_millis(500)).unwrap();

        for i in 0..5u8 {
            ev_tx
                .send(ServerEvent::MsgFromClient {
                    conn_id: 2,
                    msg: Msg::Signal(SignalingEnvelope::outbound(
                        EnvelopeKind::IceCandidate,
                        "alice",
                        vec![i],
                    )),
                })
                .unwrap();
        }

        for i in 0..5u8 {
            match alice_rx.recv_timeout(Duration::from_millis(500)).unwrap() {
                Msg::Signal(env) => {
                    assert_eq!(env.from, "bob");
                    assert_eq!(env.payload, vec![i]);
                }
                other => panic!("expected Signal, got {other:?}"),
            }
        }

        ev_tx.send(ServerEvent::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn ping_gets_pong_and_disconnect_unregisters() {
        let (ev_tx, registry, handle) = spawn_loop();
        let rx = register(&ev_tx, 5, "carol");
        rx.recv_timeout(Duration::from_millis(500)).unwrap();

        ev_tx
            .send(ServerEvent::MsgFromClient {
                conn_id: 5,
                msg: Msg::Ping { nonce: 42 },
            })
            .unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(500)).unwrap(),
            Msg::Pong { nonce: 42 }
        );

        ev_tx.send(ServerEvent::Disconnected { conn_id: 5 }).unwrap();
        ev_tx.send(ServerEvent::Shutdown).unwrap();
        handle.join().unwrap();
        assert!(registry.lookup("carol").is_none());
    }

    #[test]
    fn shutdown_clears_registry() {
        let (ev_tx, registry, handle) = spawn_loop();
        let rx = register(&ev_tx, 1, "dave");
        rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(registry.len(), 1);

        ev_tx.send(ServerEvent::Shutdown).unwrap();
        handle.join().unwrap();
        assert!(registry.is_empty());
    }
}
