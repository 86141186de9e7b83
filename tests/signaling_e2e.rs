#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use rustycall::log::NoopLogSink;
use rustycall::signaling::protocol::{EnvelopeKind, MAX_BODY_LEN, Msg, SignalingEnvelope};
use rustycall::signaling::{InMemoryVerifier, RunningServer, ServerSettings, SignalingServer};
use rustycall::signaling_client::{SignalingClient, SignalingClientError, SignalingEvent};

const WAIT: Duration = Duration::from_secs(3);

fn start_server() -> RunningServer {
    let verifier = InMemoryVerifier::new()
        .with_identity("alice", "a-secret")
        .with_identity("bob", "b-secret");
    let settings = ServerSettings::default()
        .with_bind_addr("127.0.0.1:0")
        .with_auth_timeout(Duration::from_millis(500));
    SignalingServer::with_verifier_no_log(settings, verifier)
        .start()
        .unwrap()
}

fn connect(addr: SocketAddr, identity: &str, secret: &str) -> (SignalingClient, Receiver<SignalingEvent>) {
    SignalingClient::connect_tcp(addr, identity, secret, Arc::new(NoopLogSink)).unwrap()
}

fn next_envelope(events: &Receiver<SignalingEvent>) -> SignalingEnvelope {
    match events.recv_timeout(WAIT).unwrap() {
        SignalingEvent::Envelope(env) => env,
        other => panic!("expected an envelope, got {other:?}"),
    }
}

/// `[ver][type][flags][len][body]`, written by hand.
fn write_raw_frame(sock: &mut TcpStream, msg_type: u8, body: &[u8]) {
    let mut frame = Vec::new();
    frame.write_u8(1).unwrap();
    frame.write_u8(msg_type).unwrap();
    frame.write_u16::<BigEndian>(0).unwrap();
    frame.write_u32::<BigEndian>(body.len() as u32).unwrap();
    frame.extend_from_slice(body);
    sock.write_all(&frame).unwrap();
}

fn read_raw_frame(sock: &mut TcpStream) -> (u8, Vec<u8>) {
    let version = sock.read_u8().unwrap();
    assert_eq!(version, 1);
    let msg_type = sock.read_u8().unwrap();
    let _flags = sock.read_u16::<BigEndian>().unwrap();
    let len = sock.read_u32::<BigEndian>().unwrap() as usize;
    let mut body = vec![0u8; len];
    sock.read_exact(&mut body).unwrap();
    (msg_type, body)
}

#[test]
fn first_frame_must_authenticate() {
    let server = start_server();
    let mut sock = TcpStream::connect(server.local_addr()).unwrap();
    sock.set_read_timeout(Some(WAIT)).unwrap();

    let mut ping = Vec::new();
    ping.write_u64::<BigEndian>(42).unwrap();
    write_raw_frame(&mut sock, 0x30, &ping);

    let (msg_type, body) = read_raw_frame(&mut sock);
    assert_eq!(msg_type, 0x03);
    assert_eq!((&body[..]).read_u16::<BigEndian>().unwrap(), 1);

    let mut rest = [0u8; 1];
    assert_eq!(sock.read(&mut rest).unwrap_or(0), 0);
    assert!(server.registry().is_empty());
}

#[test]
fn wrong_secret_is_rejected() {
    let server = start_server();
    let err = SignalingClient::connect_tcp(server.local_addr(), "alice", "nope", Arc::new(NoopLogSink))
        .err()
        .expect("bad secret must be refused");
    assert!(matches!(err, SignalingClientError::AuthRejected(2)));
    assert!(server.registry().lookup("alice").is_none());
}

#[test]
fn offer_is_relayed_with_sender_stamped() {
    let server = start_server();
    let (alice, _alice_events) = connect(server.local_addr(), "alice", "a-secret");
    let (_bob, bob_events) = connect(server.local_addr(), "bob", "b-secret");

    alice
        .send(Msg::Signal(SignalingEnvelope {
            kind: EnvelopeKind::Offer,
            from: "mallory".into(),
            to: "bob".into(),
            payload: b"v=0 offer".to_vec(),
        }))
        .unwrap();

    let env = next_envelope(&bob_events);
    assert_eq!(env.kind, EnvelopeKind::Offer);
    assert_eq!(env.from, "alice");
    assert_eq!(env.to, "bob");
    assert_eq!(env.payload, b"v=0 offer");
}

#[test]
fn envelopes_keep_their_order() {
    let server = start_server();
    let (alice, _alice_events) = connect(server.local_addr(), "alice", "a-secret");
    let (_bob, bob_events) = connect(server.local_addr(), "bob", "b-secret");

    for i in 0..20u8 {
        alice
            .send(Msg::Signal(SignalingEnvelope::outbound(
                EnvelopeKind::IceCandidate,
                "bob",
                vec![i],
            )))
            .unwrap();
    }
    for i in 0..20u8 {
        assert_eq!(next_envelope(&bob_events).payload, vec![i]);
    }
}

#[test]
fn unknown_target_is_dropped_silently() {
    let server = start_server();
    let (alice, alice_events) = connect(server.local_addr(), "alice", "a-secret");

    alice
        .send(Msg::Signal(SignalingEnvelope::outbound(
            EnvelopeKind::Offer,
            "carol",
            b"offer".to_vec(),
        )))
        .unwrap();

    let nonce = alice.ping().unwrap();
    assert_eq!(
        alice_events.recv_timeout(WAIT).unwrap(),
        SignalingEvent::Pong { nonce }
    );
}

#[test]
fn envelope_too_large_after_stamping_does_not_drop_target() {
    let server = start_server();
    let (_alice, alice_events) = connect(server.local_addr(), "alice", "a-secret");
    let (bob, _bob_events) = connect(server.local_addr(), "bob", "b-secret");

    // Fits the limit as sent, exceeds it once "bob" is stamped into `from`.
    let payload = vec![0u8; MAX_BODY_LEN - 2 - 2 - "alice".len() - 4];
    bob.send(Msg::Signal(SignalingEnvelope::outbound(
        EnvelopeKind::Offer,
        "alice",
        payload,
    )))
    .unwrap();
    bob.send(Msg::Signal(SignalingEnvelope::outbound(
        EnvelopeKind::IceCandidate,
        "alice",
        b"candidate:1".to_vec(),
    )))
    .unwrap();

    let env = next_envelope(&alice_events);
    assert_eq!(env.kind, EnvelopeKind::IceCandidate);
    assert_eq!(env.from, "bob");
    assert!(server.registry().lookup("alice").is_some());
}

#[test]
fn reconnect_supersedes_older_endpoint() {
    let server = start_server();
    let (alice, _alice_events) = connect(server.local_addr(), "alice", "a-secret");
    let (_bob_old, bob_old_events) = connect(server.local_addr(), "bob", "b-secret");
    let first_conn = server.registry().lookup("bob").unwrap().conn_id;

    let (_bob_new, bob_new_events) = connect(server.local_addr(), "bob", "b-secret");
    assert_ne!(server.registry().lookup("bob").unwrap().conn_id, first_conn);

    alice
        .send(Msg::Signal(SignalingEnvelope::outbound(
            EnvelopeKind::Answer,
            "bob",
            b"answer".to_vec(),
        )))
        .unwrap();

    assert_eq!(next_envelope(&bob_new_events).from, "alice");
    assert!(bob_old_events.recv_timeout(Duration::from_millis(300)).is_err());
}

#[test]
fn disconnect_unregisters() {
    let server = start_server();
    let (bob, bob_events) = connect(server.local_addr(), "bob", "b-secret");
    assert!(server.registry().lookup("bob").is_some());

    bob.disconnect();
    assert_eq!(bob_events.recv_timeout(WAIT).unwrap(), SignalingEvent::Disconnected);

    let mut waited = Duration::ZERO;
    while server.registry().lookup("bob").is_some() && waited < WAIT {
        std::thread::sleep(Duration::from_millis(20));
        waited += Duration::from_millis(20);
    }
    assert!(server.registry().lookup("bob").is_none());
}

#[test]
fn shutdown_disconnects_clients() {
    let mut server = start_server();
    let (_alice, alice_events) = connect(server.local_addr(), "alice", "a-secret");

    server.shutdown();
    assert_eq!(
        alice_events.recv_timeout(WAIT).unwrap(),
        SignalingEvent::Disconnected
    );
    assert!(server.registry().is_empty());
}
