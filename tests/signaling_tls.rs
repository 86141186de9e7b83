#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rustycall::log::NoopLogSink;
use rustycall::signaling::protocol::{EnvelopeKind, Msg, SignalingEnvelope};
use rustycall::signaling::tls::{build_signaling_client_config, build_signaling_server_config};
use rustycall::signaling::{InMemoryVerifier, RunningServer, ServerSettings, SignalingServer};
use rustycall::signaling_client::{SignalingClient, SignalingEvent};
use rustycall::tls_utils::SIGNALING_DOMAIN;

const WAIT: Duration = Duration::from_secs(3);

/// Self-signed certificate for `name`, written as `<tag>_cert.pem` and `<tag>_key.pem`.
fn write_self_signed(tag: &str, name: &str) -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("rustycall_tls_{}_{tag}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let certified = rcgen::generate_simple_self_signed(vec![name.to_owned()]).unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    std::fs::write(&cert_path, certified.cert.pem()).unwrap();
    std::fs::write(&key_path, certified.key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}

fn start_tls_server(cert_path: PathBuf, key_path: PathBuf) -> RunningServer {
    let settings = ServerSettings {
        tls_cert_path: Some(cert_path),
        tls_key_path: Some(key_path),
        ..ServerSettings::default()
    }
    .with_bind_addr("127.0.0.1:0")
    .with_auth_timeout(Duration::from_millis(500));
    let tls = build_signaling_server_config(&settings)
        .unwrap()
        .expect("both TLS paths are set");
    let verifier = InMemoryVerifier::new()
        .with_identity("alice", "a-secret")
        .with_identity("bob", "b-secret");
    SignalingServer::with_verifier_no_log(settings, verifier)
        .with_tls(tls)
        .start()
        .unwrap()
}

#[test]
fn envelope_is_relayed_over_tls() {
    let (cert, key) = write_self_signed("relay", SIGNALING_DOMAIN);
    let server = start_tls_server(cert.clone(), key);
    let tls = build_signaling_client_config(&cert).unwrap();

    let (alice, alice_events) = SignalingClient::connect_tls(
        server.local_addr(),
        SIGNALING_DOMAIN,
        tls.clone(),
        "alice",
        "a-secret",
        Arc::new(NoopLogSink),
    )
    .unwrap();
    let (_bob, bob_events) = SignalingClient::connect_tls(
        server.local_addr(),
        SIGNALING_DOMAIN,
        tls,
        "bob",
        "b-secret",
        Arc::new(NoopLogSink),
    )
    .unwrap();

    alice
        .send(Msg::Signal(SignalingEnvelope::outbound(
            EnvelopeKind::Offer,
            "bob",
            b"v=0 offer".to_vec(),
        )))
        .unwrap();

    match bob_events.recv_timeout(WAIT).unwrap() {
        SignalingEvent::Envelope(env) => {
            assert_eq!(env.from, "alice");
            assert_eq!(env.payload, b"v=0 offer");
        }
        other => panic!("expected an envelope, got {other:?}"),
    }
    let nonce = alice.ping().unwrap();
    assert_eq!(
        alice_events.recv_timeout(WAIT).unwrap(),
        SignalingEvent::Pong { nonce }
    );
}

#[test]
fn untrusted_server_certificate_is_refused() {
    let (cert, key) = write_self_signed("served", SIGNALING_DOMAIN);
    let (other_ca, _) = write_self_signed("other", SIGNALING_DOMAIN);
    let server = start_tls_server(cert, key);
    let tls = build_signaling_client_config(&other_ca).unwrap();

    let result = SignalingClient::connect_tls(
        server.local_addr(),
        SIGNALING_DOMAIN,
        tls,
        "alice",
        "a-secret",
        Arc::new(NoopLogSink),
    );
    assert!(result.is_err());
    assert!(server.registry().lookup("alice").is_none());
}
