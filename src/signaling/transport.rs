use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::log::LogSink;
use crate::signaling::auth::IdentityVerifier;
use crate::signaling::errors::AuthErrorCode;
use crate::signaling::protocol::{FrameError, Msg, ParticipantId};
use crate::signaling::protocol::{read_msg as proto_read_msg, write_msg as proto_write_msg};
use crate::signaling::registry::Endpoint;
use crate::signaling::server_event::ServerEvent;
use crate::signaling::stream::FramedStream;
use crate::signaling::types::ConnId;
use crate::{sink_debug, sink_info, sink_warn};

/// Thin wrapper over a blocking stream that speaks in `Msg`.
pub struct Connection<S> {
    pub conn_id: ConnId,
    stream: S,
}

impl<S: FramedStream> Connection<S> {
    pub fn new(conn_id: ConnId, stream: S) -> Self {
        Self { conn_id, stream }
    }

    pub fn recv(&mut self) -> Result<Msg, FrameError> {
        proto_read_msg(&mut self.stream)
    }

    pub fn send(&mut self, msg: &Msg) -> Result<(), FrameError> {
        proto_write_msg(&mut self.stream, msg)
    }

    fn close(&self) {
        self.stream.shutdown_stream();
    }
}

type Closer = Box<dyn Fn() + Send>;

/// Shutdown hooks for every connection still open, so the server can close
/// them on shutdown.
#[derive(Clone, Default)]
pub struct OpenConnections {
    inner: Arc<Mutex<HashMap<ConnId, Closer>>>,
}

impl OpenConnections {
    fn insert(&self, conn_id: ConnId, closer: Closer) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conn_id, closer);
    }

    fn remove(&self, conn_id: ConnId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&conn_id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn close_all(&self) {
        let closers: Vec<Closer> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, c)| c)
            .collect();
        for close in closers {
            close();
        }
    }
}

/// Everything a connection's threads share with the rest of the server.
#[derive(Clone)]
pub struct ConnectionContext {
    pub server_tx: Sender<ServerEvent>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub auth_timeout: Duration,
    pub log: Arc<dyn LogSink>,
    pub open: OpenConnections,
}

/// Spawns the threads serving one accepted connection.
///
/// The first thread runs the auth handshake and then becomes the reader
/// (socket → `ServerEvent::MsgFromClient`). Only once an identity is verified
/// does it start the writer (`Endpoint` queue → socket) and register with the
/// server loop.
pub fn spawn_connection_threads<S: FramedStream>(
    conn_id: ConnId,
    stream: S,
    ctx: ConnectionContext,
) -> io::Result<()> {
    let closer_stream = stream.try_clone_stream()?;
    ctx.open
        .insert(conn_id, Box::new(move || closer_stream.shutdown_stream()));

    let open = ctx.open.clone();
    let spawned = thread::Builder::new()
        .name(format!("conn-{conn_id}-reader"))
        .spawn(move || {
            let open = ctx.open.clone();
            serve_connection(conn_id, stream, ctx);
            open.remove(conn_id);
        });

    if let Err(e) = spawned {
        open.remove(conn_id);
        return Err(e);
    }
    Ok(())
}

fn serve_connection<S: FramedStream>(conn_id: ConnId, stream: S, ctx: ConnectionContext) {
    let log = ctx.log.clone();
    let mut conn = Connection::new(conn_id, stream);

    let Some(identity) = authenticate(&mut conn, &ctx) else {
        conn.close();
        return;
    };

    let write_stream = match conn.stream.try_clone_stream() {
        Ok(s) => s,
        Err(e) => {
            sink_warn!(log, "[conn {}] could not split stream: {}", conn_id, e);
            conn.close();
            return;
        }
    };

    let (to_client_tx, to_client_rx) = mpsc::channel::<Msg>();
    // Held for the reader's lifetime: a superseded connection stays open
    // until its own socket closes.
    let _keep_writer = to_client_tx.clone();

    // WRITER THREAD: endpoint queue -> socket
    {
        let server_tx = ctx.server_tx.clone();
        let writer_log = log.clone();
        let spawned = thread::Builder::new()
            .name(format!("conn-{conn_id}-writer"))
            .spawn(move || {
                let mut conn = Connection::new(conn_id, write_stream);
                while let Ok(msg) = to_client_rx.recv() {
                    match conn.send(&msg) {
                        Ok(()) => {}
                        // Nothing was written; the socket is still usable.
                        Err(FrameError::Proto(e)) => {
                            sink_warn!(
                                writer_log,
                                "[conn {}] skipping unencodable {}: {}",
                                conn_id,
                                msg.name(),
                                e
                            );
                        }
                        Err(e) => {
                            sink_warn!(
                                writer_log,
                                "[conn {}] error sending {}: {}",
                                conn_id,
                                msg.name(),
                                e
                            );
                            let _ = server_tx.send(ServerEvent::Disconnected { conn_id });
                            break;
                        }
                    }
                }
                conn.close();
            });
        if let Err(e) = spawned {
            sink_warn!(log, "[conn {}] could not spawn writer: {}", conn_id, e);
            conn.close();
            return;
        }
    }

    let registered = ctx.server_tx.send(ServerEvent::Register {
        conn_id,
        identity,
        endpoint: Endpoint::new(conn_id, to_client_tx),
    });
    if registered.is_err() {
        conn.close();
        return;
    }

    // READER: socket -> ServerEvent::MsgFromClient
    loop {
        match conn.recv() {
            Ok(msg) => {
                if ctx
                    .server_tx
                    .send(ServerEvent::MsgFromClient { conn_id, msg })
                    .is_err()
                {
                    break;
                }
            }
            Err(FrameError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                sink_debug!(log, "[conn {}] closed by peer", conn_id);
                break;
            }
            Err(e) => {
                sink_info!(log, "[conn {}] reader stopped: {}", conn_id, e);
                break;
            }
        }
    }

    let _ = ctx.server_tx.send(ServerEvent::Disconnected { conn_id });
    conn.close();
}

/// Reads the first frame and checks it against the verifier.
///
/// Any rejection is answered with `AuthErr` before the caller closes.
fn authenticate<S: FramedStream>(
    conn: &mut Connection<S>,
    ctx: &ConnectionContext,
) -> Option<ParticipantId> {
    let conn_id = conn.conn_id;
    let log = &ctx.log;

    if let Err(e) = conn.stream.set_handshake_timeout(Some(ctx.auth_timeout)) {
        sink_warn!(log, "[conn {}] cannot arm auth timeout: {}", conn_id, e);
        return None;
    }

    let verdict = match conn.recv() {
        Ok(Msg::Authenticate { identity, secret }) => {
            match ctx.verifier.verify(&identity, &secret) {
                Ok(()) => Ok(identity),
                Err(e) => {
                    sink_info!(log, "[conn {}] rejected {}: {}", conn_id, identity, e);
                    Err(AuthErrorCode::from(e))
                }
            }
        }
        Ok(other) => {
            sink_info!(
                log,
                "[conn {}] {} before Authenticate, closing",
                conn_id,
                other.name()
            );
            Err(AuthErrorCode::AuthenticationRequired)
        }
        Err(FrameError::Io(e))
            if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
        {
            sink_info!(log, "[conn {}] no Authenticate within timeout", conn_id);
            Err(AuthErrorCode::AuthenticationRequired)
        }
        Err(e) => {
            sink_debug!(log, "[conn {}] handshake failed: {}", conn_id, e);
            return None;
        }
    };

    match verdict {
        Ok(identity) => {
            if let Err(e) = conn.stream.set_handshake_timeout(None) {
                sink_warn!(log, "[conn {}] cannot clear auth timeout: {}", conn_id, e);
                return None;
            }
            Some(identity)
        }
        Err(code) => {
            let _ = conn.send(&Msg::AuthErr {
                code: code.as_u16(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use crate::signaling::auth::InMemoryVerifier;
    use std::net::{TcpListener, TcpStream};

    fn ctx(server_tx: Sender<ServerEvent>, auth_timeout: Duration) -> ConnectionContext {
        ConnectionContext {
            server_tx,
            verifier: Arc::new(InMemoryVerifier::new().with_identity("alice", "pw")),
            auth_timeout,
            log: Arc::new(NoopLogSink),
            open: OpenConnections::default(),
        }
    }

    fn accept_one(ctx: ConnectionContext) -> TcpStream {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        spawn_connection_threads(1, server_side, ctx).unwrap();
        client
    }

    #[test]
    fn valid_credentials_register_the_connection() {
        let (tx, rx) = mpsc::channel();
        let mut client = accept_one(ctx(tx, Duration::from_secs(2)));
        proto_write_msg(
            &mut client,
            &Msg::Authenticate {
                identity: "alice".into(),
                secret: "pw".into(),
            },
        )
        .unwrap();

        match rx.recv_timeout(Duration::from_secs(2)).unwrap() {
            ServerEvent::Register {
                conn_id, identity, ..
            } => {
                assert_eq!(conn_id, 1);
                assert_eq!(identity, "alice");
            }
            _ => panic!("expected Register"),
        }
    }

    #[test]
    fn bad_secret_gets_auth_err() {
        let (tx, rx) = mpsc::channel();
        let mut client = accept_one(ctx(tx, Duration::from_secs(2)));
        proto_write_msg(
            &mut client,
            &Msg::Authenticate {
                identity: "alice".into(),
                secret: "wrong".into(),
            },
        )
        .unwrap();

        let reply = proto_read_msg(&mut client).unwrap();
        assert_eq!(
            reply,
            Msg::AuthErr {
                code: AuthErrorCode::InvalidCredentials.as_u16()
            }
        );
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn signaling_before_auth_is_refused() {
        let (tx, rx) = mpsc::channel();
        let mut client = accept_one(ctx(tx, Duration::from_secs(2)));
        proto_write_msg(&mut client, &Msg::Ping { nonce: 1 }).unwrap();

        let reply = proto_read_msg(&mut client).unwrap();
        assert_eq!(
            reply,
            Msg::AuthErr {
                code: AuthErrorCode::AuthenticationRequired.as_u16()
            }
        );
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn silent_client_times_out() {
        let (tx, _rx) = mpsc::channel();
        let mut client = accept_one(ctx(tx, Duration::from_millis(100)));

        let reply = proto_read_msg(&mut client).unwrap();
        assert_eq!(
            reply,
            Msg::AuthErr {
                code: AuthErrorCode::AuthenticationRequired.as_u16()
            }
        );
    }
}
