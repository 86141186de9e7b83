use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use rand::RngCore;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, StreamOwned};

use crate::log::LogSink;
use crate::negotiation::SignalingOutbox;
use crate::signaling::protocol::{
    EnvelopeKind, FrameError, Msg, ParticipantId, SignalingEnvelope, read_msg, write_msg,
};
use crate::signaling::stream::{FramedStream, SharedTlsStream};
use crate::signaling_client::{
    SignalingClientError, SignalingEvent, signaling_command::SignalingCommand,
};
use crate::{sink_debug, sink_info, sink_warn};

/// How long the server may take to answer `Authenticate`.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Authenticated connection to the signaling server.
///
/// Owns a writer thread (commands → socket) and a reader thread (socket →
/// [`SignalingEvent`]). Dropping the client closes the connection.
pub struct SignalingClient {
    identity: ParticipantId,
    cmd_tx: Sender<SignalingCommand>,
}

impl SignalingClient {
    /// Plain TCP connection, authenticated as `identity`.
    pub fn connect_tcp<A: ToSocketAddrs>(
        addr: A,
        identity: &str,
        secret: &str,
        log: Arc<dyn LogSink>,
    ) -> Result<(Self, Receiver<SignalingEvent>), SignalingClientError> {
        let stream = TcpStream::connect(addr)?;
        let _ = stream.set_nodelay(true);
        Self::connect_over(stream, identity, secret, log)
    }

    /// TLS connection checked against `tls` (see
    /// `signaling::tls::build_signaling_client_config`).
    pub fn connect_tls<A: ToSocketAddrs>(
        addr: A,
        server_name: &str,
        tls: Arc<ClientConfig>,
        identity: &str,
        secret: &str,
        log: Arc<dyn LogSink>,
    ) -> Result<(Self, Receiver<SignalingEvent>), SignalingClientError> {
        let name = ServerName::try_from(server_name.to_owned())
            .map_err(|_| SignalingClientError::Protocol("invalid TLS server name"))?;
        let conn = ClientConnection::new(tls, name).map_err(|e| {
            SignalingClientError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("TLS setup: {e}"),
            ))
        })?;

        let sock = TcpStream::connect(addr)?;
        let _ = sock.set_nodelay(true);
        let socket = sock.try_clone()?;
        let stream = SharedTlsStream::new(StreamOwned::new(conn, sock), socket)?;
        Self::connect_over(stream, identity, secret, log)
    }

    /// Runs the auth handshake on `stream`, then spawns the I/O threads.
    pub fn connect_over<S: FramedStream>(
        mut stream: S,
        identity: &str,
        secret: &str,
        log: Arc<dyn LogSink>,
    ) -> Result<(Self, Receiver<SignalingEvent>), SignalingClientError> {
        write_msg(
            &mut stream,
            &Msg::Authenticate {
                identity: identity.to_owned(),
                secret: secret.to_owned(),
            },
        )?;

        stream.set_handshake_timeout(Some(HANDSHAKE_TIMEOUT))?;
        let identity = match read_msg(&mut stream)? {
            Msg::AuthOk { identity } => identity,
            Msg::AuthErr { code } => {
                stream.shutdown_stream();
                return Err(SignalingClientError::AuthRejected(code));
            }
            _ => {
                stream.shutdown_stream();
                return Err(SignalingClientError::Protocol("expected AuthOk or AuthErr"));
            }
        };
        stream.set_handshake_timeout(None)?;
        sink_info!(log, "[signaling] authenticated as {}", identity);

        let (cmd_tx, cmd_rx) = mpsc::channel::<SignalingCommand>();
        let (event_tx, event_rx) = mpsc::channel::<SignalingEvent>();
        let read_stream = stream.try_clone_stream()?;

        // WRITER THREAD: commands -> socket
        {
            let log = log.clone();
            thread::Builder::new()
                .name("signaling-client-writer".into())
                .spawn(move || run_writer(stream, cmd_rx, log))?;
        }

        // READER THREAD: socket -> SignalingEvent
        thread::Builder::new()
            .name("signaling-client-reader".into())
            .spawn(move || run_reader(read_stream, event_tx, log))?;

        Ok((Self { identity, cmd_tx }, event_rx))
    }

    /// Identity confirmed by the server's `AuthOk`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn send(&self, msg: Msg) -> Result<(), SignalingClientError> {
        self.cmd_tx
            .send(SignalingCommand::Send(msg))
            .map_err(|_| SignalingClientError::Disconnected)
    }

    /// Sends a keepalive; the reply arrives as `SignalingEvent::Pong`.
    pub fn ping(&self) -> Result<u64, SignalingClientError> {
        let nonce = rand::thread_rng().next_u64();
        self.send(Msg::Ping { nonce })?;
        Ok(nonce)
    }

    /// Closes the connection; the event receiver then yields `Disconnected`.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(SignalingCommand::Disconnect);
    }
}

impl SignalingOutbox for SignalingClient {
    fn send_envelope(
        &self,
        kind: EnvelopeKind,
        to: &str,
        payload: Vec<u8>,
    ) -> Result<(), SignalingClientError> {
        self.send(Msg::Signal(SignalingEnvelope::outbound(kind, to, payload)))
    }
}

fn run_writer<S: FramedStream>(
    mut stream: S,
    cmd_rx: Receiver<SignalingCommand>,
    log: Arc<dyn LogSink>,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            SignalingCommand::Send(msg) => match write_msg(&mut stream, &msg) {
                Ok(()) => {}
                Err(FrameError::Proto(e)) => {
                    sink_warn!(log, "[signaling] not sending {}: {}", msg.name(), e);
                }
                Err(e) => {
                    sink_warn!(log, "[signaling] error sending {}: {}", msg.name(), e);
                    break;
                }
            },
            SignalingCommand::Disconnect => {
                sink_debug!(log, "[signaling] disconnect requested");
                break;
            }
        }
    }
    stream.shutdown_stream();
}

fn run_reader<S: FramedStream>(
    mut stream: S,
    event_tx: Sender<SignalingEvent>,
    log: Arc<dyn LogSink>,
) {
    loop {
        let event = match read_msg(&mut stream) {
            Ok(Msg::Signal(env)) => SignalingEvent::Envelope(env),
            Ok(Msg::Pong { nonce }) => SignalingEvent::Pong { nonce },
            Ok(other) => {
                sink_warn!(log, "[signaling] ignoring unexpected {}", other.name());
                continue;
            }
            Err(FrameError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                sink_info!(log, "[signaling] server closed the connection");
                break;
            }
            Err(e) => {
                sink_warn!(log, "[signaling] reader stopped: {}", e);
                break;
            }
        };
        if event_tx.send(event).is_err() {
            break;
        }
    }
    stream.shutdown_stream();
    let _ = event_tx.send(SignalingEvent::Disconnected);
}
