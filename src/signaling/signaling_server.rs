use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rustls::{ServerConfig, ServerConnection, StreamOwned};

use crate::config::Config;
use crate::log::{LogSink, NoopLogSink};
use crate::signaling::auth::{AllowAllVerifier, FileCredentialStore, IdentityVerifier};
use crate::signaling::registry::TransportRegistry;
use crate::signaling::relay::SignalingRelay;
use crate::signaling::runtime::run_server_loop;
use crate::signaling::server_event::ServerEvent;
use crate::signaling::server_settings::ServerSettings;
use crate::signaling::stream::SharedTlsStream;
use crate::signaling::tls::build_signaling_server_config;
use crate::signaling::transport::{ConnectionContext, OpenConnections, spawn_connection_threads};
use crate::signaling::types::ConnId;
use crate::{sink_info, sink_warn};

/// Top-level runtime object for the signaling service.
///
/// This owns:
/// - listener settings
/// - logging sink
/// - identity verifier (e.g. FileCredentialStore)
/// - optional TLS config
///
/// and knows how to spin up the central server loop plus per-connection threads.
pub struct SignalingServer {
    settings: ServerSettings,
    log: Arc<dyn LogSink>,
    verifier: Arc<dyn IdentityVerifier>,
    tls: Option<Arc<ServerConfig>>,
}

impl SignalingServer {
    /// Construct a server with an arbitrary verifier (good for tests).
    pub fn with_verifier<V>(settings: ServerSettings, log: Arc<dyn LogSink>, verifier: V) -> Self
    where
        V: IdentityVerifier + 'static,
    {
        Self {
            settings,
            log,
            verifier: Arc::new(verifier),
            tls: None,
        }
    }

    /// Convenience: custom verifier + NoopLogSink.
    pub fn with_verifier_no_log<V>(settings: ServerSettings, verifier: V) -> Self
    where
        V: IdentityVerifier + 'static,
    {
        Self::with_verifier(settings, Arc::new(NoopLogSink), verifier)
    }

    /// Server configured from `[Signaling]`.
    ///
    /// Uses the credential file at `credentials_path` when set. Without one the
    /// server refuses to start unless `allow_any_identity` is set, in which
    /// case any non-empty identity is admitted. TLS is enabled when both
    /// certificate paths are set.
    pub fn from_settings(settings: ServerSettings, log: Arc<dyn LogSink>) -> io::Result<Self> {
        let verifier: Arc<dyn IdentityVerifier> = match &settings.credentials_path {
            Some(path) => {
                let store = FileCredentialStore::open(path)?;
                sink_info!(
                    log,
                    "using credential file at {:?} ({} identities)",
                    path,
                    store.len()
                );
                Arc::new(store)
            }
            None if settings.allow_any_identity => {
                sink_warn!(log, "allow_any_identity is set; accepting any identity");
                Arc::new(AllowAllVerifier)
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "no credentials_path configured; set allow_any_identity = true for development",
                ));
            }
        };
        let tls = build_signaling_server_config(&settings)?;

        Ok(Self {
            settings,
            log,
            verifier,
            tls,
        })
    }

    pub fn from_config(config: &Config, log: Arc<dyn LogSink>) -> io::Result<Self> {
        let settings = ServerSettings::from_config(config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        Self::from_settings(settings, log)
    }

    /// Serve TLS on every accepted connection.
    #[must_use]
    pub fn with_tls(mut self, tls: Arc<ServerConfig>) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Binds the listener and spawns the server loop and the accept thread.
    pub fn start(self) -> io::Result<RunningServer> {
        let Self {
            settings,
            log,
            verifier,
            tls,
        } = self;

        let listener = TcpListener::bind(&settings.bind_addr)?;
        let local_addr = listener.local_addr()?;

        let registry = Arc::new(TransportRegistry::new());
        let open = OpenConnections::default();

        // Events from all connections → central server loop
        let (server_tx, server_rx) = mpsc::channel::<ServerEvent>();

        // Central server loop in its own thread
        let loop_thread = {
            let log_for_loop = log.clone();
            let relay = SignalingRelay::with_log(Arc::clone(&registry), log.clone());
            thread::Builder::new()
                .name("signaling-loop".into())
                .spawn(move || {
                    sink_info!(log_for_loop, "[signaling] server loop started");
                    run_server_loop(relay, log_for_loop, server_rx);
                })?
        };

        let mode = if tls.is_some() { "tls" } else { "tcp" };
        let stop = Arc::new(AtomicBool::new(false));
        let ctx = ConnectionContext {
            server_tx: server_tx.clone(),
            verifier,
            auth_timeout: settings.auth_timeout,
            log: log.clone(),
            open: open.clone(),
        };

        let accept_thread = {
            let stop = Arc::clone(&stop);
            let log = log.clone();
            thread::Builder::new()
                .name("signaling-accept".into())
                .spawn(move || accept_loop(listener, ctx, tls, stop, log))?
        };

        sink_info!(
            log,
            "signaling server listening on {} ({})",
            local_addr,
            mode
        );

        Ok(RunningServer {
            local_addr,
            registry,
            open,
            stop,
            server_tx,
            accept_thread: Some(accept_thread),
            loop_thread: Some(loop_thread),
            log,
        })
    }

    /// Blocking: start, then serve until the listener fails.
    pub fn run(self) -> io::Result<()> {
        self.start()?.wait();
        Ok(())
    }
}

fn accept_loop(
    listener: TcpListener,
    ctx: ConnectionContext,
    tls: Option<Arc<ServerConfig>>,
    stop: Arc<AtomicBool>,
    log: Arc<dyn LogSink>,
) {
    let mut next_conn_id: ConnId = 1;

    for stream in listener.incoming() {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                sink_warn!(log, "incoming TCP accept failed: {:?} (continuing to accept)", e);
                continue;
            }
        };

        let conn_id = next_conn_id;
        next_conn_id += 1;
        sink_info!(log, "accepted connection as conn_id={}", conn_id);

        let spawned = match &tls {
            None => spawn_connection_threads(conn_id, stream, ctx.clone()),
            Some(cfg) => wrap_tls(Arc::clone(cfg), stream)
                .and_then(|s| spawn_connection_threads(conn_id, s, ctx.clone())),
        };
        if let Err(e) = spawned {
            sink_warn!(log, "failed to spawn connection threads for conn {}: {:?}", conn_id, e);
        }
    }
}

type ServerTlsStream = SharedTlsStream<StreamOwned<ServerConnection, TcpStream>>;

fn wrap_tls(cfg: Arc<ServerConfig>, sock: TcpStream) -> io::Result<ServerTlsStream> {
    let conn = ServerConnection::new(cfg)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("TLS setup: {e}")))?;
    let socket = sock.try_clone()?;
    SharedTlsStream::new(StreamOwned::new(conn, sock), socket)
}

/// Handle to a started server. Dropping it shuts the server down.
pub struct RunningServer {
    local_addr: SocketAddr,
    registry: Arc<TransportRegistry>,
    open: OpenConnections,
    stop: Arc<AtomicBool>,
    server_tx: Sender<ServerEvent>,
    accept_thread: Option<JoinHandle<()>>,
    loop_thread: Option<JoinHandle<()>>,
    log: Arc<dyn LogSink>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<TransportRegistry> {
        &self.registry
    }

    /// Blocks until the accept thread exits.
    pub fn wait(mut self) {
        if let Some(h) = self.accept_thread.take() {
            let _ = h.join();
        }
    }

    /// Stops accepting, closes every connection and stops the server loop.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        if self.stop.swap(true, Ordering::SeqCst) {
            return;
        }
        sink_info!(self.log, "shutting down signaling server on {}", self.local_addr);

        // Wake the blocking accept() so it sees the stop flag.
        let mut wake = self.local_addr;
        if wake.ip().is_unspecified() {
            wake.set_ip(match wake {
                SocketAddr::V4(_) => std::net::Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => std::net::Ipv6Addr::LOCALHOST.into(),
            });
        }
        let _ = TcpStream::connect(wake);
        if let Some(h) = self.accept_thread.take() {
            let _ = h.join();
        }

        self.open.close_all();
        let _ = self.server_tx.send(ServerEvent::Shutdown);
        if let Some(h) = self.loop_thread.take() {
            let _ = h.join();
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
