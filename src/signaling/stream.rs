use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Socket read timeout used while polling a shared TLS session.
///
/// Bounds how long the reader holds the session lock, so the writer thread
/// gets its turn.
const TLS_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Blocking duplex byte stream the connection threads can split in two.
pub trait FramedStream: Read + Write + Send + 'static {
    /// Second handle over the same connection (one for the reader thread, one
    /// for the writer thread).
    fn try_clone_stream(&self) -> io::Result<Self>
    where
        Self: Sized;

    /// Bounds the next reads; `None` blocks indefinitely.
    fn set_handshake_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Closes both directions, unblocking any thread parked in `read`.
    fn shutdown_stream(&self);
}

impl FramedStream for TcpStream {
    fn try_clone_stream(&self) -> io::Result<Self> {
        self.try_clone()
    }

    fn set_handshake_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)
    }

    fn shutdown_stream(&self) {
        let _ = self.shutdown(Shutdown::Both);
    }
}

/// A TLS session (`rustls::StreamOwned`) shared by a reader and a writer.
///
/// rustls keeps one state machine per connection, so both halves lock it. The
/// reader polls with a short socket timeout and releases the lock between
/// attempts; partially received records stay buffered inside the session.
pub struct SharedTlsStream<X> {
    session: Arc<Mutex<X>>,
    socket: TcpStream,
    deadline: Option<Instant>,
}

impl<X: Read + Write + Send + 'static> SharedTlsStream<X> {
    /// `socket` must be a clone of the socket owned by `session`.
    pub fn new(session: X, socket: TcpStream) -> io::Result<Self> {
        socket.set_read_timeout(Some(TLS_POLL_INTERVAL))?;
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            socket,
            deadline: None,
        })
    }

    /// Runs `op` on the session until it stops reporting `WouldBlock`.
    ///
    /// The lock is released between attempts. rustls keeps whatever it has
    /// already read or queued, so retrying is safe.
    fn with_session<T>(&self, mut op: impl FnMut(&mut X) -> io::Result<T>) -> io::Result<T> {
        loop {
            let attempt = {
                let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
                op(&mut session)
            };
            match attempt {
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    if self.deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
                    }
                    std::thread::yield_now();
                }
                other => return other,
            }
        }
    }
}

impl<X: Read + Write + Send + 'static> Read for SharedTlsStream<X> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.with_session(|s| s.read(buf))
    }
}

impl<X: Read + Write + Send + 'static> Write for SharedTlsStream<X> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_session(|s| s.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_session(|s| s.flush())
    }
}

impl<X: Read + Write + Send + 'static> FramedStream for SharedTlsStream<X> {
    fn try_clone_stream(&self) -> io::Result<Self> {
        Ok(Self {
            session: Arc::clone(&self.session),
            socket: self.socket.try_clone()?,
            deadline: None,
        })
    }

    fn set_handshake_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.deadline = timeout.map(|t| Instant::now() + t);
        Ok(())
    }

    fn shutdown_stream(&self) {
        let _ = self.socket.shutdown(Shutdown::Both);
    }
}
