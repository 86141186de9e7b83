use std::{fmt, io};

use crate::signaling::errors::AuthErrorCode;
use crate::signaling::protocol::FrameError;

/// Errors that can occur while connecting or sending signaling messages.
///
/// After the handshake, the only thing `send()` can reliably report is that
/// the signaling client is disconnected (i.e. the writer thread has exited and
/// dropped its command receiver).
#[derive(Debug)]
pub enum SignalingClientError {
    Io(io::Error),
    Frame(FrameError),
    /// The server answered `Authenticate` with `AuthErr { code }`.
    AuthRejected(u16),
    /// The server sent something other than `AuthOk` / `AuthErr`.
    Protocol(&'static str),
    Poisoned,
    Disconnected,
}

impl SignalingClientError {
    pub fn auth_code(&self) -> Option<AuthErrorCode> {
        match self {
            Self::AuthRejected(code) => AuthErrorCode::from_u16(*code),
            _ => None,
        }
    }
}

impl fmt::Display for SignalingClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Frame(e) => write!(f, "protocol error: {e}"),
            Self::AuthRejected(code) => match AuthErrorCode::from_u16(*code) {
                Some(c) => write!(f, "authentication rejected: {c:?}"),
                None => write!(f, "authentication rejected (code {code})"),
            },
            Self::Protocol(what) => write!(f, "unexpected handshake reply: {what}"),
            Self::Poisoned => write!(f, "stream lock poisoned"),
            Self::Disconnected => write!(f, "signaling client disconnected"),
        }
    }
}

impl std::error::Error for SignalingClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SignalingClientError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FrameError> for SignalingClientError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}
