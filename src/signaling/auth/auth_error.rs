use std::fmt;

/// Verdict of an [`IdentityVerifier`](super::IdentityVerifier) that did not
/// accept a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    Internal,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Internal => write!(f, "identity service failure"),
        }
    }
}

impl std::error::Error for AuthError {}
