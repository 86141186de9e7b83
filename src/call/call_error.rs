use std::fmt;

use crate::media::MediaError;
use crate::negotiation::PeerConnectionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    NoActiveCall,
    AlreadyInCall,
    MediaAcquisition(MediaError),
    PeerConnection(PeerConnectionError),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveCall => write!(f, "no call in progress"),
            Self::AlreadyInCall => write!(f, "a call is already in progress"),
            Self::MediaAcquisition(e) => write!(f, "could not acquire local media: {e}"),
            Self::PeerConnection(e) => write!(f, "could not create peer connection: {e}"),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MediaAcquisition(e) => Some(e),
            Self::PeerConnection(e) => Some(e),
            Self::NoActiveCall | Self::AlreadyInCall => None,
        }
    }
}

impl From<MediaError> for CallError {
    fn from(e: MediaError) -> Self {
        Self::MediaAcquisition(e)
    }
}

impl From<PeerConnectionError> for CallError {
    fn from(e: PeerConnectionError) -> Self {
        Self::PeerConnection(e)
    }
}
