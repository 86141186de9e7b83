use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Neither audio nor video was requested.
    NothingRequested,
    PermissionDenied,
    DeviceUnavailable(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::NothingRequested => write!(f, "no audio or video requested"),
            MediaError::PermissionDenied => write!(f, "capture permission denied"),
            MediaError::DeviceUnavailable(what) => write!(f, "capture device unavailable: {what}"),
        }
    }
}

impl std::error::Error for MediaError {}
