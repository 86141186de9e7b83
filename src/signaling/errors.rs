/// Codes carried by `Msg::AuthErr`.
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// First frame was not `Authenticate`, or none arrived in time.
    AuthenticationRequired = 1,
    InvalidCredentials = 2,
    Internal = 3,
}

impl AuthErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::AuthenticationRequired),
            2 => Some(Self::InvalidCredentials),
            3 => Some(Self::Internal),
            _ => None,
        }
    }
}

impl From<crate::signaling::auth::AuthError> for AuthErrorCode {
    fn from(e: crate::signaling::auth::AuthError) -> Self {
        match e {
            crate::signaling::auth::AuthError::InvalidCredentials => Self::InvalidCredentials,
            crate::signaling::auth::AuthError::Internal => Self::Internal,
        }
    }
}
