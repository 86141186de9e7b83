use std::collections::HashMap;

use crate::signaling::{
    auth::{AuthError, IdentityVerifier},
    protocol::ParticipantId,
};

/// Identity → secret table held in memory (tests, local demos).
#[derive(Debug, Default)]
pub struct InMemoryVerifier {
    secrets: HashMap<ParticipantId, String>,
}

impl InMemoryVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(
        mut self,
        identity: impl Into<ParticipantId>,
        secret: impl Into<String>,
    ) -> Self {
        self.secrets.insert(identity.into(), secret.into());
        self
    }
}

impl IdentityVerifier for InMemoryVerifier {
    fn verify(&self, identity: &str, secret: &str) -> Result<(), AuthError> {
        match self.secrets.get(identity) {
            Some(stored) if stored == secret => Ok(()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

/// Dev backend: any non-empty identity is accepted, the secret is ignored.
#[derive(Debug, Default)]
pub struct AllowAllVerifier;

impl IdentityVerifier for AllowAllVerifier {
    fn verify(&self, identity: &str, _secret: &str) -> Result<(), AuthError> {
        if identity.is_empty() {
            Err(AuthError::InvalidCredentials)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_checks_secret() {
        let v = InMemoryVerifier::new().with_identity("alice", "s3cret");
        assert_eq!(v.verify("alice", "s3cret"), Ok(()));
        assert_eq!(v.verify("alice", "nope"), Err(AuthError::InvalidCredentials));
        assert_eq!(v.verify("mallory", "s3cret"), Err(AuthError::InvalidCredentials));
    }

    #[test]
    fn allow_all_still_needs_an_identity() {
        assert_eq!(AllowAllVerifier.verify("bob", ""), Ok(()));
        assert_eq!(AllowAllVerifier.verify("", "x"), Err(AuthError::InvalidCredentials));
    }
}
