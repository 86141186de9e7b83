use crate::signaling::auth::AuthError;

/// Contract with the external authentication/session service.
///
/// Called once per connection, before the connection is registered. On
/// `Ok(())` the presented identity becomes the connection's authenticated
/// identity for its whole lifetime.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, identity: &str, secret: &str) -> Result<(), AuthError>;
}
