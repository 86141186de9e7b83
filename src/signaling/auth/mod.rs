mod auth_error;
mod file_credential_store;
mod identity_verifier;
mod in_memory_verifier;
pub use auth_error::AuthError;
pub use file_credential_store::FileCredentialStore;
pub use identity_verifier::IdentityVerifier;
pub use in_memory_verifier::{AllowAllVerifier, InMemoryVerifier};
