pub mod auth;
pub mod errors;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod run;
pub mod runtime;
pub mod server_event;
pub mod server_settings;
pub mod signaling_server;
pub mod stream;
pub mod tls;
pub mod transport;
pub mod types;

pub use auth::{AllowAllVerifier, AuthError, FileCredentialStore, IdentityVerifier, InMemoryVerifier};
pub use registry::{Endpoint, TransportRegistry};
pub use relay::{RelayOutcome, SignalingRelay};
pub use server_settings::ServerSettings;
pub use signaling_server::{RunningServer, SignalingServer};
