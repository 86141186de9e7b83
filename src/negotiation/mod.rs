//! Client-side negotiation: one [`NegotiationSession`] per remote peer drives
//! a [`PeerConnection`] from idle to connected using relayed envelopes.

pub mod failure_reason;
pub mod mock_peer_connection;
pub mod mock_signaling_outbox;
pub mod negotiation_config;
pub mod negotiation_error;
pub mod negotiation_session;
pub mod negotiation_state;
pub mod peer_connection;
pub mod peer_connection_error;
pub mod session_event;
pub mod signaling_outbox;
pub mod transport_state;

pub use failure_reason::FailureReason;
pub use mock_peer_connection::{MockPeerConnection, MockPeerConnectionFactory, PcCall};
pub use mock_signaling_outbox::MockSignalingOutbox;
pub use negotiation_config::{IceConfig, NegotiationConfig};
pub use negotiation_error::NegotiationError;
pub use negotiation_session::{NegotiationSession, SessionContext};
pub use negotiation_state::{NegotiationRole, NegotiationState};
pub use peer_connection::{PeerConnection, PeerConnectionFactory, SdpType};
pub use peer_connection_error::PeerConnectionError;
pub use session_event::{NoopSessionObserver, SessionEvent, SessionObserver};
pub use signaling_outbox::SignalingOutbox;
pub use transport_state::TransportState;
