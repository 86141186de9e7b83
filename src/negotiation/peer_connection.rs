use crate::media::MediaTrack;
use crate::negotiation::{IceConfig, PeerConnectionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpType {
    Offer,
    Answer,
}

/// The platform media session for one remote peer (an `RTCPeerConnection`
/// in a browser).
///
/// Descriptions and candidates are opaque bytes; only the session state
/// machine decides when each call happens.
pub trait PeerConnection {
    fn add_local_tracks(&mut self, tracks: &[MediaTrack]) -> Result<(), PeerConnectionError>;
    fn create_offer(&mut self) -> Result<Vec<u8>, PeerConnectionError>;
    fn create_answer(&mut self) -> Result<Vec<u8>, PeerConnectionError>;
    fn set_local_description(&mut self, kind: SdpType, sdp: &[u8]) -> Result<(), PeerConnectionError>;
    fn set_remote_description(&mut self, kind: SdpType, sdp: &[u8]) -> Result<(), PeerConnectionError>;
    /// Drops the pending local offer.
    fn rollback(&mut self) -> Result<(), PeerConnectionError>;
    fn add_ice_candidate(&mut self, candidate: &[u8]) -> Result<(), PeerConnectionError>;
    /// Idempotent.
    fn close(&mut self);
}

/// Builds one [`PeerConnection`] per remote peer.
pub trait PeerConnectionFactory {
    fn create(
        &self,
        peer: &str,
        ice: &IceConfig,
    ) -> Result<Box<dyn PeerConnection>, PeerConnectionError>;
}
