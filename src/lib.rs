//! rustycall: the signaling core of a browser-to-browser calling service.
//!
//! It provides one binary:
//! - `signaling_server`: authenticates clients and relays offers, answers and
//!   ICE candidates between them.
//!
//! and the client-side pieces a calling application links against: the
//! signaling client, the per-peer negotiation state machine and the call
//! orchestrator that drives one session per remote participant.

/// Multi-party calls over per-peer negotiation sessions.
pub mod call;
/// Handles configuration loading and management.
pub mod config;
/// Logging utilities for the application.
pub mod log;
/// Local capture contract and shared media tracks.
pub mod media;
/// Offer/answer and ICE negotiation with a single remote peer.
pub mod negotiation;
/// Signaling server: identity registry and envelope relay.
pub mod signaling;
/// Signaling client for communicating with the signaling server.
pub mod signaling_client;
/// TLS (Transport Layer Security) utility functions.
pub mod tls_utils;
pub mod utils;
