//! Multi-party calls: one [`NegotiationSession`](crate::negotiation::NegotiationSession)
//! per remote member, sharing a single local capture.

pub mod call_board;
pub mod call_error;
pub mod call_handle;
pub mod call_membership;
pub mod call_orchestrator;
pub mod call_recorder;
pub mod call_status;
pub mod session_events;

pub use call_error::CallError;
pub use call_handle::CallHandle;
pub use call_membership::CallMembership;
pub use call_orchestrator::CallOrchestrator;
pub use call_recorder::{CallRecord, CallRecorder, InMemoryCallRecorder, NoopCallRecorder};
pub use call_status::CallStatus;
pub use session_events::SessionEvents;

pub type CallId = u64;
