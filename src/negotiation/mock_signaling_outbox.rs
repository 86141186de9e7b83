use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::negotiation::SignalingOutbox;
use crate::signaling::protocol::{EnvelopeKind, SignalingEnvelope};
use crate::signaling_client::SignalingClientError;

/// Outbox that keeps what it was asked to send; clones share the queue.
#[derive(Debug, Clone, Default)]
pub struct MockSignalingOutbox {
    sent: Arc<Mutex<Vec<SignalingEnvelope>>>,
    disconnected: Arc<AtomicBool>,
}

impl MockSignalingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything sent so far, oldest first.
    pub fn take(&self) -> Vec<SignalingEnvelope> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Makes every later send fail as if the signaling link dropped.
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}

impl SignalingOutbox for MockSignalingOutbox {
    fn send_envelope(
        &self,
        kind: EnvelopeKind,
        to: &str,
        payload: Vec<u8>,
    ) -> Result<(), SignalingClientError> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(SignalingClientError::Disconnected);
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SignalingEnvelope::outbound(kind, to, payload));
        Ok(())
    }
}
