use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::call::CallId;
use crate::signaling::protocol::ParticipantId;

/// One call as seen by the local participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub call_id: CallId,
    pub participants: Vec<ParticipantId>,
    pub started_at_ms: u128,
    pub ended_at_ms: Option<u128>,
}

impl CallRecord {
    pub fn is_active(&self) -> bool {
        self.ended_at_ms.is_none()
    }
}

/// Call history sink.
pub trait CallRecorder {
    fn call_started(&self, record: &CallRecord);
    fn participant_joined(&self, call_id: CallId, peer: &str);
    fn call_ended(&self, call_id: CallId, ended_at_ms: u128);
}

#[derive(Debug, Default)]
pub struct NoopCallRecorder;

impl CallRecorder for NoopCallRecorder {
    fn call_started(&self, _record: &CallRecord) {}
    fn participant_joined(&self, _call_id: CallId, _peer: &str) {}
    fn call_ended(&self, _call_id: CallId, _ended_at_ms: u128) {}
}

/// Keeps every record in memory. Clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCallRecorder {
    records: Arc<Mutex<Vec<CallRecord>>>,
}

impl InMemoryCallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CallRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.lock().clone()
    }
}

impl CallRecorder for InMemoryCallRecorder {
    fn call_started(&self, record: &CallRecord) {
        self.lock().push(record.clone());
    }

    fn participant_joined(&self, call_id: CallId, peer: &str) {
        if let Some(record) = self.lock().iter_mut().find(|r| r.call_id == call_id) {
            if !record.participants.iter().any(|p| p == peer) {
                record.participants.push(peer.to_owned());
            }
        }
    }

    fn call_ended(&self, call_id: CallId, ended_at_ms: u128) {
        if let Some(record) = self.lock().iter_mut().find(|r| r.call_id == call_id) {
            record.ended_at_ms.get_or_insert(ended_at_ms);
        }
    }
}
