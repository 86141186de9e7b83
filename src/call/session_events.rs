use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crate::negotiation::SessionEvent;

/// Transitions of one member (or of every member) of a call.
///
/// Finite: the iterator ends once the session closes or the call ends, after
/// every event already emitted has been yielded. Not restartable; a new
/// subscription only sees later transitions.
#[derive(Debug)]
pub struct SessionEvents {
    rx: Receiver<SessionEvent>,
}

impl SessionEvents {
    pub(crate) fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }

    /// Next event if one is already queued.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the next event.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<SessionEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Everything queued so far, without blocking.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        self.rx.try_iter().collect()
    }
}

impl Iterator for SessionEvents {
    type Item = SessionEvent;

    /// Blocks until the next event or the end of the sequence.
    fn next(&mut self) -> Option<SessionEvent> {
        self.rx.recv().ok()
    }
}
