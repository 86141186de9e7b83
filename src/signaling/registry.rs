use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::signaling::protocol::{Msg, ParticipantId};
use crate::signaling::types::ConnId;

/// Live outbound half of one client connection.
///
/// `tx` feeds the connection's writer thread; frames leave in queue order.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub conn_id: ConnId,
    tx: Sender<Msg>,
}

impl Endpoint {
    pub fn new(conn_id: ConnId, tx: Sender<Msg>) -> Self {
        Self { conn_id, tx }
    }

    /// Queues `msg` for the writer thread. `false` once the connection is gone.
    pub fn send(&self, msg: Msg) -> bool {
        self.tx.send(msg).is_ok()
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_identity: HashMap<ParticipantId, Endpoint>,
    by_conn: HashMap<ConnId, ParticipantId>,
}

/// Maps each authenticated identity to at most one live endpoint.
///
/// Both directions live under one lock, so a `lookup` that follows a completed
/// `register` never observes the replaced endpoint.
#[derive(Debug, Default)]
pub struct TransportRegistry {
    inner: Mutex<RegistryInner>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // The maps stay consistent across every early return, so a poisoned
        // guard is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs `endpoint` for `identity`, last write wins.
    ///
    /// Returns the displaced endpoint, which stays open: its connection simply
    /// stops being addressable.
    pub fn register(&self, identity: ParticipantId, endpoint: Endpoint) -> Option<Endpoint> {
        let mut inner = self.lock();

        // A connection authenticates once; drop any stale reverse mapping.
        if let Some(prev_identity) = inner.by_conn.remove(&endpoint.conn_id) {
            if inner
                .by_identity
                .get(&prev_identity)
                .is_some_and(|ep| ep.conn_id == endpoint.conn_id)
            {
                inner.by_identity.remove(&prev_identity);
            }
        }

        inner.by_conn.insert(endpoint.conn_id, identity.clone());
        let displaced = inner.by_identity.insert(identity, endpoint);
        if let Some(old) = &displaced {
            inner.by_conn.remove(&old.conn_id);
        }
        displaced
    }

    pub fn lookup(&self, identity: &str) -> Option<Endpoint> {
        self.lock().by_identity.get(identity).cloned()
    }

    /// Removes whatever identity currently maps to `conn_id`.
    ///
    /// Idempotent. A superseded connection no longer maps to anything, so
    /// unregistering it never removes the identity's newer endpoint.
    pub fn unregister(&self, conn_id: ConnId) -> Option<ParticipantId> {
        let mut inner = self.lock();
        let identity = inner.by_conn.remove(&conn_id)?;
        if inner
            .by_identity
            .get(&identity)
            .is_some_and(|ep| ep.conn_id == conn_id)
        {
            inner.by_identity.remove(&identity);
        }
        Some(identity)
    }

    /// Identity currently bound to `conn_id`, if that connection is still the
    /// identity's live endpoint.
    pub fn identity_for(&self, conn_id: ConnId) -> Option<ParticipantId> {
        self.lock().by_conn.get(&conn_id).cloned()
    }

    pub fn online_identities(&self) -> Vec<ParticipantId> {
        self.lock().by_identity.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every mapping; endpoints' queues close once the last clone goes.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.by_identity.clear();
        inner.by_conn.clear();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::{Arc, mpsc};
    use std::thread;

    fn endpoint(conn_id: ConnId) -> (Endpoint, mpsc::Receiver<Msg>) {
        let (tx, rx) = mpsc::channel();
        (Endpoint::new(conn_id, tx), rx)
    }

    #[test]
    fn register_then_lookup() {
        let reg = TransportRegistry::new();
        let (ep, _rx) = endpoint(1);
        assert!(reg.register("alice".into(), ep).is_none());

        assert_eq!(reg.lookup("alice").map(|e| e.conn_id), Some(1));
        assert_eq!(reg.identity_for(1).as_deref(), Some("alice"));
        assert!(reg.lookup("bob").is_none());
    }

    #[test]
    fn reregister_replaces_and_returns_old_endpoint() {
        let reg = TransportRegistry::new();
        let (old, _rx1) = endpoint(1);
        let (new, _rx2) = endpoint(2);
        reg.register("alice".into(), old);

        let displaced = reg.register("alice".into(), new).expect("old endpoint");
        assert_eq!(displaced.conn_id, 1);
        assert_eq!(reg.lookup("alice").map(|e| e.conn_id), Some(2));
        assert_eq!(reg.identity_for(1), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unregister_stale_connection_keeps_newer_endpoint() {
        let reg = TransportRegistry::new();
        let (old, _rx1) = endpoint(1);
        let (new, _rx2) = endpoint(2);
        reg.register("alice".into(), old);
        reg.register("alice".into(), new);

        assert_eq!(reg.unregister(1), None);
        assert_eq!(reg.lookup("alice").map(|e| e.conn_id), Some(2));

        assert_eq!(reg.unregister(2).as_deref(), Some("alice"));
        assert_eq!(reg.unregister(2), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn endpoint_send_reports_closed_queue() {
        let (ep, rx) = endpoint(7);
        assert!(ep.send(Msg::Ping { nonce: 1 }));
        drop(rx);
        assert!(!ep.send(Msg::Ping { nonce: 2 }));
    }

    #[test]
    fn concurrent_registration_keeps_maps_consistent() {
        let reg = Arc::new(TransportRegistry::new());
        let mut workers = Vec::new();

        for t in 0..8u64 {
            let reg = Arc::clone(&reg);
            workers.push(thread::spawn(move || {
                for i in 0..50u64 {
                    let conn_id = t * 1_000 + i;
                    let (ep, _rx) = endpoint(conn_id);
                    let identity = format!("user-{}", i % 5);
                    reg.register(identity.clone(), ep);
                    if i % 3 == 0 {
                        reg.unregister(conn_id);
                    }
                    let _ = reg.lookup(&identity);
                }
            }));
        }
        for w in workers {
            w.join().unwrap();
        }

        // Every live identity must round-trip through its endpoint's conn id.
        for identity in reg.online_identities() {
            let ep = reg.lookup(&identity).unwrap();
            assert_eq!(reg.identity_for(ep.conn_id).as_deref(), Some(identity.as_str()));
        }
        assert!(reg.len() <= 5);
    }
}
