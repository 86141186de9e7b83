/// Internal identifier for an accepted client connection (TCP or TLS).
///
/// Allocated by the listener, never reused within one server run.
pub type ConnId = u64;
