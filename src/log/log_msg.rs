use crate::log::log_level::LogLevel;

/// One queued log line, as carried from a [`LoggerHandle`](super::LoggerHandle)
/// to the logger worker thread.
#[derive(Debug, Clone)]
pub struct LogMsg {
    pub level: LogLevel,
    /// Wall-clock time of the event, milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    pub text: String,
    /// Module path of the call site.
    pub target: &'static str,
}

impl LogMsg {
    pub fn new(
        level: LogLevel,
        text: impl Into<String>,
        target: &'static str,
        ts_ms: u128,
    ) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }
}
