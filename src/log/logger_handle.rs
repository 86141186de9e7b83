use std::sync::mpsc;

use crate::{
    log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink},
    utils::now_millis,
};

/// Cloneable, non-blocking handle to the process logger.
///
/// Lines below `min_level` are discarded at the call site. Everything else is
/// pushed into a bounded queue; when the queue is full the line is dropped
/// rather than stalling a connection thread.
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
    pub(super) min_level: LogLevel,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Enqueues a line without blocking.
    ///
    /// # Errors
    /// - `TrySendError::Full` when the queue is at capacity.
    /// - `TrySendError::Disconnected` when the worker has exited.
    ///
    /// A line filtered out by the minimum level returns `Ok(())`.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        if level < self.min_level {
            return Ok(());
        }
        self.tx
            .try_send(LogMsg::new(level, text, target, now_millis()))
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::mpsc::{TrySendError, sync_channel};

    #[test]
    fn try_log_ok_when_capacity_available() {
        let (tx, rx) = sync_channel::<LogMsg>(2);
        let h = LoggerHandle {
            tx,
            min_level: LogLevel::Trace,
        };

        h.try_log(LogLevel::Info, "hello", "test::target").unwrap();

        let msg = rx.recv().expect("a message should arrive");
        assert_eq!(msg.level, LogLevel::Info);
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.target, "test::target");
        assert!(msg.ts_ms > 0);
    }

    #[test]
    fn lines_below_min_level_are_not_queued() {
        let (tx, rx) = sync_channel::<LogMsg>(2);
        let h = LoggerHandle {
            tx,
            min_level: LogLevel::Warn,
        };

        h.try_log(LogLevel::Debug, "noise", "t").unwrap();
        h.try_log(LogLevel::Error, "boom", "t").unwrap();

        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.text, "boom");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_queue_drops_the_line() {
        let (tx, _rx) = sync_channel::<LogMsg>(1);
        let h = LoggerHandle {
            tx,
            min_level: LogLevel::Trace,
        };

        h.try_log(LogLevel::Info, "first", "t").unwrap();
        match h.try_log(LogLevel::Info, "second", "t") {
            Err(TrySendError::Full(_)) => {}
            other => panic!("expected Full, got: {:?}", other),
        }
    }
}
