use crate::log::log_level::LogLevel;

/// Anything that accepts formatted log lines.
///
/// Components hold an `Arc<dyn LogSink>` and log through the `sink_*!` macros.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
