use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush every 50 lines when debugging so a crash leaves a useful tail.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 50;

/// Flush every 500 lines otherwise.
#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 500;

/// Where the worker thread writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    File(PathBuf),
    Stderr,
}

/// Bounded, non-blocking process logger.
///
/// Producers log through cloned [`LoggerHandle`]s; a single `logger-worker`
/// thread formats and writes every line. Dropping the `Logger` together with
/// every handle closes the queue, which lets the worker flush and exit.
pub struct Logger {
    handle: LoggerHandle,
    destination: LogDestination,
    _thread: Option<thread::JoinHandle<()>>,
}

impl Logger {
    /// Logger for the signaling server, configured from `[Logging]`
    /// (`server_log_path`, `server_log_filename`, `level`).
    #[must_use]
    pub fn start_server(cap: usize, config: &Config) -> Self {
        Self::start("server_log_filename", "server_log_path", "signaling", cap, config)
    }

    /// Logger for a calling client, configured from `[Logging]`
    /// (`client_log_path`, `client_log_filename`, `level`).
    #[must_use]
    pub fn start_client(cap: usize, config: &Config) -> Self {
        Self::start("client_log_filename", "client_log_path", "client", cap, config)
    }

    fn start(
        fn_key: &str,
        path_key: &str,
        default_name: &str,
        cap: usize,
        config: &Config,
    ) -> Self {
        let min_level = config
            .get_non_empty("Logging", "level")
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogLevel::Info);
        let app_name = config
            .get_non_empty("Logging", fn_key)
            .unwrap_or(default_name);

        let dir = match config.get_non_empty("Logging", path_key) {
            Some(dir) => expand_path(dir),
            None => exe_dir_fallback_cwd().join("logs"),
        };
        Self::start_in_dir(dir, app_name, cap, min_level)
    }

    /// Starts a logger writing `<app_name>-<unix secs>-pid<pid>.log` inside `dir`.
    ///
    /// Falls back to stderr when the directory or file cannot be created.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: &str,
        cap: usize,
        min_level: LogLevel,
    ) -> Self {
        let dir = dir.as_ref();
        let _ = fs::create_dir_all(dir);

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let fname = format!("{app_name}-{secs}-pid{}.log", std::process::id());

        Self::start_with(LogDestination::File(dir.join(fname)), cap, min_level)
    }

    /// Starts a logger that writes to stderr only.
    pub fn start_stderr(cap: usize, min_level: LogLevel) -> Self {
        Self::start_with(LogDestination::Stderr, cap, min_level)
    }

    fn start_with(destination: LogDestination, cap: usize, min_level: LogLevel) -> Self {
        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap.max(1));
        let handle = LoggerHandle { tx, min_level };

        let writer: Box<dyn Write + Send> = match &destination {
            LogDestination::File(path) => {
                match OpenOptions::new().create(true).append(true).open(path) {
                    Ok(f) => Box::new(f),
                    Err(_) => Box::new(io::stderr()),
                }
            }
            LogDestination::Stderr => Box::new(io::stderr()),
        };

        let _thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || run_worker(rx, writer))
            .ok();

        Self {
            handle,
            destination,
            _thread,
        }
    }

    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn destination(&self) -> &LogDestination {
        &self.destination
    }
}

fn run_worker(rx: mpsc::Receiver<LogMsg>, writer: Box<dyn Write + Send>) {
    let mut out = BufWriter::new(writer);
    let mut lines_written: u32 = 0;

    while let Ok(m) = rx.recv() {
        let _ = writeln!(&mut out, "{}", format_line(&m));
        lines_written = lines_written.wrapping_add(1);

        // Warnings and errors go out immediately.
        if m.level >= LogLevel::Warn || lines_written % FLUSH_BATCH_SIZE == 0 {
            let _ = out.flush();
        }
    }

    let _ = out.flush();
}

/// `2026-10-14T09:30:05.123Z INFO  rustycall::signaling::relay | text`
fn format_line(m: &LogMsg) -> String {
    format!(
        "{} {:<5} {} | {}",
        format_utc_millis(m.ts_ms),
        m.level.as_str(),
        m.target,
        m.text
    )
}

/// RFC 3339 UTC rendering of a millisecond UNIX timestamp, without pulling in
/// a date crate. Days are converted with the civil-from-days algorithm.
fn format_utc_millis(ts_ms: u128) -> String {
    let millis = (ts_ms % 1_000) as u32;
    let total_secs = (ts_ms / 1_000) as i64;
    let days = total_secs.div_euclid(86_400);
    let rem = total_secs.rem_euclid(86_400);
    let (hour, min, sec) = (rem / 3_600, (rem % 3_600) / 60, rem % 60);

    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}.{millis:03}Z")
}

fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    let Some(rest) = path_str.strip_prefix('~') else {
        return PathBuf::from(path_str);
    };
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from);

    match home {
        Some(home) if rest.is_empty() => home,
        Some(home) if rest.starts_with('/') || rest.starts_with('\\') => home.join(&rest[1..]),
        _ => PathBuf::from(path_str),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::log_sink::LogSink;
    use std::time::{Duration, Instant};

    #[test]
    fn formats_epoch_and_leap_day() {
        assert_eq!(format_utc_millis(0), "1970-01-01T00:00:00.000Z");
        // 2024-02-29T12:34:56.789Z
        assert_eq!(
            format_utc_millis(1_709_210_096_789),
            "2024-02-29T12:34:56.789Z"
        );
    }

    #[test]
    fn file_logger_writes_lines() {
        let dir = std::env::temp_dir().join(format!("rustycall-log-test-{}", std::process::id()));
        let logger = Logger::start_in_dir(&dir, "unit", 16, LogLevel::Debug);
        let path = match logger.destination() {
            LogDestination::File(p) => p.clone(),
            LogDestination::Stderr => panic!("expected a file destination"),
        };

        let handle = logger.handle();
        handle.log(LogLevel::Warn, "relay dropped envelope", "rustycall::test");
        handle.log(LogLevel::Trace, "filtered out", "rustycall::test");

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut contents = String::new();
        while Instant::now() < deadline {
            contents = fs::read_to_string(&path).unwrap_or_default();
            if contents.contains("relay dropped envelope") {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert!(contents.contains("WARN"));
        assert!(contents.contains("relay dropped envelope"));
        assert!(!contents.contains("filtered out"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn expands_home_prefix() {
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(expand_path("~/logs"), PathBuf::from(home).join("logs"));
        }
        assert_eq!(expand_path("/var/log"), PathBuf::from("/var/log"));
    }
}
