use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::log::{LogSink, NoopLogSink};
use crate::signaling::server_settings::ServerSettings;
use crate::signaling::signaling_server::SignalingServer;

/// Environment override for `[Signaling] credentials_path`.
pub const CREDENTIALS_PATH_ENV: &str = "RUSTYCALL_CREDENTIALS_PATH";

/// Run the signaling server from `config`, optionally overriding the bind
/// address, using the given log sink. Blocks.
pub fn run_signaling_server_with_log(
    config: &Config,
    bind_override: Option<String>,
    log_sink: Arc<dyn LogSink>,
) -> io::Result<()> {
    let settings = resolve_settings(config, bind_override)?;
    SignalingServer::from_settings(settings, log_sink)?.run()
}

/// Development convenience: run signaling server with a `NoopLogSink`,
/// admitting any identity unless `RUSTYCALL_CREDENTIALS_PATH` is set.
pub fn run_signaling_server(addr: &str) -> io::Result<()> {
    let settings =
        resolve_settings(&Config::empty(), Some(addr.to_owned()))?.with_allow_any_identity(true);
    SignalingServer::from_settings(settings, Arc::new(NoopLogSink))?.run()
}

/// `[Signaling]` settings with the bind override and `RUSTYCALL_CREDENTIALS_PATH`
/// applied on top.
pub fn resolve_settings(config: &Config, bind_override: Option<String>) -> io::Result<ServerSettings> {
    let mut settings = ServerSettings::from_config(config)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    if let Some(addr) = bind_override {
        settings = settings.with_bind_addr(addr);
    }
    if let Ok(p) = std::env::var(CREDENTIALS_PATH_ENV) {
        if !p.is_empty() {
            settings.credentials_path = Some(PathBuf::from(p));
        }
    }
    Ok(settings)
}
