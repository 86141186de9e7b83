use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, ConfigError};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 5_000;

/// Typed view of the `[Signaling]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// How long a new connection may take to send `Authenticate`.
    pub auth_timeout: Duration,
    pub credentials_path: Option<PathBuf>,
    /// Admit any non-empty identity when no `credentials_path` is set.
    pub allow_any_identity: bool,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            auth_timeout: Duration::from_millis(DEFAULT_AUTH_TIMEOUT_MS),
            credentials_path: None,
            allow_any_identity: false,
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl ServerSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let auth_timeout_ms = config
            .get_parsed::<u64>("Signaling", "auth_timeout_ms")?
            .unwrap_or(DEFAULT_AUTH_TIMEOUT_MS);
        if auth_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                section: "Signaling".into(),
                key: "auth_timeout_ms".into(),
                value: "0".into(),
            });
        }
        let allow_any_identity = config
            .get_parsed::<bool>("Signaling", "allow_any_identity")?
            .unwrap_or(false);
        let path = |key: &str| config.get_non_empty("Signaling", key).map(PathBuf::from);

        Ok(Self {
            bind_addr: config
                .get_or_default("Signaling", "bind_addr", DEFAULT_BIND_ADDR)
                .to_owned(),
            auth_timeout: Duration::from_millis(auth_timeout_ms),
            credentials_path: path("credentials_path"),
            allow_any_identity,
            tls_cert_path: path("tls_cert_path"),
            tls_key_path: path("tls_key_path"),
        })
    }

    /// Same settings listening on `bind_addr`.
    #[must_use]
    pub fn with_bind_addr(mut self, bind_addr: impl Into<String>) -> Self {
        self.bind_addr = bind_addr.into();
        self
    }

    #[must_use]
    pub fn with_auth_timeout(mut self, auth_timeout: Duration) -> Self {
        self.auth_timeout = auth_timeout;
        self
    }

    /// Development mode: no credential file required.
    #[must_use]
    pub fn with_allow_any_identity(mut self, allow: bool) -> Self {
        self.allow_any_identity = allow;
        self
    }

    /// Both halves of the TLS identity, when configured.
    pub fn tls_paths(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.tls_cert_path.as_ref().zip(self.tls_key_path.as_ref())
    }
}
