use std::time::Duration;

use crate::config::{Config, ConfigError};

pub const DEFAULT_NEGOTIATION_TIMEOUT_SECS: u64 = 30;
/// Upper bound accepted for `[Negotiation] timeout_secs` (one day).
pub const MAX_NEGOTIATION_TIMEOUT_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_STUN_SERVERS: &[&str] = &[
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

/// ICE servers handed to every new peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceConfig {
    pub stun_servers: Vec<String>,
}

impl Default for IceConfig {
    fn default() -> Self {
        Self {
            stun_servers: DEFAULT_STUN_SERVERS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// Client-side negotiation settings (`[Negotiation]`, `[Ice]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationConfig {
    /// Window without progress after which a session fails with `Timeout`.
    pub timeout: Duration,
    pub ice: IceConfig,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_NEGOTIATION_TIMEOUT_SECS),
            ice: IceConfig::default(),
        }
    }
}

impl NegotiationConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let secs = config
            .get_parsed::<u64>("Negotiation", "timeout_secs")?
            .unwrap_or(DEFAULT_NEGOTIATION_TIMEOUT_SECS);
        if secs == 0 || secs > MAX_NEGOTIATION_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                section: "Negotiation".into(),
                key: "timeout_secs".into(),
                value: secs.to_string(),
            });
        }
        let ice = match config.get_list("Ice", "stun_servers") {
            Some(list) if !list.is_empty() => IceConfig { stun_servers: list },
            _ => IceConfig::default(),
        };
        Ok(Self {
            timeout: Duration::from_secs(secs),
            ice,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn defaults() {
        let cfg = NegotiationConfig::from_config(&Config::empty()).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.ice.stun_servers.len(), 2);
        assert_eq!(cfg.ice.stun_servers[0], "stun:stun.l.google.com:19302");
    }

    #[test]
    fn overrides() {
        let cfg = Config::parse(
            "[Negotiation]\ntimeout_secs = 12\n[Ice]\nstun_servers = stun:turn.example:3478\n",
        )
        .unwrap();
        let n = NegotiationConfig::from_config(&cfg).unwrap();
        assert_eq!(n.timeout, Duration::from_secs(12));
        assert_eq!(n.ice.stun_servers, vec!["stun:turn.example:3478"]);
    }

    #[test]
    fn timeout_out_of_range_is_rejected() {
        for bad in ["0", "86401", "18446744073709551615"] {
            let cfg = Config::parse(&format!("[Negotiation]\ntimeout_secs = {bad}\n")).unwrap();
            let err = NegotiationConfig::from_config(&cfg).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { key, value, .. } if key == "timeout_secs" && value == bad),
                "{bad}: {err:?}"
            );
        }
        let cfg = Config::parse("[Negotiation]\ntimeout_secs = 86400\n").unwrap();
        assert_eq!(
            NegotiationConfig::from_config(&cfg).unwrap().timeout,
            Duration::from_secs(MAX_NEGOTIATION_TIMEOUT_SECS)
        );
    }
}
