use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::str::FromStr;

/// Errors produced while loading or reading a config file.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: std::io::Error },
    Syntax { line: usize, text: String },
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "error reading config file {path}: {source}"),
            Self::Syntax { line, text } => write!(f, "config line {line} is not understood: {text}"),
            Self::InvalidValue {
                section,
                key,
                value,
            } => write!(f, "invalid value for [{section}] {key}: '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// INI-style configuration: `key = value` pairs, optionally grouped under
/// `[Section]` headers. `#` and `;` start a comment line; surrounding quotes on
/// values are stripped.
#[derive(Debug, Default, Clone)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut cfg = Self::empty();
        let mut current_section: Option<String> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_owned());
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Syntax {
                    line: idx + 1,
                    text: line.to_owned(),
                });
            };
            let key = key.trim().to_owned();
            let value = value.trim().trim_matches('"').to_owned();

            match &current_section {
                None => {
                    cfg.globals.insert(key, value);
                }
                Some(sec) => {
                    cfg.sections
                        .entry(sec.clone())
                        .or_default()
                        .insert(key, value);
                }
            }
        }
        Ok(cfg)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(String::as_str)
    }

    /// Section value, then global value, then `default`.
    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    /// Parses a value with `FromStr`. A missing or empty key yields `Ok(None)`.
    pub fn get_parsed<T: FromStr>(&self, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(raw) = self.get_non_empty(section, key) else {
            return Ok(None);
        };
        raw.parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                section: section.to_owned(),
                key: key.to_owned(),
                value: raw.to_owned(),
            })
    }

    /// Comma-separated list; blank items are skipped.
    #[must_use]
    pub fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_non_empty(section, key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const SAMPLE: &str = r#"
# signaling server
bind_addr = 0.0.0.0:5000

[Signaling]
auth_timeout_ms = 2500
credentials_path = "/srv/rustycall/credentials.db"

[Ice]
stun_servers = stun:a.example:3478, , stun:b.example:3478
"#;

    #[test]
    fn parses_sections_globals_and_quotes() {
        let cfg = Config::parse(SAMPLE).unwrap();
        assert_eq!(cfg.get_global("bind_addr"), Some("0.0.0.0:5000"));
        assert_eq!(
            cfg.get("Signaling", "credentials_path"),
            Some("/srv/rustycall/credentials.db")
        );
        assert_eq!(
            cfg.get_or_default("Signaling", "bind_addr", "127.0.0.1:1"),
            "0.0.0.0:5000"
        );
    }

    #[test]
    fn typed_and_list_accessors() {
        let cfg = Config::parse(SAMPLE).unwrap();
        assert_eq!(
            cfg.get_parsed::<u64>("Signaling", "auth_timeout_ms").unwrap(),
            Some(2500)
        );
        assert_eq!(cfg.get_parsed::<u64>("Signaling", "missing").unwrap(), None);
        assert_eq!(
            cfg.get_list("Ice", "stun_servers").unwrap(),
            vec!["stun:a.example:3478", "stun:b.example:3478"]
        );
    }

    #[test]
    fn rejects_bad_values_and_lines() {
        let cfg = Config::parse("[Negotiation]\ntimeout_secs = soon\n").unwrap();
        assert!(matches!(
            cfg.get_parsed::<u64>("Negotiation", "timeout_secs"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::parse("[Signaling]\njust some words\n"),
            Err(ConfigError::Syntax { line: 2, .. })
        ));
    }
}
