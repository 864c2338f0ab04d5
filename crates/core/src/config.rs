use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{Result, SessionError};

pub const DEFAULT_MIN_QUERY_LEN: usize = 3;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Input gating for a debounced search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Inputs shorter than this (in characters) clear the list instead of searching.
    pub min_query_len: usize,
    /// Quiet period a text change must survive before it is searched.
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSearchConfig {
    min_query_len: Option<usize>,
    debounce_ms: Option<u64>,
}

impl SearchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes).map_err(|err| match err {
            SessionError::ConfigParse(msg) => {
                SessionError::ConfigParse(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parse a JSON or TOML document. Missing keys keep their defaults.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = parse_raw(bytes)?;
        let defaults = Self::default();
        let cfg = Self {
            min_query_len: raw.min_query_len.unwrap_or(defaults.min_query_len),
            debounce: raw
                .debounce_ms
                .map_or(defaults.debounce, Duration::from_millis),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    #[must_use]
    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce.is_zero() {
            return Err(SessionError::InvalidConfig(
                "debounce_ms must be greater than 0".to_string(),
            ));
        }
        if self.debounce > Duration::from_millis(MAX_DEBOUNCE_MS) {
            return Err(SessionError::InvalidConfig(format!(
                "debounce_ms must be at most {MAX_DEBOUNCE_MS}"
            )));
        }
        Ok(())
    }

    /// Whether `text` is long enough to be searched.
    #[must_use]
    pub fn accepts(&self, text: &str) -> bool {
        text.chars().count() >= self.min_query_len
    }
}

fn parse_raw(bytes: &[u8]) -> Result<RawSearchConfig> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes)
                .map_err(|_| SessionError::ConfigParse(format!("not valid JSON ({json_err})")))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                SessionError::ConfigParse(format!(
                    "not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                ))
            })?;
            serde_json::to_value(toml_value)
                .map_err(|err| SessionError::ConfigParse(err.to_string()))?
        }
    };

    serde_json::from_value(value).map_err(|err| SessionError::ConfigParse(err.to_string()))
}
