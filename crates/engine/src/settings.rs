use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PAGE_SIZE: usize = 1000;
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the hosted query backend.
    pub source_url: String,
    pub source_api_key: String,

    /// Connection string of the local target database.
    pub target_url: String,

    pub page_size: usize,
    pub batch_size: usize,
    pub request_timeout_secs: u64,

    /// When set, verification requires exact source/target row-count
    /// equality instead of the historical `target > 0` check.
    pub strict_verify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source_url: String::new(),
            source_api_key: String::new(),
            target_url: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            strict_verify: false,
        }
    }
}

impl Settings {
    /// Reads `SITESYNC_*` variables from the environment. Connection
    /// coordinates are required; tuning knobs fall back to defaults.
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Settings {
            source_url: required("SITESYNC_SOURCE_URL")?,
            source_api_key: required("SITESYNC_SOURCE_API_KEY")?,
            target_url: required("SITESYNC_TARGET_URL")?,
            page_size: parsed("SITESYNC_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            batch_size: parsed("SITESYNC_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            request_timeout_secs: parsed(
                "SITESYNC_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            strict_verify: flag("SITESYNC_STRICT_VERIFY")?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn required(name: &'static str) -> Result<String, SettingsError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SettingsError::Missing(name)),
    }
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, SettingsError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| SettingsError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn flag(name: &'static str) -> Result<bool, SettingsError> {
    match std::env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            _ => Err(SettingsError::Invalid { name, value }),
        },
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_knobs() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, 1000);
        assert_eq!(settings.batch_size, 100);
        assert!(!settings.strict_verify);
    }
}
