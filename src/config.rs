use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;

use crate::pipeline::intake::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::reminders::{ReminderWindow, DEFAULT_CHECK_INTERVAL_SECS};

/// Application-level constants
pub const APP_NAME: &str = "labdispatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "labdispatch_lib=info,tower_http=info";

const DEFAULT_HTTP_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);
const DEFAULT_REMINDER_TIME: &str = "10:00";
const DEFAULT_REMINDER_GRACE_MINUTES: i64 = 10;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Cannot determine a data directory; set LABDISPATCH_DATA_DIR")]
    NoDataDir,
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub extraction_api_key: String,
    pub extraction_base_url: String,
    pub extraction_model: String,
    pub extraction_timeout_secs: u64,
    pub db_path: PathBuf,
    pub registry_path: PathBuf,
    pub reminder_window: ReminderWindow,
    pub reminder_interval: Duration,
    pub http_bind: SocketAddr,
}

impl AppConfig {
    /// Load from the process environment, after applying a `.env` file
    /// from the working directory if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let data_dir = match get("LABDISPATCH_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let reminder_time = get("REMINDER_TIME").unwrap_or_else(|| DEFAULT_REMINDER_TIME.into());
        let at = NaiveTime::parse_from_str(&reminder_time, "%H:%M").map_err(|_| {
            ConfigError::Invalid {
                key: "REMINDER_TIME",
                value: reminder_time.clone(),
            }
        })?;
        let grace = parse_or(
            "REMINDER_GRACE_MINUTES",
            get("REMINDER_GRACE_MINUTES"),
            DEFAULT_REMINDER_GRACE_MINUTES,
        )?;
        if grace < 0 {
            return Err(ConfigError::Invalid {
                key: "REMINDER_GRACE_MINUTES",
                value: grace.to_string(),
            });
        }

        let interval_secs = parse_or(
            "REMINDER_CHECK_INTERVAL_SECS",
            get("REMINDER_CHECK_INTERVAL_SECS"),
            DEFAULT_CHECK_INTERVAL_SECS,
        )?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REMINDER_CHECK_INTERVAL_SECS",
                value: "0".into(),
            });
        }

        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            extraction_api_key: required("OPENROUTER_API_KEY")?,
            extraction_base_url: get("EXTRACTION_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            extraction_model: get("EXTRACTION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            extraction_timeout_secs: parse_or(
                "EXTRACTION_TIMEOUT_SECS",
                get("EXTRACTION_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?,
            db_path: get("LABDISPATCH_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("orders.db")),
            registry_path: get("LABDISPATCH_REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("references.json")),
            reminder_window: ReminderWindow::new(at, grace),
            reminder_interval: Duration::from_secs(interval_secs),
            http_bind: parse_or("HTTP_BIND", get("HTTP_BIND"), DEFAULT_HTTP_BIND)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

/// Platform local data directory + `labdispatch`.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|d| d.join(APP_NAME))
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("BOT_TOKEN", "123:abc"),
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("LABDISPATCH_DATA_DIR", "/var/lib/labdispatch"),
        ]
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&minimal())).unwrap();
        assert_eq!(config.extraction_model, "meta-llama/llama-3-8b-instruct");
        assert_eq!(config.extraction_timeout_secs, 10);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/labdispatch/orders.db"));
        assert_eq!(
            config.registry_path,
            PathBuf::from("/var/lib/labdispatch/references.json")
        );
        assert_eq!(config.reminder_window, ReminderWindow::default());
        assert_eq!(config.reminder_interval, Duration::from_secs(300));
        assert_eq!(config.http_bind.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("OPENROUTER_API_KEY", "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOT_TOKEN"));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut pairs = minimal();
        pairs[1] = ("OPENROUTER_API_KEY", "   ");
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENROUTER_API_KEY"));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = minimal();
        pairs.extend([
            ("REMINDER_TIME", "08:30"),
            ("REMINDER_GRACE_MINUTES", "15"),
            ("REMINDER_CHECK_INTERVAL_SECS", "60"),
            ("LABDISPATCH_DB_PATH", "/tmp/x.db"),
            ("HTTP_BIND", "0.0.0.0:9000"),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.reminder_window.at, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(config.reminder_window.grace, chrono::Duration::minutes(15));
        assert_eq!(config.reminder_interval, Duration::from_secs(60));
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.http_bind.port(), 9000);
    }

    #[test]
    fn malformed_values_are_rejected() {
        for (key, value) in [
            ("REMINDER_TIME", "10am"),
            ("EXTRACTION_TIMEOUT_SECS", "ten"),
            ("REMINDER_CHECK_INTERVAL_SECS", "0"),
            ("HTTP_BIND", "localhost"),
        ] {
            let mut pairs = minimal();
            pairs.push((key, value));
            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: k, .. } if k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
