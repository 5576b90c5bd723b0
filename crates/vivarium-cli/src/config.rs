//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use time::UtcOffset;
use vivarium_core::RetentionWindow;
use vivarium_core::http::DEFAULT_TIMEOUT;
use vivarium_core::scheduler::DEFAULT_POLL_INTERVAL;
use vivarium_types::timestamp::parse_utc_offset;

use crate::cli::BackendArgs;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL
    #[serde(default)]
    pub server_url: Option<String>,

    /// Session cookie (e.g. "session=...")
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// Hours of history kept visible
    #[serde(default)]
    pub retention_hours: Option<u32>,

    /// Poll interval in milliseconds
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// UTC offset the backend writes timestamps in ("UTC", "+01:00").
    /// Defaults to this machine's offset.
    #[serde(default)]
    pub backend_utc_offset: Option<String>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vivarium")
            .join("config.toml")
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, or return default if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// A starting config with every setting spelled out
    pub fn template() -> Self {
        Self {
            server_url: Some("http://localhost:5000".to_string()),
            session_cookie: None,
            retention_hours: Some(RetentionWindow::DEFAULT_HOURS),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL.as_millis() as u64),
            request_timeout_secs: Some(DEFAULT_TIMEOUT.as_secs()),
            backend_utc_offset: None,
            no_color: false,
        }
    }
}

/// Connection settings after flags, environment and config are combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub url: String,
    pub session_cookie: Option<String>,
    pub timeout: Duration,
    /// Offset for the backend's naive timestamps.
    pub utc_offset: UtcOffset,
}

/// Resolve backend settings: flags and environment win over the config file.
///
/// `local` is the host's offset, used unless the config names another.
pub fn resolve_backend(args: &BackendArgs, config: &Config, local: UtcOffset) -> Result<Backend> {
    let Some(url) = args.url.clone().or_else(|| config.server_url.clone()) else {
        bail!(
            "No backend URL. Pass --url, set VIVARIUM_URL, or add server_url to {}",
            Config::path().display()
        );
    };
    let session_cookie = args
        .session
        .clone()
        .or_else(|| config.session_cookie.clone());
    let timeout = config
        .request_timeout_secs
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
    let utc_offset = match &config.backend_utc_offset {
        Some(value) => parse_utc_offset(value)
            .with_context(|| format!("Bad backend_utc_offset in {}", Config::path().display()))?,
        None => local,
    };

    Ok(Backend {
        url,
        session_cookie,
        timeout,
        utc_offset,
    })
}

/// Resolve the retention window: explicit value, then config, then default.
pub fn resolve_retention(hours: Option<u32>, config: &Config) -> RetentionWindow {
    hours
        .or(config.retention_hours)
        .map_or_else(RetentionWindow::default, RetentionWindow::hours)
}

/// Resolve the poll interval: explicit value, then config, then default.
pub fn resolve_interval(interval_ms: Option<u64>, config: &Config) -> Duration {
    interval_ms
        .or(config.poll_interval_ms)
        .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::offset;

    const LOCAL: UtcOffset = offset!(+2);

    fn args(url: Option<&str>, session: Option<&str>) -> BackendArgs {
        BackendArgs {
            url: url.map(String::from),
            session: session.map(String::from),
        }
    }

    #[test]
    fn test_resolve_backend_prefers_args() {
        let config = Config {
            server_url: Some("http://from-config".to_string()),
            session_cookie: Some("session=config".to_string()),
            ..Default::default()
        };
        let backend = resolve_backend(&args(Some("http://from-flag"), None), &config, LOCAL).unwrap();
        assert_eq!(backend.url, "http://from-flag");
        assert_eq!(backend.session_cookie.as_deref(), Some("session=config"));
    }

    #[test]
    fn test_resolve_backend_requires_url() {
        let result = resolve_backend(&args(None, None), &Config::default(), LOCAL);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_backend_timeout() {
        let config = Config {
            server_url: Some("http://x".to_string()),
            request_timeout_secs: Some(3),
            ..Default::default()
        };
        let backend = resolve_backend(&args(None, None), &config, LOCAL).unwrap();
        assert_eq!(backend.timeout, Duration::from_secs(3));

        let backend = resolve_backend(&args(Some("http://x"), None), &Config::default(), LOCAL).unwrap();
        assert_eq!(backend.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_resolve_backend_offset() {
        let mut config = Config {
            server_url: Some("http://x".to_string()),
            ..Default::default()
        };
        let backend = resolve_backend(&args(None, None), &config, LOCAL).unwrap();
        assert_eq!(backend.utc_offset, LOCAL);

        config.backend_utc_offset = Some("-05:00".to_string());
        let backend = resolve_backend(&args(None, None), &config, LOCAL).unwrap();
        assert_eq!(backend.utc_offset, offset!(-5));

        config.backend_utc_offset = Some("UTC".to_string());
        let backend = resolve_backend(&args(None, None), &config, LOCAL).unwrap();
        assert_eq!(backend.utc_offset, UtcOffset::UTC);
    }

    #[test]
    fn test_resolve_backend_rejects_bad_offset() {
        let config = Config {
            server_url: Some("http://x".to_string()),
            backend_utc_offset: Some("Europe/London".to_string()),
            ..Default::default()
        };
        let err = resolve_backend(&args(None, None), &config, LOCAL).unwrap_err();
        assert!(format!("{:#}", err).contains("Europe/London"));
    }

    #[test]
    fn test_resolve_retention_and_interval() {
        let config = Config {
            retention_hours: Some(6),
            poll_interval_ms: Some(2000),
            ..Default::default()
        };
        assert_eq!(resolve_retention(None, &config), RetentionWindow::hours(6));
        assert_eq!(resolve_retention(Some(1), &config), RetentionWindow::hours(1));
        assert_eq!(resolve_retention(None, &Config::default()), RetentionWindow::default());

        assert_eq!(resolve_interval(None, &config), Duration::from_millis(2000));
        assert_eq!(resolve_interval(None, &Config::default()), DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::template();
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(Config::load_from(&path), Config::default());

        fs::write(&path, "server_url = [not toml").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str("retention_hours = 24\n").unwrap();
        assert_eq!(config.retention_hours, Some(24));
        assert!(config.server_url.is_none());
        assert!(!config.no_color);
    }
}
