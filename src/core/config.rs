//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{QtopError, Result};

/// Full qtop configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub dashboard: DashboardConfig,
    pub backend: BackendConfig,
    pub log: LogConfig,
}

/// Dashboard refresh and pagination knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Milliseconds between background polls.
    pub refresh_interval_ms: u64,
    /// Maximum jobs fetched per retry/scheduled/dead/queue-jobs list.
    pub job_page_size: usize,
}

/// Connection parameters handed verbatim to the backend constructor.
/// The dashboard core never interprets these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub namespace: Option<String>,
}

/// Event-log destination. The dashboard owns the terminal, so log output
/// goes to a file or nowhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct LogConfig {
    /// JSONL log file path. `None` disables event logging.
    pub file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 2000,
            job_page_size: 25,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            namespace: None,
        }
    }
}

impl Config {
    /// Default configuration path: `~/.config/qtop/config.toml`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        home_dir.join(".config").join("qtop").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|e| QtopError::ConfigParse {
                context: "read",
                details: format!("{}: {e}", path_buf.display()),
            })?;
            toml::from_str::<Self>(&raw).map_err(|e| QtopError::ConfigParse {
                context: "toml",
                details: e.to_string(),
            })?
        } else if is_explicit_path {
            return Err(QtopError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Refresh interval as a `Duration`.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard.refresh_interval_ms)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(env_var)
    }

    /// Apply overrides from any name → value lookup. Split from the real
    /// environment so tests can inject values without mutating process
    /// state.
    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        set_u64(
            "QTOP_REFRESH_INTERVAL_MS",
            lookup("QTOP_REFRESH_INTERVAL_MS"),
            &mut self.dashboard.refresh_interval_ms,
        )?;
        set_usize(
            "QTOP_JOB_PAGE_SIZE",
            lookup("QTOP_JOB_PAGE_SIZE"),
            &mut self.dashboard.job_page_size,
        )?;
        if let Some(raw) = lookup("QTOP_URL") {
            self.backend.url = raw;
        }
        if let Some(raw) = lookup("QTOP_NAMESPACE") {
            self.backend.namespace = Some(raw);
        }
        if let Some(raw) = lookup("QTOP_LOG_FILE") {
            self.log.file = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.dashboard.refresh_interval_ms == 0 {
            return Err(QtopError::InvalidConfig {
                details: "dashboard.refresh_interval_ms must be > 0".to_string(),
            });
        }
        if self.dashboard.job_page_size == 0 {
            return Err(QtopError::InvalidConfig {
                details: "dashboard.job_page_size must be > 0".to_string(),
            });
        }
        if self.backend.url.is_empty() {
            return Err(QtopError::InvalidConfig {
                details: "backend.url must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_u64(name: &str, raw: Option<String>, slot: &mut u64) -> Result<()> {
    if let Some(raw) = raw {
        *slot = raw.parse::<u64>().map_err(|e| QtopError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {e}"),
        })?;
    }
    Ok(())
}

fn set_usize(name: &str, raw: Option<String>, slot: &mut usize) -> Result<()> {
    if let Some(raw) = raw {
        *slot = raw.parse::<usize>().map_err(|e| QtopError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {e}"),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.refresh_interval(), Duration::from_millis(2000));
        assert_eq!(cfg.dashboard.job_page_size, 25);
        assert!(cfg.log.file.is_none());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert_eq!(err.code(), "QT-1002");
    }

    #[test]
    fn toml_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[dashboard]\nrefresh_interval_ms = 500\njob_page_size = 10\n\n\
             [backend]\nurl = \"redis://example:6379/2\"\nnamespace = \"jobs\"\n"
        )
        .unwrap();
        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.dashboard.refresh_interval_ms, 500);
        assert_eq!(cfg.dashboard.job_page_size, 10);
        assert_eq!(cfg.backend.url, "redis://example:6379/2");
        assert_eq!(cfg.backend.namespace.as_deref(), Some("jobs"));
    }

    #[test]
    fn env_overrides_replace_defaults() {
        let mut cfg = Config::default();
        let overrides = vars(&[
            ("QTOP_REFRESH_INTERVAL_MS", "750"),
            ("QTOP_URL", "redis://alt:6380/1"),
            ("QTOP_LOG_FILE", "/tmp/qtop-test.jsonl"),
        ]);
        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned())
            .unwrap();
        assert_eq!(cfg.dashboard.refresh_interval_ms, 750);
        assert_eq!(cfg.backend.url, "redis://alt:6380/1");
        assert_eq!(cfg.log.file, Some(PathBuf::from("/tmp/qtop-test.jsonl")));
        // Untouched variables keep their defaults.
        assert_eq!(cfg.dashboard.job_page_size, 25);
        assert!(cfg.backend.namespace.is_none());
    }

    #[test]
    fn non_numeric_env_value_is_a_parse_error() {
        let mut cfg = Config::default();
        let overrides = vars(&[("QTOP_JOB_PAGE_SIZE", "lots")]);
        let err = cfg
            .apply_env_overrides_from(|name| overrides.get(name).cloned())
            .unwrap_err();
        assert_eq!(err.code(), "QT-1003");
        match err {
            QtopError::ConfigParse { context, details } => {
                assert_eq!(context, "env");
                assert!(details.contains("QTOP_JOB_PAGE_SIZE"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_refresh_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dashboard]\nrefresh_interval_ms = 0\n").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert_eq!(err.code(), "QT-1001");
    }
}
