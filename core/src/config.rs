//! Configuration loading for the handoff runtime.
//!
//! An optional TOML file, discovered via `HANDOFF_CONFIG` or
//! `~/.handoff/config.toml`. Every field has a default (counter 10,
//! threshold 5, 1s interval, no join timeout), so a missing file simply
//! runs the stock scenario.

use std::{env, fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;

const fn default_initial_count() -> i64 {
    10
}

const fn default_threshold() -> i64 {
    5
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_countdown_name() -> String {
    "T1".to_string()
}

fn default_ticker_name() -> String {
    "T2".to_string()
}

/// Display names for the two workers.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerNames {
    #[serde(default = "default_countdown_name")]
    pub countdown: String,
    #[serde(default = "default_ticker_name")]
    pub ticker: String,
}

impl Default for WorkerNames {
    fn default() -> Self {
        Self {
            countdown: default_countdown_name(),
            ticker: default_ticker_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandoffConfig {
    /// Counter value at process start.
    #[serde(default = "default_initial_count")]
    pub initial_count: i64,
    /// Once the counter drops below this, the countdown waits for the ticker.
    #[serde(default = "default_threshold")]
    pub handoff_threshold: i64,
    /// Cycle interval shared by both workers.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound on the wait for the ticker. Absent means wait forever;
    /// against an unbounded ticker that wait never returns.
    #[serde(default)]
    pub join_timeout_ms: Option<u64>,
    #[serde(default)]
    pub workers: WorkerNames,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            initial_count: default_initial_count(),
            handoff_threshold: default_threshold(),
            tick_interval_ms: default_tick_interval_ms(),
            join_timeout_ms: None,
            workers: WorkerNames::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl HandoffConfig {
    /// Load from the discovered config path, if any.
    ///
    /// `Ok(None)` means no config file exists; callers fall back to
    /// [`HandoffConfig::default`].
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(path).map(Some),
            _ => Ok(None),
        }
    }

    /// Load and parse a specific config file.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[must_use]
    pub fn join_timeout(&self) -> Option<Duration> {
        self.join_timeout_ms.map(Duration::from_millis)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("HANDOFF_CONFIG")
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".handoff").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_describe_the_stock_scenario() {
        let config = HandoffConfig::default();
        assert_eq!(config.initial_count, 10);
        assert_eq!(config.handoff_threshold, 5);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.join_timeout(), None);
        assert_eq!(config.workers.countdown, "T1");
        assert_eq!(config.workers.ticker, "T2");
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let config: HandoffConfig = toml::from_str("").unwrap();
        assert_eq!(config.initial_count, 10);
        assert_eq!(config.join_timeout_ms, None);
    }

    #[test]
    fn full_file_overrides_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            "initial_count = 3\n\
             handoff_threshold = 2\n\
             tick_interval_ms = 50\n\
             join_timeout_ms = 250\n\
             [workers]\n\
             countdown = \"alpha\"\n\
             ticker = \"beta\"\n"
        )
        .unwrap();

        let config = HandoffConfig::load_from(path).unwrap();
        assert_eq!(config.initial_count, 3);
        assert_eq!(config.handoff_threshold, 2);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.join_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.workers.countdown, "alpha");
        assert_eq!(config.workers.ticker, "beta");
    }

    #[test]
    fn unparseable_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "initial_count = \"ten\"").unwrap();

        let err = HandoffConfig::load_from(path.clone()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), &path);
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let err = HandoffConfig::load_from(path.clone()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(err.path(), &path);
    }
}
