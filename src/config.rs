use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable naming the snapshot file.
pub const SNAPSHOT_ENV: &str = "TABLEDB_SNAPSHOT";
/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "TABLEDB_LOG";

const DEFAULT_LOG_FILTER: &str = "tabledb=warn";

/// Runtime settings for the command-line front end.
///
/// # Example
/// ```
/// use tabledb::Config;
///
/// let config = Config::default()
///     .with_snapshot_path("/tmp/tables.bin")
///     .with_log_filter("tabledb=debug");
/// assert!(config.snapshot_path.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where the catalog is loaded from on start and saved to on stop.
    /// `None` keeps everything in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Reads [SNAPSHOT_ENV] and [LOG_ENV], falling back to the defaults.
    /// Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(SNAPSHOT_ENV).filter(|v| !v.is_empty()) {
            config.snapshot_path = Some(PathBuf::from(path));
        }
        if let Some(filter) = lookup(LOG_ENV).filter(|v| !v.is_empty()) {
            config.log_filter = filter;
        }
        config
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}
