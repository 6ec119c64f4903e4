use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use gridwatch_engine::{FetchSettings, DEFAULT_CELL_TIMEOUT};
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "gridwatch.ron";
pub const DEFAULT_DATA_FILE: &str = "gridwatch_tables.json";

/// Settings read from the RON config file. Every field is optional in the
/// file; anything left out keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub log: LogDestination,
    pub verbose: bool,
    pub cell_timeout_ms: u64,
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            log: LogDestination::default(),
            verbose: false,
            cell_timeout_ms: millis(DEFAULT_CELL_TIMEOUT),
            fetch: FetchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Overrides the built-in `gridwatch/<version>` agent.
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_ms: millis(settings.connect_timeout),
            request_timeout_ms: millis(settings.request_timeout),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    pub fn to_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            allowed_content_types: defaults.allowed_content_types,
        }
    }
}

impl AppConfig {
    /// Reads the config file. A missing file yields the defaults; an
    /// unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read config file {path:?}"))
            }
        };
        ron::from_str(&content).with_context(|| format!("Failed to parse config file {path:?}"))
    }

    pub fn cell_timeout(&self) -> Duration {
        Duration::from_millis(self.cell_timeout_ms)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
