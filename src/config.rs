//! Server configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use gridtac_engine::{DEFAULT_MAX_DEPTH, Heuristic, MIN_SIZE, Minimax};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Environment variable overriding [`GridtacConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Settings for the game server and its computer opponent.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridtacConfig {
    /// SQLite database path.
    #[serde(default = "default_database_url")]
    database_url: String,

    /// Plies the computer searches before falling back to the heuristic.
    #[serde(default = "default_search_depth")]
    search_depth: u32,

    /// Lines the cutoff heuristic scores.
    #[serde(default)]
    heuristic: Heuristic,

    /// Wall-clock budget per computer move; unbounded when absent.
    #[serde(default)]
    search_timeout_ms: Option<u64>,

    /// Pause before the computer replies.
    #[serde(default)]
    computer_delay_ms: u64,

    /// Extra attempts for a failed store write.
    #[serde(default = "default_persistence_retries")]
    persistence_retries: u32,

    /// Board size used when a request omits one.
    #[serde(default = "default_size")]
    default_size: usize,

    /// Largest board a client may ask for.
    #[serde(default = "default_max_size")]
    max_size: usize,
}

fn default_database_url() -> String {
    "gridtac.db".to_string()
}

fn default_search_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_persistence_retries() -> u32 {
    2
}

fn default_size() -> usize {
    MIN_SIZE
}

fn default_max_size() -> usize {
    7
}

impl Default for GridtacConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            search_depth: default_search_depth(),
            heuristic: Heuristic::default(),
            search_timeout_ms: None,
            computer_delay_ms: 0,
            persistence_retries: default_persistence_retries(),
            default_size: default_size(),
            max_size: default_max_size(),
        }
    }
}

impl GridtacConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed TOML or out-of-range values.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise, then applies
    /// `DATABASE_URL` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            warn!("Config file not found, using defaults");
            Self::default()
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            debug!(url = %url, "Database path overridden from environment");
            config.database_url = url;
        }

        info!(
            database_url = %config.database_url,
            search_depth = config.search_depth,
            heuristic = %config.heuristic,
            "Config loaded"
        );
        Ok(config)
    }

    /// Searcher built from the depth and heuristic settings.
    pub fn opponent(&self) -> Minimax {
        Minimax::new(self.search_depth, self.heuristic)
    }

    /// Search budget as a duration.
    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_ms.map(Duration::from_millis)
    }

    /// Computer pause as a duration.
    pub fn computer_delay(&self) -> Duration {
        Duration::from_millis(self.computer_delay_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_size < MIN_SIZE {
            return Err(ConfigError::new(format!(
                "default_size must be at least {}, got {}",
                MIN_SIZE, self.default_size
            )));
        }
        if self.default_size > self.max_size {
            return Err(ConfigError::new(format!(
                "default_size {} exceeds max_size {}",
                self.default_size, self.max_size
            )));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::new("database_url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
