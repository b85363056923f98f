//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::AppSettings;
use crate::feedback::NoticeTimings;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub notices: NoticeConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Signup service connection
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// How long notices stay on screen
#[derive(Debug, Clone, Deserialize)]
pub struct NoticeConfig {
    #[serde(default = "default_short_ms")]
    pub short_ms: u64,

    #[serde(default = "default_long_ms")]
    pub long_ms: u64,

    #[serde(default = "default_login_close_delay")]
    pub login_close_delay_ms: u64,
}

fn default_short_ms() -> u64 {
    3000
}

fn default_long_ms() -> u64 {
    5000
}

fn default_login_close_delay() -> u64 {
    1000
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            short_ms: default_short_ms(),
            long_ms: default_long_ms(),
            login_close_delay_ms: default_login_close_delay(),
        }
    }
}

/// Client behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_serialize_per_activity")]
    pub serialize_per_activity: bool,
}

fn default_serialize_per_activity() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            serialize_per_activity: default_serialize_per_activity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment.
    ///
    /// Runs before logging is set up, so files that failed to load are
    /// returned in [`ConfigSearch::skipped`] for the caller to report.
    pub fn load_default() -> ConfigSearch {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("rollcall").join("config.toml")),
            Some(PathBuf::from("/etc/rollcall/config.toml")),
            Some(PathBuf::from("./rollcall.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::search(&config_paths)
    }

    /// Load the first of `paths` that exists and parses, falling back to the
    /// environment-only config
    pub fn search(paths: &[PathBuf]) -> ConfigSearch {
        let mut skipped = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    return ConfigSearch {
                        config,
                        source: Some(path.clone()),
                        skipped,
                    };
                }
                Err(e) => skipped.push(e),
            }
        }

        ConfigSearch {
            config: Self::from_env(),
            source: None,
            skipped,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(url) = lookup("ROLLCALL_BASE_URL") {
            self.server.base_url = url;
        }
        if let Some(timeout) = lookup("ROLLCALL_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.server.request_timeout_secs = secs;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("ROLLCALL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("ROLLCALL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn notice_timings(&self) -> NoticeTimings {
        NoticeTimings {
            short: Duration::from_millis(self.notices.short_ms),
            long: Duration::from_millis(self.notices.long_ms),
            login_close_delay: Duration::from_millis(self.notices.login_close_delay_ms),
        }
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            timings: self.notice_timings(),
            serialize_per_activity: self.client.serialize_per_activity,
        }
    }
}

/// Outcome of searching the config locations
#[derive(Debug)]
pub struct ConfigSearch {
    pub config: Config,
    /// File the config came from; `None` means defaults plus environment
    pub source: Option<PathBuf>,
    /// Files that exist but could not be loaded, in search order
    pub skipped: Vec<ConfigError>,
}

impl ConfigSearch {
    /// Report the search on the installed subscriber
    pub fn log(&self) {
        for error in &self.skipped {
            tracing::warn!("Skipping config: {}", error);
        }
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Rollcall Configuration
#
# Environment variables override these settings:
# - ROLLCALL_BASE_URL
# - ROLLCALL_REQUEST_TIMEOUT_SECS
# - ROLLCALL_LOG_LEVEL
# - ROLLCALL_LOG_FORMAT

[server]
# Where the signup service is reachable
base_url = "http://localhost:8000"

# Give up on a request after this many seconds
request_timeout_secs = 30

[notices]
# Login, logout and "please login" notices (ms)
short_ms = 3000

# Signup and unregister results (ms)
long_ms = 5000

# Delay before the login dialog closes after a successful login (ms)
login_close_delay_ms = 1000

[client]
# Queue signups and removals on the same activity instead of sending them at once
serialize_per_activity = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path (logs go to stderr otherwise)
# file = "/var/log/rollcall/rollcall.log"
"#
    .to_string()
}
