//! Configuration loading and typed config structures for the bridge.
//!
//! The configuration lives in a YAML file (`tickstash.yaml` by default).
//! Every field has a default, so a missing file or an empty document is a
//! valid configuration apart from the server credentials, which must come
//! from the file or the environment.
//!
//! # Environment overrides
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `SCREEPS_URL` | `server.url` |
//! | `SCREEPS_TOKEN` | `server.token` |
//! | `SCREEPS_EMAIL` | `server.email` |
//! | `SCREEPS_PASSWORD` | `server.password` |
//! | `ELASTICSEARCH` | any value selects the networked store host |
//! | `ELASTICSEARCH_URL` | `store.url` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::index::IndexNaming;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range or a required value is missing.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Store host used when the `ELASTICSEARCH` flag is set.
pub const NETWORKED_STORE_URL: &str = "http://elasticsearch:9200";

/// Store host used otherwise.
pub const LOCAL_STORE_URL: &str = "http://localhost:9200";

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TickstashConfig {
    /// Game server connection and credentials.
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Destination naming.
    #[serde(default)]
    pub indices: IndicesConfig,

    /// Scheduled retention tool.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Event delivery between the socket and the router.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl TickstashConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    /// Environment overrides apply either way.
    ///
    /// # Errors
    ///
    /// Same as [`TickstashConfig::from_file`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Parse configuration from a YAML string and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SCREEPS_URL") {
            self.server.url = val;
        }
        if let Some(val) = lookup("SCREEPS_TOKEN") {
            self.server.token = Some(val);
        }
        if let Some(val) = lookup("SCREEPS_EMAIL") {
            self.server.email = Some(val);
        }
        if let Some(val) = lookup("SCREEPS_PASSWORD") {
            self.server.password = Some(val);
        }
        if lookup("ELASTICSEARCH").is_some() {
            self.store.networked = true;
        }
        if let Some(val) = lookup("ELASTICSEARCH_URL") {
            self.store.url = Some(val);
        }
    }

    /// Check values that YAML types alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.server.url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid(format!(
                "server.url must start with http:// or https:// (got {url})"
            )));
        }
        if self.server.token.is_none()
            && (self.server.email.is_none() || self.server.password.is_none())
        {
            return Err(invalid(
                "server.token or both server.email and server.password must be set",
            ));
        }
        if self.server.shards.as_ref().is_some_and(Vec::is_empty) {
            return Err(invalid("server.shards must not be empty when set"));
        }
        if self.store.max_in_flight_writes == 0 {
            return Err(invalid("store.max_in_flight_writes must be at least 1"));
        }
        if self.store.request_timeout_ms == 0 {
            return Err(invalid("store.request_timeout_ms must be at least 1"));
        }
        if self.transport.event_buffer == 0 {
            return Err(invalid("transport.event_buffer must be at least 1"));
        }
        if self.retention.enabled && self.retention.interval_secs == 0 {
            return Err(invalid("retention.interval_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Build a [`ConfigError::Invalid`].
fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Game server connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server's HTTP API (e.g. `https://screeps.com/`).
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Auth token. Takes precedence over email/password.
    #[serde(default)]
    pub token: Option<String>,

    /// Account email (or username on private servers) for sign-in.
    #[serde(default)]
    pub email: Option<String>,

    /// Account password for sign-in.
    #[serde(default)]
    pub password: Option<String>,

    /// Fixed shard list. When set, shard discovery is skipped.
    #[serde(default)]
    pub shards: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            token: None,
            email: None,
            password: None,
            shards: None,
        }
    }
}

/// Where documents are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Elasticsearch over HTTP.
    #[default]
    Elasticsearch,
    /// One JSON line per document on standard output (dry run).
    Stdout,
}

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Store implementation.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Explicit store URL. Wins over `networked`.
    #[serde(default)]
    pub url: Option<String>,

    /// Use the networked host (`elasticsearch`) instead of `localhost`.
    #[serde(default)]
    pub networked: bool,

    /// Basic-auth username.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum number of concurrently in-flight writes.
    #[serde(default = "default_max_in_flight_writes")]
    pub max_in_flight_writes: usize,

    /// Address documents as `/<index>/<kind>` (pre-7.x stores) instead of
    /// `/<index>/_doc`.
    #[serde(default)]
    pub mapping_types: bool,
}

impl StoreConfig {
    /// The resolved store base URL.
    pub fn endpoint(&self) -> String {
        self.url.clone().unwrap_or_else(|| {
            if self.networked {
                NETWORKED_STORE_URL.to_owned()
            } else {
                LOCAL_STORE_URL.to_owned()
            }
        })
    }

    /// Per-request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            networked: false,
            username: None,
            password: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_in_flight_writes: default_max_in_flight_writes(),
            mapping_types: false,
        }
    }
}

/// Destination naming settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IndicesConfig {
    /// Prefix prepended to every destination (e.g. `screeps`).
    #[serde(default)]
    pub namespace: Option<String>,
}

impl IndicesConfig {
    /// Naming policy for these settings.
    pub fn naming(&self) -> IndexNaming {
        IndexNaming::with_namespace(self.namespace.clone())
    }
}

/// Retention tool schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetentionConfig {
    /// Whether the job runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path of the retention executable.
    #[serde(default = "default_retention_command")]
    pub command: PathBuf,

    /// Main configuration file passed via `--config`.
    #[serde(default = "default_retention_config_path")]
    pub config_path: PathBuf,

    /// Action file passed as the positional argument.
    #[serde(default = "default_retention_action_path")]
    pub action_path: PathBuf,

    /// Seconds between runs.
    #[serde(default = "default_retention_interval_secs")]
    pub interval_secs: u64,
}

impl RetentionConfig {
    /// Time between runs.
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_retention_command(),
            config_path: default_retention_config_path(),
            action_path: default_retention_action_path(),
            interval_secs: default_retention_interval_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Event delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Capacity of the queue between the socket reader and the router.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_server_url() -> String {
    "https://screeps.com/".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

const fn default_max_in_flight_writes() -> usize {
    64
}

const fn default_true() -> bool {
    true
}

fn default_retention_command() -> PathBuf {
    PathBuf::from("/usr/bin/curator")
}

fn default_retention_config_path() -> PathBuf {
    PathBuf::from("./curator.yml")
}

fn default_retention_action_path() -> PathBuf {
    PathBuf::from("./curator-action.yml")
}

const fn default_retention_interval_secs() -> u64 {
    60 * 60
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_event_buffer() -> usize {
    1024
}
