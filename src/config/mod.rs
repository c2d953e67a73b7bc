//! # Drydock Configuration
//!
//! Immutable, validated description of an instance before anything is
//! allocated for it.
//!
//! ## Usage
//!
//! ```rust
//! use drydock::config::DrydockConfig;
//! use std::time::Duration;
//!
//! let config = DrydockConfig::new("postgres:16")
//!     .with_password("verySekrit")
//!     .with_readiness_timeout(Duration::from_secs(30));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.port, None);
//! ```
//!
//! Configuration can also be layered from a YAML file and `DRYDOCK_*`
//! environment variables, see [`loader`].

pub mod error;
pub mod loader;

use crate::constants::{self, timing};
use crate::engine::split_reference;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};

/// SSL modes accepted by libpq-compatible clients
const SSL_MODES: [&str; 6] = [
    "disable",
    "allow",
    "prefer",
    "require",
    "verify-ca",
    "verify-full",
];

/// Root configuration for one instance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DrydockConfig {
    /// Image reference given by repository and tag, e.g. `postgres:16`
    pub image: String,

    /// Fixed host port; allocated when absent
    #[serde(default)]
    pub port: Option<u16>,

    /// Superuser password; generated when absent
    #[serde(default)]
    pub password: Option<String>,

    /// Readiness polling settings
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Upper bound on draining an image pull, zero for no bound
    #[serde(default = "default_pull_timeout_seconds")]
    pub pull_timeout_seconds: u64,

    /// Prefix for container names
    #[serde(default = "default_container_name_prefix")]
    pub container_name_prefix: String,

    /// Client-side database connection settings
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Readiness loop timing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Deadline for the server to accept connections
    pub timeout_ms: u64,
    /// Pause between attempts, zero for a tight poll
    pub poll_interval_ms: u64,
    /// Bound on a single connection attempt
    pub attempt_timeout_ms: u64,
}

/// How clients reach the server inside the container
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub user: String,
    pub ssl_mode: String,
    /// Pool size for connections handed to callers
    pub max_connections: u32,
    /// Prefix for generated database names
    pub name_prefix: String,
}

fn default_pull_timeout_seconds() -> u64 {
    timing::PULL_TIMEOUT.as_secs()
}

fn default_container_name_prefix() -> String {
    constants::CONTAINER_NAME_PREFIX.to_string()
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_ms: timing::READINESS_TIMEOUT.as_millis() as u64,
            poll_interval_ms: timing::READINESS_POLL_INTERVAL.as_millis() as u64,
            attempt_timeout_ms: timing::READINESS_ATTEMPT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            user: constants::DEFAULT_SUPERUSER.to_string(),
            ssl_mode: constants::DEFAULT_SSL_MODE.to_string(),
            max_connections: 5,
            name_prefix: constants::DATABASE_NAME_PREFIX.to_string(),
        }
    }
}

impl DrydockConfig {
    /// Configuration for `image` with every other setting at its default
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            port: None,
            password: None,
            readiness: ReadinessConfig::default(),
            pull_timeout_seconds: default_pull_timeout_seconds(),
            container_name_prefix: default_container_name_prefix(),
            database: DatabaseSettings::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.readiness.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Bound the image pull, `None` waits for as long as the pull takes
    pub fn with_pull_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pull_timeout_seconds = timeout.map_or(0, |t| t.as_secs().max(1));
        self
    }

    pub fn with_container_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.container_name_prefix = prefix.into();
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.database.max_connections = max_connections;
        self
    }

    /// Pull bound, `None` when unbounded
    pub fn pull_timeout(&self) -> Option<Duration> {
        (self.pull_timeout_seconds > 0).then(|| Duration::from_secs(self.pull_timeout_seconds))
    }

    /// Validate the configuration
    ///
    /// This is the only place configuration is checked; the instance
    /// constructor calls it before allocating anything.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.image.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "image",
                "instance configuration",
            ));
        }

        if self.image.chars().any(char::is_whitespace) {
            return Err(ConfigurationError::invalid_value(
                "image",
                self.image.clone(),
                "image reference must not contain whitespace",
            ));
        }

        if self.image.starts_with(':') || self.image.starts_with('@') {
            return Err(ConfigurationError::invalid_value(
                "image",
                self.image.clone(),
                "image reference must name a repository",
            ));
        }

        if split_reference(&self.image).1 == Some("") {
            return Err(ConfigurationError::invalid_value(
                "image",
                self.image.clone(),
                "tag or digest after ':' or '@' must not be empty",
            ));
        }

        if self.port == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "port",
                "0",
                "port must be greater than 0",
            ));
        }

        if matches!(self.password.as_deref(), Some("")) {
            return Err(ConfigurationError::invalid_value(
                "password",
                "",
                "password must not be empty",
            ));
        }

        if self.readiness.timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "readiness.timeout_ms",
                "0",
                "readiness timeout must be greater than 0",
            ));
        }

        if self.readiness.attempt_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "readiness.attempt_timeout_ms",
                "0",
                "attempt timeout must be greater than 0",
            ));
        }

        if !is_valid_container_name_prefix(&self.container_name_prefix) {
            return Err(ConfigurationError::invalid_value(
                "container_name_prefix",
                self.container_name_prefix.clone(),
                "prefix must start with an alphanumeric character and contain only [a-zA-Z0-9_.-]",
            ));
        }

        if self.database.host.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "database.host",
                "database configuration",
            ));
        }

        if self.database.user.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "database.user",
                "database configuration",
            ));
        }

        if !SSL_MODES.contains(&self.database.ssl_mode.as_str()) {
            return Err(ConfigurationError::invalid_value(
                "database.ssl_mode",
                self.database.ssl_mode.clone(),
                format!("expected one of {}", SSL_MODES.join(", ")),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        let prefix_ok = self
            .database
            .name_prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
            && self
                .database
                .name_prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !prefix_ok {
            return Err(ConfigurationError::invalid_value(
                "database.name_prefix",
                self.database.name_prefix.clone(),
                "prefix must be a lower-case identifier",
            ));
        }

        Ok(())
    }
}

fn is_valid_container_name_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        _ => false,
    }
}
