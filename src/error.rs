//! # Drydock Error Types
//!
//! Structured error handling for the instance lifecycle using thiserror.
//! Variants follow the failure classes of the lifecycle: resource allocation,
//! container engine communication, readiness timeout, database provisioning
//! and configuration. Teardown failures never show up here; they are logged.

use thiserror::Error;

/// Comprehensive drydock error types
#[derive(Error, Debug)]
pub enum DrydockError {
    #[error("Resource allocation failed: {resource}: {message}")]
    ResourceAllocation { resource: String, message: String },

    #[error("Container engine error: {operation}: {message}")]
    Engine { operation: String, message: String },

    #[error("Image pull timed out: {image} not available after {timeout_seconds}s")]
    PullTimeout { image: String, timeout_seconds: u64 },

    #[error(
        "Timed out while connecting to postgres at {endpoint} \
         after {timeout_ms}ms ({attempts} attempts)"
    )]
    ReadinessTimeout {
        endpoint: String,
        timeout_ms: u64,
        attempts: u32,
    },

    #[error("Database error: {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("Invalid database name '{name}': {reason}")]
    InvalidDatabaseName { name: String, reason: String },

    #[error("Configuration error: {field}: {message}")]
    Configuration { field: String, message: String },

    #[error("Invalid state: cannot {operation} an instance that is {state}")]
    InvalidState { operation: String, state: String },
}

impl DrydockError {
    /// Create a resource allocation error
    pub fn resource_allocation(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceAllocation {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a container engine error
    pub fn engine(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Engine {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a pull timeout error
    pub fn pull_timeout(image: impl Into<String>, timeout_seconds: u64) -> Self {
        Self::PullTimeout {
            image: image.into(),
            timeout_seconds,
        }
    }

    /// Create a readiness timeout error
    pub fn readiness_timeout(endpoint: impl Into<String>, timeout_ms: u64, attempts: u32) -> Self {
        Self::ReadinessTimeout {
            endpoint: endpoint.into(),
            timeout_ms,
            attempts,
        }
    }

    /// Create a database error
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an invalid database name error
    pub fn invalid_database_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDatabaseName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            state: state.into(),
        }
    }

    /// Whether this error is the readiness deadline expiring
    pub fn is_readiness_timeout(&self) -> bool {
        matches!(self, Self::ReadinessTimeout { .. })
    }
}

/// Conversion from sqlx::Error to DrydockError
impl From<sqlx::Error> for DrydockError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DrydockError::database("query", db_err.to_string()),
            sqlx::Error::Io(io_err) => DrydockError::database("connect", io_err.to_string()),
            sqlx::Error::PoolTimedOut => {
                DrydockError::database("pool", "timed out acquiring a connection")
            }
            sqlx::Error::Configuration(config_err) => {
                DrydockError::configuration("database", config_err.to_string())
            }
            _ => DrydockError::database("connect", err.to_string()),
        }
    }
}

/// Conversion from bollard errors for engine calls without a more specific context
impl From<bollard::errors::Error> for DrydockError {
    fn from(err: bollard::errors::Error) -> Self {
        DrydockError::engine("docker", err.to_string())
    }
}

/// Result type alias for drydock operations
pub type Result<T> = std::result::Result<T, DrydockError>;
