//! # Constants
//!
//! Fixed values shared across the instance lifecycle.

use std::time::Duration;

/// Port the PostgreSQL server listens on inside the container
pub const INTERNAL_PORT: u16 = 5432;

/// Protocol-qualified internal port, as the engine API expects it
pub const INTERNAL_PORT_SPEC: &str = "5432/tcp";

/// Host interface published container ports are bound to
pub const PUBLISH_HOST_IP: &str = "0.0.0.0";

/// Tag assumed for image references that name neither a tag nor a digest
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Prefix for container names so orphans can be found and removed by hand
pub const CONTAINER_NAME_PREFIX: &str = "drydock-";

/// Prefix for generated database names
pub const DATABASE_NAME_PREFIX: &str = "db_";

/// Prefix for the per-instance working directory
pub const DATA_DIR_PREFIX: &str = "dock";

/// Superuser created by the official postgres image
pub const DEFAULT_SUPERUSER: &str = "postgres";

/// Host clients use to reach the published port
pub const DEFAULT_HOST: &str = "localhost";

/// SSL mode for connections to the throwaway server
pub const DEFAULT_SSL_MODE: &str = "disable";

/// Environment variables understood by the postgres image
pub mod env {
    pub const POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";
    pub const PGDATA: &str = "PGDATA";
}

/// Timing defaults
pub mod timing {
    use super::Duration;

    /// How long the readiness loop keeps polling before giving up
    pub const READINESS_TIMEOUT: Duration = Duration::from_secs(10);

    /// Pause between readiness attempts
    pub const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Upper bound on a single readiness connection attempt
    pub const READINESS_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Upper bound on draining an image pull
    pub const PULL_TIMEOUT: Duration = Duration::from_secs(600);
}

/// PostgreSQL limit on identifier length in bytes
pub const MAX_IDENTIFIER_LEN: usize = 63;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_spec_matches_internal_port() {
        assert_eq!(INTERNAL_PORT_SPEC, format!("{INTERNAL_PORT}/tcp"));
    }

    #[test]
    fn test_readiness_defaults() {
        assert_eq!(timing::READINESS_TIMEOUT, Duration::from_secs(10));
        assert!(timing::READINESS_POLL_INTERVAL < timing::READINESS_TIMEOUT);
    }
}
