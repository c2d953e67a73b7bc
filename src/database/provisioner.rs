//! # Database Provisioner
//!
//! Creates a fresh database inside a running server and hands back a pool
//! scoped to it. [`DatabaseProvisioning`] is the seam an instance talks
//! through; [`DatabaseProvisioner`] implements it over `sqlx`.

use super::connection::ConnectionSpec;
use super::naming::validate_database_name;
use crate::error::{DrydockError, Result};
use crate::logging::log_database_operation;
use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

/// Database creation on one server
#[async_trait]
pub trait DatabaseProvisioning: Send + Sync + fmt::Debug {
    /// Create `name` without connecting to it
    async fn create_named(&self, name: &str) -> Result<()>;

    /// Open a pool scoped to an existing database
    async fn connect(&self, name: &str) -> Result<PgPool>;

    /// Create `name` and return a pool connected to it
    async fn create_database(&self, name: &str) -> Result<PgPool> {
        self.create_named(name).await?;
        self.connect(name).await
    }
}

/// Issues `CREATE DATABASE` against one server
#[derive(Debug, Clone)]
pub struct DatabaseProvisioner {
    admin: ConnectionSpec,
    max_connections: u32,
}

impl DatabaseProvisioner {
    pub fn new(admin: ConnectionSpec, max_connections: u32) -> Self {
        Self {
            admin: admin.admin(),
            max_connections,
        }
    }

    /// Administrative endpoint this provisioner connects to
    pub fn admin_spec(&self) -> &ConnectionSpec {
        &self.admin
    }
}

#[async_trait]
impl DatabaseProvisioning for DatabaseProvisioner {
    /// The administrative connection is closed before returning. On the
    /// success path a failure to close is reported as an error.
    async fn create_named(&self, name: &str) -> Result<()> {
        validate_database_name(name)?;
        let started = Instant::now();

        let mut conn = PgConnection::connect_with(&self.admin.connect_options()?)
            .await
            .map_err(|e| DrydockError::database("connect_admin", e.to_string()))?;

        let statement = format!("CREATE DATABASE {name}");
        if let Err(e) = sqlx::Executor::execute(&mut conn, sqlx::raw_sql(&statement)).await {
            if let Err(close_err) = conn.close().await {
                warn!(error = %close_err, "Failed to close administrative connection");
            }
            return Err(DrydockError::database("create_database", e.to_string()));
        }

        conn.close()
            .await
            .map_err(|e| DrydockError::database("close_admin", e.to_string()))?;

        log_database_operation(
            "create_database",
            name,
            self.admin.port,
            "created",
            Some(started.elapsed().as_millis() as u64),
        );
        Ok(())
    }

    async fn connect(&self, name: &str) -> Result<PgPool> {
        let options = self.admin.for_database(name).connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DrydockError::database("connect", e.to_string()))?;

        debug!(database = %name, port = self.admin.port, "Connected to provisioned database");
        Ok(pool)
    }
}
