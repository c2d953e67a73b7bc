//! Database provisioning without a server
//!
//! Pools handed out are lazy and never connect unless a test uses them.

use async_trait::async_trait;
use drydock::{DatabaseProvisioning, DrydockError, Result};
use parking_lot::Mutex;
use sqlx::postgres::{PgConnectOptions, PgPool};

#[derive(Debug, Default)]
pub struct FakeProvisioner {
    fail_connect: bool,
    created: Mutex<Vec<String>>,
    connected: Mutex<Vec<String>>,
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create databases but fail every connection to them
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().clone()
    }

    pub fn connected(&self) -> Vec<String> {
        self.connected.lock().clone()
    }
}

#[async_trait]
impl DatabaseProvisioning for FakeProvisioner {
    async fn create_named(&self, name: &str) -> Result<()> {
        drydock::database::validate_database_name(name)?;
        let mut created = self.created.lock();
        if created.iter().any(|existing| existing == name) {
            return Err(DrydockError::database(
                "create_database",
                format!("database \"{name}\" already exists"),
            ));
        }
        created.push(name.to_string());
        Ok(())
    }

    async fn connect(&self, name: &str) -> Result<PgPool> {
        if self.fail_connect {
            return Err(DrydockError::database(
                "connect",
                format!("too many connections for database \"{name}\""),
            ));
        }
        self.connected.lock().push(name.to_string());
        Ok(PgPool::connect_lazy_with(
            PgConnectOptions::new().database(name),
        ))
    }
}
