//! # Database Operations
//!
//! Connection descriptors for a running instance and creation of fresh,
//! uniquely named databases inside it.
//!
//! ## Key Components
//!
//! - [`connection`] - keyword/value, URL and JDBC descriptors plus `sqlx` options
//! - [`naming`] - generation and validation of database names
//! - [`provisioner`] - `CREATE DATABASE` and scoped pools

pub mod connection;
pub mod naming;
pub mod provisioner;

pub use connection::ConnectionSpec;
pub use naming::{generate_database_name, validate_database_name};
pub use provisioner::{DatabaseProvisioner, DatabaseProvisioning};
