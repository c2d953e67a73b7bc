#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Drydock
//!
//! Disposable PostgreSQL servers in Docker containers for integration tests.
//!
//! ## Overview
//!
//! Each [`Drydock`] instance owns one container running the official
//! `postgres` image, published on its own host port with its own generated
//! superuser password. Tests ask the instance for freshly created, uniquely
//! named databases and get back a connection pool scoped to each one.
//!
//! ## Lifecycle
//!
//! 1. **Construct**: validate configuration, allocate a host port, a password
//!    and a working directory.
//! 2. **Start**: make sure the image is cached (pulling it if needed), create
//!    and start the container, then poll until the server accepts connections
//!    or the readiness deadline passes.
//! 3. **Use**: create any number of databases with [`Drydock::new_db_conn`].
//! 4. **Terminate**: force-remove the container and delete the working
//!    directory. Failures here are logged, never returned.
//!
//! ## Module Organization
//!
//! - [`config`] - Instance configuration and its YAML/environment loader
//! - [`engine`] - Container engine capability and the Docker implementation
//! - [`image`] - Local image check and pull
//! - [`container`] - Container definition, create and start
//! - [`readiness`] - Bounded readiness polling
//! - [`database`] - Connection descriptors and database creation
//! - [`teardown`] - Best-effort cleanup
//! - [`instance`] - The [`Drydock`] instance tying the above together
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drydock::Drydock;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut dock = Drydock::new("postgres:16")?;
//! dock.start().await?;
//!
//! let pool = dock.new_db_conn().await?;
//! sqlx::query("CREATE TABLE items (id INTEGER PRIMARY KEY)")
//!     .execute(&pool)
//!     .await?;
//!
//! pool.close().await;
//! dock.terminate().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Unit and fake-engine tests need no daemon. Tests that start real
//! containers are ignored by default:
//!
//! ```bash
//! cargo test                    # No Docker required
//! cargo test -- --ignored       # Needs a Docker daemon
//! ```

pub mod config;
pub mod constants;
pub mod container;
pub mod database;
pub mod engine;
pub mod error;
pub mod image;
pub mod instance;
pub mod logging;
pub mod readiness;
pub mod teardown;
pub mod utils;

pub use config::{DatabaseSettings, DrydockConfig, ReadinessConfig};
pub use database::{ConnectionSpec, DatabaseProvisioner, DatabaseProvisioning};
pub use engine::{ContainerEngine, ContainerHandle, DockerEngine};
pub use error::{DrydockError, Result};
pub use image::ImageStatus;
pub use instance::{Drydock, InstanceState};
pub use readiness::{ReadinessProbe, ReadinessReport};
pub use teardown::TeardownReport;
pub use utils::{IdGenerator, ProcessIdGenerator, SeededIdGenerator};
