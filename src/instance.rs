//! # Instance
//!
//! A [`Drydock`] is one throwaway PostgreSQL server: a working directory, a
//! host port and a superuser password allocated at construction, and a
//! container created on [`Drydock::start`].
//!
//! ```text
//! Constructed --start--> Started --new_db*--> Started --terminate--> Terminated
//!      |                                                                 ^
//!      +--start fails after create--> Failed ---------terminate----------+
//! ```
//!
//! `Terminated` is absorbing. Calling [`Drydock::terminate`] again is a no-op.

use crate::config::DrydockConfig;
use crate::constants::DATA_DIR_PREFIX;
use crate::container::{self, container_name, postgres_spec};
use crate::database::{
    generate_database_name, ConnectionSpec, DatabaseProvisioner, DatabaseProvisioning,
};
use crate::engine::{normalize_reference, ContainerEngine, ContainerHandle, DockerEngine};
use crate::error::{DrydockError, Result};
use crate::image::ensure_image;
use crate::logging::log_instance_operation;
use crate::readiness::{Clock, PostgresProbe, ReadinessProbe, ReadinessProber, SystemClock};
use crate::teardown::{self, TeardownReport};
use crate::utils::{allocate_port, IdGenerator, ProcessIdGenerator};
use parking_lot::Mutex;
use sqlx::PgPool;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Lifecycle state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Port, password and directory allocated; no container yet
    Constructed,
    /// Container running and accepting connections
    Started,
    /// Start failed after the container was created
    Failed,
    /// Container removed and directory deleted
    Terminated,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstanceState::Constructed => "constructed",
            InstanceState::Started => "started",
            InstanceState::Failed => "failed",
            InstanceState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A disposable PostgreSQL server running in a container
pub struct Drydock {
    config: DrydockConfig,
    data_dir: Option<TempDir>,
    data_path: PathBuf,
    port: u16,
    password: String,
    container: Option<ContainerHandle>,
    engine: Arc<dyn ContainerEngine>,
    ids: Arc<dyn IdGenerator>,
    probe: Arc<dyn ReadinessProbe>,
    clock: Arc<dyn Clock>,
    provisioner: Arc<dyn DatabaseProvisioning>,
    state: InstanceState,
    databases: Mutex<Vec<String>>,
}

impl Drydock {
    /// Instance of `image` with default settings, talking to the local Docker daemon
    pub fn new(image: impl Into<String>) -> Result<Self> {
        Self::from_config(DrydockConfig::new(image))
    }

    /// Instance described by `config`, talking to the local Docker daemon
    pub fn from_config(config: DrydockConfig) -> Result<Self> {
        let engine = DockerEngine::connect()?;
        Self::with_engine(config, Arc::new(engine), ProcessIdGenerator::global())
    }

    /// Instance with an injected engine and identifier source
    ///
    /// Validates `config`, then allocates the port, password and working
    /// directory. An untagged image is resolved to `:latest`. Nothing is sent
    /// to the engine until [`Drydock::start`].
    pub fn with_engine(
        mut config: DrydockConfig,
        engine: Arc<dyn ContainerEngine>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        config.image = normalize_reference(&config.image);

        let port = match config.port {
            Some(port) => port,
            None => allocate_port()?,
        };
        let password = config.password.clone().unwrap_or_else(|| ids.generate());

        let data_dir = tempfile::Builder::new()
            .prefix(DATA_DIR_PREFIX)
            .tempdir()
            .map_err(|e| DrydockError::resource_allocation("data directory", e.to_string()))?;
        let data_path = data_dir.path().to_path_buf();

        let probe = Arc::new(PostgresProbe::new(config.readiness.attempt_timeout()));
        let provisioner = Arc::new(DatabaseProvisioner::new(
            ConnectionSpec::from_settings(&config.database, port, password.clone()),
            config.database.max_connections,
        ));

        log_instance_operation(
            "construct",
            &config.image,
            port,
            None,
            "constructed",
            Some(&data_path.display().to_string()),
        );

        Ok(Self {
            config,
            data_dir: Some(data_dir),
            data_path,
            port,
            password,
            container: None,
            engine,
            ids,
            probe,
            clock: Arc::new(SystemClock),
            provisioner,
            state: InstanceState::Constructed,
            databases: Mutex::new(Vec::new()),
        })
    }

    /// Replace the readiness probe
    pub fn with_probe(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace how databases are created and connected to
    pub fn with_provisioner(mut self, provisioner: Arc<dyn DatabaseProvisioning>) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Replace the clock driving the readiness deadline
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Ensure the image, create and start the container, then wait until
    /// the server accepts connections
    ///
    /// Once the container exists its handle is kept even if a later step
    /// fails, so [`Drydock::terminate`] still removes it.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != InstanceState::Constructed {
            return Err(DrydockError::invalid_state("start", self.state.to_string()));
        }

        ensure_image(
            self.engine.as_ref(),
            &self.config.image,
            self.config.pull_timeout(),
        )
        .await?;

        let name = container_name(&self.config.container_name_prefix, self.ids.as_ref());
        let spec = postgres_spec(
            name,
            self.config.image.clone(),
            self.port,
            &self.password,
            &self.data_path,
        );

        let handle = container::create(self.engine.as_ref(), &spec).await?;
        self.container = Some(handle.clone());

        if let Err(e) = self.launch(&handle).await {
            self.state = InstanceState::Failed;
            log_instance_operation(
                "start",
                &self.config.image,
                self.port,
                Some(handle.id()),
                "failed",
                Some(&e.to_string()),
            );
            return Err(e);
        }

        self.state = InstanceState::Started;
        Ok(())
    }

    async fn launch(&self, handle: &ContainerHandle) -> Result<()> {
        container::start(self.engine.as_ref(), handle).await?;

        let prober = ReadinessProber::new(
            self.probe.clone(),
            self.clock.clone(),
            self.config.readiness.timeout(),
            self.config.readiness.poll_interval(),
        );
        let report = prober.wait_ready(&self.connection_spec(None)).await?;

        log_instance_operation(
            "start",
            &self.config.image,
            self.port,
            Some(handle.id()),
            "ready",
            Some(&format!(
                "{} attempts in {}ms",
                report.attempts,
                report.elapsed.as_millis()
            )),
        );
        Ok(())
    }

    /// Create a database with a generated name and return the name
    pub async fn new_db(&self) -> Result<String> {
        self.ensure_not_terminated("create a database in")?;
        let name = generate_database_name(&self.config.database.name_prefix, self.ids.as_ref());

        self.provisioner.create_named(&name).await?;
        self.databases.lock().push(name.clone());
        Ok(name)
    }

    /// Create a database with a generated name and connect to it
    pub async fn new_db_conn(&self) -> Result<PgPool> {
        let name = generate_database_name(&self.config.database.name_prefix, self.ids.as_ref());
        self.new_db_conn_named(&name).await
    }

    /// Create the database `name` and connect to it
    ///
    /// An existing database of the same name is reported as an error. The
    /// name is recorded once the database exists, even if connecting fails.
    pub async fn new_db_conn_named(&self, name: &str) -> Result<PgPool> {
        self.ensure_not_terminated("create a database in")?;

        self.provisioner.create_named(name).await?;
        self.databases.lock().push(name.to_string());

        self.provisioner.connect(name).await
    }

    fn ensure_not_terminated(&self, operation: &str) -> Result<()> {
        if self.state == InstanceState::Terminated {
            return Err(DrydockError::invalid_state(operation, self.state.to_string()));
        }
        Ok(())
    }

    /// Connection parameters, scoped to `dbname` or administrative when `None`
    pub fn connection_spec(&self, dbname: Option<&str>) -> ConnectionSpec {
        let admin =
            ConnectionSpec::from_settings(&self.config.database, self.port, self.password.clone());
        match dbname {
            Some(name) => admin.for_database(name),
            None => admin,
        }
    }

    /// libpq keyword/value connection string
    pub fn connect_string(&self, dbname: Option<&str>) -> String {
        self.connection_spec(dbname).keyword_string()
    }

    /// `postgres://` URL
    pub fn url(&self, dbname: Option<&str>) -> String {
        self.connection_spec(dbname).url()
    }

    /// JDBC connection string for `dbname`
    pub fn jdbc_connect_string(&self, dbname: &str) -> String {
        self.connection_spec(Some(dbname)).jdbc_url()
    }

    pub fn config(&self) -> &DrydockConfig {
        &self.config
    }

    pub fn image(&self) -> &str {
        &self.config.image
    }

    /// Working directory; deleted on terminate
    pub fn data_dir(&self) -> &Path {
        &self.data_path
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Engine id of the container, once created and until terminated
    pub fn container_id(&self) -> Option<&str> {
        self.container.as_ref().map(ContainerHandle::id)
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Names of databases created through this instance
    pub fn databases(&self) -> Vec<String> {
        self.databases.lock().clone()
    }

    /// Remove the container and delete the working directory
    ///
    /// Never fails; problems are logged. Safe to call before start and more
    /// than once.
    pub async fn terminate(&mut self) -> TeardownReport {
        if self.state == InstanceState::Terminated {
            debug!(port = self.port, "Instance already terminated");
            return TeardownReport::default();
        }

        let handle = self.container.take();
        let report =
            teardown::terminate(self.engine.as_ref(), handle.as_ref(), self.data_dir.take()).await;
        self.state = InstanceState::Terminated;

        log_instance_operation(
            "terminate",
            &self.config.image,
            self.port,
            handle.as_ref().map(ContainerHandle::id),
            "terminated",
            None,
        );
        report
    }
}

impl fmt::Debug for Drydock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drydock")
            .field("image", &self.config.image)
            .field("port", &self.port)
            .field("password", &"[MASKED]")
            .field("data_dir", &self.data_path)
            .field("container", &self.container)
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for Drydock {
    fn drop(&mut self) {
        if let Some(handle) = &self.container {
            warn!(
                container = %handle,
                port = self.port,
                "Instance dropped without terminate; container left running"
            );
        }
    }
}
