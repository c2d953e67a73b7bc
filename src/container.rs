//! # Container Orchestrator
//!
//! Builds the PostgreSQL container definition for an instance and drives the
//! create and start calls. Cleanup of a container that was created but failed
//! to start is left to the owner, which holds the handle.

use crate::constants::{self, env, INTERNAL_PORT_SPEC, PUBLISH_HOST_IP};
use crate::engine::{ContainerEngine, ContainerHandle, ContainerSpec, PortMapping};
use crate::error::Result;
use crate::utils::IdGenerator;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Unique container name: `prefix` followed by a generated token
pub fn container_name(prefix: &str, ids: &dyn IdGenerator) -> String {
    format!("{prefix}{}", ids.generate())
}

/// Definition of a PostgreSQL container publishing 5432 on `host_port`
pub fn postgres_spec(
    name: impl Into<String>,
    image: impl Into<String>,
    host_port: u16,
    password: &str,
    data_dir: &Path,
) -> ContainerSpec {
    let env = BTreeMap::from([
        (env::POSTGRES_PASSWORD.to_string(), password.to_string()),
        (env::PGDATA.to_string(), data_dir.display().to_string()),
    ]);

    ContainerSpec {
        name: name.into(),
        image: image.into(),
        env,
        port_bindings: vec![PortMapping {
            container_port: INTERNAL_PORT_SPEC.to_string(),
            host_ip: PUBLISH_HOST_IP.to_string(),
            host_port,
        }],
        auto_remove: true,
    }
}

/// Create the container; it is not running yet
pub async fn create(engine: &dyn ContainerEngine, spec: &ContainerSpec) -> Result<ContainerHandle> {
    debug!(
        container = %spec.name,
        image = %spec.image,
        internal_port = constants::INTERNAL_PORT,
        "Creating container"
    );

    let id = engine.create_container(spec).await?;
    let handle = ContainerHandle::new(id, spec.name.clone());

    debug!(container = %handle, "Container created");
    Ok(handle)
}

/// Start a created container
pub async fn start(engine: &dyn ContainerEngine, handle: &ContainerHandle) -> Result<()> {
    engine.start_container(handle.id()).await?;
    info!(container = %handle, "starting container for PostgreSQL");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SeededIdGenerator;

    #[test]
    fn test_container_name_uses_prefix_and_token() {
        let ids = SeededIdGenerator::new(7);
        let name = container_name("drydock-", &ids);
        let token = name.strip_prefix("drydock-").unwrap();
        assert!(!token.is_empty());
        assert!(token.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));

        assert_ne!(name, container_name("drydock-", &ids));
    }

    #[test]
    fn test_postgres_spec() {
        let spec = postgres_spec(
            "drydock-abc",
            "postgres:16",
            40001,
            "secret",
            Path::new("/tmp/dock42"),
        );

        assert_eq!(spec.name, "drydock-abc");
        assert_eq!(spec.image, "postgres:16");
        assert!(spec.auto_remove);
        assert_eq!(spec.env["POSTGRES_PASSWORD"], "secret");
        assert_eq!(spec.env["PGDATA"], "/tmp/dock42");
        assert_eq!(
            spec.port_bindings,
            vec![PortMapping {
                container_port: "5432/tcp".to_string(),
                host_ip: "0.0.0.0".to_string(),
                host_port: 40001,
            }]
        );
    }
}
