//! Docker engine implementation over the `bollard` API client.

use super::{
    split_reference, ContainerEngine, ContainerSpec, ImageSummary, PullProgress, PullStream,
    RemoveOptions,
};
use crate::constants::DEFAULT_IMAGE_TAG;
use crate::error::{DrydockError, Result};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::models::{HostConfig, PortBinding};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::debug;

/// Container engine backed by the local Docker daemon
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using `DOCKER_HOST` or the platform's default socket
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| DrydockError::resource_allocation("docker client", e.to_string()))?;
        Ok(Self { docker })
    }

    /// Wrap an existing client
    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }

    fn container_config(spec: &ContainerSpec) -> Config<String> {
        let mut port_bindings = HashMap::new();
        let mut exposed_ports = HashMap::new();
        for mapping in &spec.port_bindings {
            port_bindings.insert(
                mapping.container_port.clone(),
                Some(vec![PortBinding {
                    host_ip: Some(mapping.host_ip.clone()),
                    host_port: Some(mapping.host_port.to_string()),
                }]),
            );
            exposed_ports.insert(mapping.container_port.clone(), HashMap::new());
        }

        Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env_pairs()),
            exposed_ports: Some(exposed_ports),
            tty: Some(false),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                auto_remove: Some(spec.auto_remove),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Pull request for `reference` with repository and tag sent separately
///
/// An empty tag makes the daemon pull every tag of the repository, so a
/// missing one falls back to `latest`.
fn pull_options(reference: &str) -> CreateImageOptions<'static, String> {
    let (repository, tag) = split_reference(reference);
    CreateImageOptions {
        from_image: repository.to_string(),
        tag: tag
            .filter(|tag| !tag.is_empty())
            .unwrap_or(DEFAULT_IMAGE_TAG)
            .to_string(),
        ..Default::default()
    }
}

/// Translate one pull stream item
///
/// Chunks that fail to decode are passed through as `Unparsed` so that a
/// fully drained stream counts as a successful pull.
fn pull_item(
    item: std::result::Result<bollard::models::CreateImageInfo, BollardError>,
) -> Result<PullProgress> {
    match item {
        Ok(info) => Ok(PullProgress::Status {
            id: info.id,
            status: info.status,
            progress: info.progress,
        }),
        Err(err @ BollardError::JsonDataError { .. })
        | Err(err @ BollardError::JsonSerdeError { .. }) => {
            Ok(PullProgress::Unparsed(err.to_string()))
        }
        Err(err) => Err(DrydockError::engine("pull_image", err.to_string())),
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        let options = ListImagesOptions::<String> {
            all: true,
            ..Default::default()
        };

        let images = self
            .docker
            .list_images(Some(options))
            .await
            .map_err(|e| DrydockError::engine("list_images", e.to_string()))?;

        Ok(images
            .into_iter()
            .map(|image| {
                ImageSummary::new(image.id, image.repo_tags).with_digests(image.repo_digests)
            })
            .collect())
    }

    fn pull_image(&self, reference: &str) -> PullStream {
        debug!(image = %reference, "Requesting image pull");
        self.docker
            .create_image(Some(pull_options(reference)), None, None)
            .map(pull_item)
            .boxed()
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), Self::container_config(spec))
            .await
            .map_err(|e| DrydockError::engine("create_container", e.to_string()))?;

        for warning in &response.warnings {
            debug!(container = %spec.name, warning = %warning, "Engine warning on create");
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| DrydockError::engine("start_container", e.to_string()))
    }

    async fn remove_container(&self, id: &str, options: RemoveOptions) -> Result<()> {
        let options = RemoveContainerOptions {
            force: options.force,
            v: options.remove_volumes,
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| DrydockError::engine("remove_container", e.to_string()))
    }
}
