//! # Container Engine Capability
//!
//! The operations drydock needs from a container engine, as a trait so the
//! lifecycle code can run against Docker or against a fake in tests.
//!
//! [`DockerEngine`] is the production implementation over `bollard`.

pub mod docker;

use crate::constants::DEFAULT_IMAGE_TAG;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::BTreeMap;
use std::fmt;

pub use docker::DockerEngine;

/// Stream of progress events produced by an image pull
pub type PullStream = BoxStream<'static, Result<PullProgress>>;

/// Split an image reference into repository and tag or digest
///
/// A colon before the last `/` belongs to a registry host, so
/// `localhost:5000/postgres` has no tag.
pub fn split_reference(reference: &str) -> (&str, Option<&str>) {
    if let Some((repository, digest)) = reference.split_once('@') {
        return (repository, Some(digest));
    }

    let name_start = reference.rfind('/').map_or(0, |i| i + 1);
    match reference[name_start..].rfind(':') {
        Some(offset) => {
            let colon = name_start + offset;
            (&reference[..colon], Some(&reference[colon + 1..]))
        }
        None => (reference, None),
    }
}

/// `reference` with `:latest` appended when it names neither a tag nor a digest
///
/// The engine lists untagged pulls under `latest`, so presence checks and
/// pulls both use the normalized form.
pub fn normalize_reference(reference: &str) -> String {
    match split_reference(reference) {
        (_, Some(_)) => reference.to_string(),
        (repository, None) => format!("{repository}:{DEFAULT_IMAGE_TAG}"),
    }
}

/// Locally cached image as reported by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSummary {
    pub id: String,
    /// `repository:tag` references pointing at this image
    pub repo_tags: Vec<String>,
    /// `repository@digest` references pointing at this image
    pub repo_digests: Vec<String>,
}

impl ImageSummary {
    pub fn new(id: impl Into<String>, repo_tags: Vec<String>) -> Self {
        Self {
            id: id.into(),
            repo_tags,
            repo_digests: Vec::new(),
        }
    }

    pub fn with_digests(mut self, repo_digests: Vec<String>) -> Self {
        self.repo_digests = repo_digests;
        self
    }

    /// Whether `reference` exactly matches one of the tags or digests
    pub fn has_reference(&self, reference: &str) -> bool {
        self.repo_tags
            .iter()
            .chain(&self.repo_digests)
            .any(|known| known == reference)
    }
}

/// One event from an image pull stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullProgress {
    /// Decoded progress message
    Status {
        id: Option<String>,
        status: Option<String>,
        progress: Option<String>,
    },
    /// A chunk the engine sent that could not be decoded
    Unparsed(String),
}

/// Host publication of a container port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    /// Port inside the container, with protocol, e.g. `5432/tcp`
    pub container_port: String,
    pub host_ip: String,
    pub host_port: u16,
}

/// Everything needed to create a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: BTreeMap<String, String>,
    pub port_bindings: Vec<PortMapping>,
    /// Remove the container once it stops
    pub auto_remove: bool,
}

impl ContainerSpec {
    /// Environment in `KEY=value` form
    pub fn env_pairs(&self) -> Vec<String> {
        self.env.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

/// Engine-assigned identifier of a created container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    id: String,
    name: String,
}

impl ContainerHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Flags for container removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveOptions {
    /// Kill the container if it is running
    pub force: bool,
    /// Remove anonymous volumes attached to the container
    pub remove_volumes: bool,
}

impl RemoveOptions {
    /// Force removal including anonymous volumes
    pub fn purge() -> Self {
        Self {
            force: true,
            remove_volumes: true,
        }
    }
}

/// Operations drydock performs against a container engine
///
/// One engine handle belongs to one instance; implementations need not
/// serialize concurrent calls made through the same instance.
#[async_trait]
pub trait ContainerEngine: Send + Sync + fmt::Debug {
    /// List locally cached images
    async fn list_images(&self) -> Result<Vec<ImageSummary>>;

    /// Start pulling `reference`; the pull is only complete once the stream ends
    fn pull_image(&self, reference: &str) -> PullStream;

    /// Create a container, returning the engine-assigned id
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    async fn remove_container(&self, id: &str, options: RemoveOptions) -> Result<()>;
}
