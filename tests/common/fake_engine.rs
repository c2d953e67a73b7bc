//! In-memory container engine for lifecycle tests
//!
//! Records every call so tests can assert on pulls, created specs and
//! removals without a Docker daemon.

use async_trait::async_trait;
use drydock::engine::{
    ContainerEngine, ContainerSpec, ImageSummary, PullProgress, PullStream, RemoveOptions,
};
use drydock::{DrydockError, Result};
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Everything the fake engine has been asked to do
#[derive(Debug, Default, Clone)]
pub struct FakeEngineState {
    /// Locally cached images
    pub images: Vec<ImageSummary>,
    /// References passed to `pull_image`
    pub pulls: Vec<String>,
    /// Specs passed to `create_container`
    pub created: Vec<ContainerSpec>,
    /// Ids passed to `start_container`
    pub started: Vec<String>,
    /// Ids and flags passed to `remove_container`
    pub removed: Vec<(String, RemoveOptions)>,
}

#[derive(Debug, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeEngineState>>,
    fail_start: bool,
    fail_remove: bool,
    next_id: AtomicU64,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `reference` is already cached
    pub fn with_image(self, reference: &str) -> Self {
        self.state.lock().images.push(ImageSummary::new(
            format!("sha256:{}", reference.len()),
            vec![reference.to_string()],
        ));
        self
    }

    /// Make every `start_container` call fail
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Make every `remove_container` call fail
    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn snapshot(&self) -> FakeEngineState {
        self.state.lock().clone()
    }

    pub fn pull_count(&self) -> usize {
        self.state.lock().pulls.len()
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        Ok(self.state.lock().images.clone())
    }

    fn pull_image(&self, reference: &str) -> PullStream {
        let mut state = self.state.lock();
        state.pulls.push(reference.to_string());
        state.images.push(ImageSummary::new(
            "sha256:pulled",
            vec![reference.to_string()],
        ));

        let events = vec![
            Ok(PullProgress::Status {
                id: Some("layer0".to_string()),
                status: Some("Downloading".to_string()),
                progress: Some("[=====>     ]".to_string()),
            }),
            Ok(PullProgress::Unparsed("{garbled".to_string())),
            Ok(PullProgress::Status {
                id: None,
                status: Some(format!("Status: Downloaded newer image for {reference}")),
                progress: None,
            }),
        ];
        futures::stream::iter(events).boxed()
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let id = format!("fake{:08x}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.state.lock().created.push(spec.clone());
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        if self.fail_start {
            return Err(DrydockError::engine(
                "start_container",
                "driver failed programming external connectivity",
            ));
        }
        self.state.lock().started.push(id.to_string());
        Ok(())
    }

    async fn remove_container(&self, id: &str, options: RemoveOptions) -> Result<()> {
        self.state.lock().removed.push((id.to_string(), options));
        if self.fail_remove {
            return Err(DrydockError::engine(
                "remove_container",
                format!("No such container: {id}"),
            ));
        }
        Ok(())
    }
}
