//! # Image Provisioner
//!
//! Makes sure an image is cached locally before a container is created from
//! it. A pull is finished only when its progress stream has been drained to
//! the end.

use crate::engine::{normalize_reference, ContainerEngine, PullProgress, PullStream};
use crate::error::{DrydockError, Result};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What `ensure_image` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// Already cached, nothing pulled
    Present,
    /// Pulled; `events` progress events were drained, `unparsed` of them undecodable
    Pulled { events: usize, unparsed: usize },
}

/// Whether an image matching `reference` by tag or digest is cached locally
///
/// An untagged reference is looked up as `:latest`.
pub async fn has_image(engine: &dyn ContainerEngine, reference: &str) -> Result<bool> {
    let reference = normalize_reference(reference);
    let images = engine.list_images().await?;
    Ok(images.iter().any(|image| image.has_reference(&reference)))
}

/// Ensure `reference` is available, pulling it if needed
///
/// With `pull_timeout` set, a pull that has not finished in time fails with
/// [`DrydockError::PullTimeout`]. With `None` the pull runs until the engine
/// closes the stream.
pub async fn ensure_image(
    engine: &dyn ContainerEngine,
    reference: &str,
    pull_timeout: Option<Duration>,
) -> Result<ImageStatus> {
    let reference = normalize_reference(reference);
    let reference = reference.as_str();

    if has_image(engine, reference).await? {
        debug!(image = %reference, "Image present locally, skipping pull");
        return Ok(ImageStatus::Present);
    }

    info!(image = %reference, "pulling '{}' from registry", reference);
    let started = Instant::now();
    let stream = engine.pull_image(reference);

    let status = match pull_timeout {
        Some(limit) => tokio::time::timeout(limit, drain(stream))
            .await
            .map_err(|_| DrydockError::pull_timeout(reference, limit.as_secs()))??,
        None => drain(stream).await?,
    };

    info!(
        image = %reference,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Image pull complete"
    );

    Ok(status)
}

/// Consume a pull stream to its end
async fn drain(mut stream: PullStream) -> Result<ImageStatus> {
    let mut events = 0;
    let mut unparsed = 0;

    while let Some(item) = stream.next().await {
        events += 1;
        match item? {
            PullProgress::Status {
                id,
                status,
                progress,
            } => {
                debug!(
                    layer = id.as_deref(),
                    status = status.as_deref(),
                    progress = progress.as_deref(),
                    "Pull progress"
                );
            }
            PullProgress::Unparsed(raw) => {
                unparsed += 1;
                debug!(raw = %raw, "Undecodable pull progress chunk");
            }
        }
    }

    Ok(ImageStatus::Pulled { events, unparsed })
}
