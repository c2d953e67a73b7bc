//! # Teardown
//!
//! Releases what an instance acquired: the container and the working
//! directory. Every step is attempted regardless of earlier failures, and
//! failures are logged rather than returned.

use crate::engine::{ContainerEngine, ContainerHandle, RemoveOptions};
use crate::logging::log_error;
use std::io::ErrorKind;
use tempfile::TempDir;
use tracing::{debug, info};

/// What teardown managed to release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownReport {
    pub container_removed: bool,
    pub directory_removed: bool,
}

/// Remove the container and delete the working directory
///
/// A missing handle means no container was ever created. A directory that is
/// already gone counts as removed.
pub async fn terminate(
    engine: &dyn ContainerEngine,
    handle: Option<&ContainerHandle>,
    data_dir: Option<TempDir>,
) -> TeardownReport {
    let mut report = TeardownReport::default();

    if let Some(handle) = handle {
        report.container_removed = remove_container(engine, handle).await;
    }

    if let Some(dir) = data_dir {
        report.directory_removed = remove_directory(dir);
    }

    report
}

async fn remove_container(engine: &dyn ContainerEngine, handle: &ContainerHandle) -> bool {
    match engine
        .remove_container(handle.id(), RemoveOptions::purge())
        .await
    {
        Ok(()) => {
            info!(container = %handle, "shut down container for PostgreSQL");
            true
        }
        Err(e) => {
            log_error(
                "teardown",
                "remove_container",
                &e.to_string(),
                Some(handle.name()),
            );
            false
        }
    }
}

fn remove_directory(dir: TempDir) -> bool {
    let path = dir.path().display().to_string();
    match dir.close() {
        Ok(()) => {
            debug!(path = %path, "Removed working directory");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path, "Working directory already gone");
            true
        }
        Err(e) => {
            log_error("teardown", "remove_directory", &e.to_string(), Some(&path));
            false
        }
    }
}
