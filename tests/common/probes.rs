//! Readiness probes with fixed outcomes

use async_trait::async_trait;
use drydock::database::ConnectionSpec;
use drydock::{DrydockError, ReadinessProbe, Result};
use std::sync::atomic::{AtomicU32, Ordering};

/// Probe that succeeds on every attempt
#[derive(Debug, Default)]
pub struct AlwaysReady {
    pub calls: AtomicU32,
}

#[async_trait]
impl ReadinessProbe for AlwaysReady {
    async fn probe(&self, _endpoint: &ConnectionSpec) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Probe that never succeeds
#[derive(Debug, Default)]
pub struct NeverReady {
    pub calls: AtomicU32,
}

#[async_trait]
impl ReadinessProbe for NeverReady {
    async fn probe(&self, endpoint: &ConnectionSpec) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DrydockError::database(
            "probe",
            format!("connection refused at {}", endpoint.endpoint()),
        ))
    }
}
