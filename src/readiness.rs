//! # Readiness Prober
//!
//! A started container is not yet a usable server. The prober polls the
//! published endpoint until a connection succeeds or a fixed deadline passes.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Polling --probe ok--> Ready
//! Polling --probe failed, deadline passed--> TimedOut
//! Polling --probe failed, time left--> Polling
//! ```
//!
//! Both the clock and the probe are injected, so the loop can be tested
//! without sockets or containers.

use crate::database::ConnectionSpec;
use crate::error::{DrydockError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// State of the readiness loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Still attempting connections
    Polling,
    /// A connection succeeded
    Ready,
    /// The deadline passed without a successful connection
    TimedOut,
}

impl ProbeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProbeState::Ready | ProbeState::TimedOut)
    }

    /// State after one probe attempt
    pub fn after_attempt(self, succeeded: bool, elapsed: Duration, deadline: Duration) -> Self {
        match self {
            ProbeState::Polling if succeeded => ProbeState::Ready,
            ProbeState::Polling if elapsed >= deadline => ProbeState::TimedOut,
            other => other,
        }
    }
}

/// Time source for the readiness loop
#[async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when slept on or advanced by hand
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.offset.lock() += duration;
    }

    /// Total time advanced so far
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

/// One connection attempt against an endpoint
#[async_trait]
pub trait ReadinessProbe: Send + Sync + fmt::Debug {
    async fn probe(&self, endpoint: &ConnectionSpec) -> Result<()>;
}

/// Probe that opens and closes a PostgreSQL connection
#[derive(Debug, Clone)]
pub struct PostgresProbe {
    attempt_timeout: Duration,
}

impl PostgresProbe {
    pub fn new(attempt_timeout: Duration) -> Self {
        Self { attempt_timeout }
    }
}

#[async_trait]
impl ReadinessProbe for PostgresProbe {
    async fn probe(&self, endpoint: &ConnectionSpec) -> Result<()> {
        let options = endpoint.connect_options()?;
        let conn = tokio::time::timeout(self.attempt_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| DrydockError::database("probe", "connection attempt timed out"))?
            .map_err(|e| DrydockError::database("probe", e.to_string()))?;

        if let Err(e) = conn.close().await {
            debug!(error = %e, "Probe connection did not close cleanly");
        }
        Ok(())
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Polls an endpoint until it accepts connections or the deadline passes
#[derive(Debug, Clone)]
pub struct ReadinessProber {
    probe: Arc<dyn ReadinessProbe>,
    clock: Arc<dyn Clock>,
    deadline: Duration,
    poll_interval: Duration,
}

impl ReadinessProber {
    pub fn new(
        probe: Arc<dyn ReadinessProbe>,
        clock: Arc<dyn Clock>,
        deadline: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            probe,
            clock,
            deadline,
            poll_interval,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Poll `endpoint` until it is ready
    ///
    /// Returns [`DrydockError::ReadinessTimeout`] once the deadline passes.
    pub async fn wait_ready(&self, endpoint: &ConnectionSpec) -> Result<ReadinessReport> {
        let started = self.clock.now();
        let mut state = ProbeState::Polling;
        let mut attempts: u32 = 0;

        while !state.is_terminal() {
            attempts += 1;
            let outcome = self.probe.probe(endpoint).await;
            let elapsed = self.clock.now().saturating_duration_since(started);
            state = state.after_attempt(outcome.is_ok(), elapsed, self.deadline);

            if let Err(e) = outcome {
                debug!(
                    endpoint = %endpoint.endpoint(),
                    attempt = attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "Endpoint not ready"
                );
            }

            if state == ProbeState::Polling && !self.poll_interval.is_zero() {
                let remaining = self.deadline.saturating_sub(elapsed);
                self.clock.sleep(self.poll_interval.min(remaining)).await;
            }
        }

        let elapsed = self.clock.now().saturating_duration_since(started);
        match state {
            ProbeState::Ready => {
                info!(
                    endpoint = %endpoint.endpoint(),
                    attempts = attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "PostgreSQL accepting connections"
                );
                Ok(ReadinessReport { attempts, elapsed })
            }
            _ => Err(DrydockError::readiness_timeout(
                endpoint.endpoint(),
                self.deadline.as_millis() as u64,
                attempts,
            )),
        }
    }
}
