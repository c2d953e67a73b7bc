#![allow(dead_code)]

pub mod fake_engine;
pub mod fake_provisioner;
pub mod probes;

pub use fake_engine::*;
pub use fake_provisioner::*;
pub use probes::*;

use drydock::DrydockConfig;
use std::time::Duration;

/// Image reference used throughout the fake-engine tests
pub const TEST_IMAGE: &str = "postgres:16";

/// Configuration with a short readiness deadline for fake-engine tests
pub fn fast_config() -> DrydockConfig {
    DrydockConfig::new(TEST_IMAGE)
        .with_readiness_timeout(Duration::from_millis(300))
        .with_poll_interval(Duration::from_millis(10))
}
