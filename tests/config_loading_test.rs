//! # Configuration Loading Tests
//!
//! YAML file plus environment layering through the public loader.

use anyhow::Result;
use drydock::config::loader::load_from_sources;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_yaml_file_with_environment_override() -> Result<()> {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    writeln!(
        file,
        "image: postgres:15\n\
         port: 45000\n\
         readiness:\n  \
         timeout_ms: 5000\n\
         database:\n  \
         max_connections: 2\n"
    )?;

    let env = HashMap::from([("DRYDOCK_PORT".to_string(), "45001".to_string())]);
    let config = load_from_sources(Some(file.path()), Some(env))?;

    assert_eq!(config.image, "postgres:15");
    assert_eq!(config.port, Some(45001));
    assert_eq!(config.readiness.timeout(), Duration::from_secs(5));
    assert_eq!(config.readiness.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.database.max_connections, 2);
    assert_eq!(config.database.user, "postgres");
    Ok(())
}

#[test]
fn test_unbounded_pull_from_environment() -> Result<()> {
    let env = HashMap::from([
        ("DRYDOCK_IMAGE".to_string(), "postgres:16".to_string()),
        ("DRYDOCK_PULL_TIMEOUT_SECONDS".to_string(), "0".to_string()),
    ]);
    let config = load_from_sources(None, Some(env))?;

    assert_eq!(config.pull_timeout(), None);
    Ok(())
}

#[test]
fn test_password_from_environment_is_not_reinterpreted() -> Result<()> {
    let env = HashMap::from([
        ("DRYDOCK_IMAGE".to_string(), "postgres:16".to_string()),
        ("DRYDOCK_PASSWORD".to_string(), "007".to_string()),
        ("DRYDOCK_READINESS__POLL_INTERVAL_MS".to_string(), "25".to_string()),
    ]);
    let config = load_from_sources(None, Some(env))?;

    assert_eq!(config.password.as_deref(), Some("007"));
    assert_eq!(config.readiness.poll_interval(), Duration::from_millis(25));
    Ok(())
}
