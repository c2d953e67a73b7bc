//! Configuration Loader
//!
//! Layers an optional YAML file and `DRYDOCK_*` environment variables over the
//! built-in defaults. Nested keys use a double underscore, e.g.
//! `DRYDOCK_READINESS__TIMEOUT_MS=30000`.

use super::error::{ConfigResult, ConfigurationError};
use super::DrydockConfig;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "DRYDOCK";

/// Load configuration from `path` (if given) and the process environment
pub fn load(path: Option<&Path>) -> ConfigResult<DrydockConfig> {
    load_from_sources(path, None)
}

/// Load configuration with an explicit environment map
///
/// When `env` is `None` the process environment is read. Passing a map keeps
/// tests independent of global state.
pub fn load_from_sources(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> ConfigResult<DrydockConfig> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigurationError::config_file_not_found(path));
        }
        debug!(path = %path.display(), "Loading drydock configuration file");
        builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
    }

    // Values stay strings; numeric fields are converted on deserialization so
    // that string fields such as the password keep their exact text.
    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .source(env);

    let config: DrydockConfig = builder
        .add_source(environment)
        .build()?
        .try_deserialize()?;

    config.validate()?;

    debug!(
        config = %sanitize_config_for_logging(&config),
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// JSON rendering of `config` with sensitive fields masked
pub fn sanitize_config_for_logging(config: &DrydockConfig) -> serde_json::Value {
    let mut value = serde_json::json!(config);
    let sensitive_patterns = ["password", "secret", "token", "credential"];
    sanitize_json_recursive(&mut value, &sensitive_patterns);
    value
}

fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                let key_lower = key.to_lowercase();
                let is_sensitive = sensitive_patterns
                    .iter()
                    .any(|pattern| key_lower.contains(pattern));

                if is_sensitive {
                    if !val.is_null() {
                        *val = serde_json::Value::String("[MASKED]".to_string());
                    }
                } else {
                    sanitize_json_recursive(val, sensitive_patterns);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                sanitize_json_recursive(item, sensitive_patterns);
            }
        }
        _ => {}
    }
}
