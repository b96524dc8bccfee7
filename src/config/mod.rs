// Configuration module for stream-batcher
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BatcherConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<BatcherConfig> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config);
    ConfigLoader::validate(&config)?;
    Ok(config)
}

/// Allow environment variables to override config values
pub fn apply_env_overrides(config: &mut BatcherConfig) {
    if let Ok(stream_name) = std::env::var("STREAM_NAME") {
        config.producer.stream_name = stream_name;
    }

    if let Ok(url) = std::env::var("STREAM_ENDPOINT_URL") {
        if let Some(http) = config.endpoint.backend_config.as_http_mut() {
            http.url = url;
        }
    }

    if let Ok(api_token) = std::env::var("STREAM_API_TOKEN") {
        if let Some(http) = config.endpoint.backend_config.as_http_mut() {
            http.api_token = Some(api_token);
        }
    }
}
