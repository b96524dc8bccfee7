// Configuration loader with environment variable substitution

use super::types::*;
use crate::buffer::{MAX_BATCH_SIZE, MAX_RECORDS_IN_BATCH, MAX_RECORD_SIZE};
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<BatcherConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string
    pub fn parse(content: &str) -> Result<BatcherConfig> {
        let content = Self::substitute_env_vars(content)?;

        let config: BatcherConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${STREAM_NAME} -> orders
    /// - ${STREAM_NAME:-events} -> events (if STREAM_NAME not set)
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}")
            .context("Invalid substitution pattern")?;

        let replaced = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    // Keep original if no default and var not found
                    None => format!("${{{}}}", var_name),
                },
            }
        });

        Ok(replaced.into_owned())
    }

    /// Validate configuration
    pub fn validate(config: &BatcherConfig) -> Result<()> {
        if config.producer.stream_name.trim().is_empty() {
            bail!("producer.stream_name cannot be empty");
        }

        let limits = &config.producer.limits;
        if limits.max_records_in_batch == 0 || limits.max_records_in_batch > MAX_RECORDS_IN_BATCH {
            bail!(
                "producer.limits.max_records_in_batch must be 1-{}",
                MAX_RECORDS_IN_BATCH
            );
        }

        if limits.max_batch_size_bytes == 0 || limits.max_batch_size_bytes > MAX_BATCH_SIZE {
            bail!(
                "producer.limits.max_batch_size_bytes must be 1-{}",
                MAX_BATCH_SIZE
            );
        }

        if limits.max_record_size_bytes == 0 || limits.max_record_size_bytes > MAX_RECORD_SIZE {
            bail!(
                "producer.limits.max_record_size_bytes must be 1-{}",
                MAX_RECORD_SIZE
            );
        }

        if limits.max_record_size_bytes > limits.max_batch_size_bytes {
            bail!("producer.limits.max_record_size_bytes cannot exceed max_batch_size_bytes");
        }

        match config.producer.partition_key_strategy.as_str() {
            "timestamp" | "uuid" => {}
            unknown => bail!(
                "Unknown partition_key_strategy: '{}'. Supported: timestamp, uuid",
                unknown
            ),
        }

        match config.endpoint.backend.as_str() {
            "http" => {
                let Some(http) = config.endpoint.backend_config.as_http() else {
                    bail!("http backend selected but http config missing");
                };
                if http.url.is_empty() {
                    bail!("endpoint.http.url cannot be empty");
                }
                if http.timeout_seconds == 0 {
                    bail!("endpoint.http.timeout_seconds must be > 0");
                }
            }
            "filesystem" => {
                if config.endpoint.backend_config.as_filesystem().is_none() {
                    bail!("filesystem backend selected but filesystem config missing");
                }
            }
            unknown => bail!("Unknown backend: '{}'. Supported: http, filesystem", unknown),
        }

        match config.logging.format.as_str() {
            "text" | "json" => {}
            unknown => bail!("Unknown logging.format: '{}'. Supported: text, json", unknown),
        }

        Ok(())
    }
}
