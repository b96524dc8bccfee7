// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration types for stream-batcher

use crate::buffer::BatchLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatcherConfig {
    pub endpoint: EndpointConfig,
    pub producer: ProducerSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoint configuration with backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Backend type: "http", "filesystem"
    pub backend: String,

    /// Backend-specific configuration
    #[serde(flatten)]
    pub backend_config: BackendConfig,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            backend_config: BackendConfig::Http {
                http: HttpEndpointConfig::default(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BackendConfig {
    Http {
        http: HttpEndpointConfig,
    },
    Filesystem {
        filesystem: FilesystemEndpointConfig,
    },
}

impl BackendConfig {
    pub fn as_http(&self) -> Option<&HttpEndpointConfig> {
        match self {
            BackendConfig::Http { http } => Some(http),
            _ => None,
        }
    }

    pub fn as_http_mut(&mut self) -> Option<&mut HttpEndpointConfig> {
        match self {
            BackendConfig::Http { http } => Some(http),
            _ => None,
        }
    }

    pub fn as_filesystem(&self) -> Option<&FilesystemEndpointConfig> {
        match self {
            BackendConfig::Filesystem { filesystem } => Some(filesystem),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpEndpointConfig {
    pub url: String,
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpEndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4567".to_string(),
            api_token: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl HttpEndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemEndpointConfig {
    pub base_path: String,

    /// Number of shards keys are spread across
    #[serde(default = "default_shard_count")]
    pub shard_count: u32,
}

impl Default for FilesystemEndpointConfig {
    fn default() -> Self {
        Self {
            base_path: "/data/streams".to_string(),
            shard_count: default_shard_count(),
        }
    }
}

/// Producer-specific settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProducerSettings {
    pub stream_name: String,

    #[serde(default = "default_ordered")]
    pub ordered: bool,

    /// "timestamp" or "uuid"
    #[serde(default = "default_key_strategy")]
    pub partition_key_strategy: String,

    #[serde(default)]
    pub limits: BatchLimits,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            stream_name: "default-stream".to_string(),
            ordered: default_ordered(),
            partition_key_strategy: default_key_strategy(),
            limits: BatchLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String, // "text", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_timeout() -> u64 { 30 }
fn default_shard_count() -> u32 { 4 }
fn default_ordered() -> bool { true }
fn default_key_strategy() -> String { "timestamp".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
