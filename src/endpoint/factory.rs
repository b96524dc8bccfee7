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

// Endpoint factory for creating stream endpoints from configuration

use super::backend::StreamEndpoint;
use super::filesystem::FilesystemEndpoint;
use super::http::HttpEndpoint;
use crate::config::EndpointConfig;
use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;

pub struct BackendFactory;

impl BackendFactory {
    /// Create stream endpoint from configuration
    pub fn create(config: &EndpointConfig) -> Result<Arc<dyn StreamEndpoint>> {
        match config.backend.as_str() {
            "http" => {
                let endpoint_config = config
                    .backend_config
                    .as_http()
                    .ok_or_else(|| anyhow!("HTTP endpoint config missing"))?;

                let endpoint = HttpEndpoint::new(endpoint_config.clone())
                    .context("Failed to create HTTP endpoint")?;
                Ok(Arc::new(endpoint))
            }

            "filesystem" => {
                let endpoint_config = config
                    .backend_config
                    .as_filesystem()
                    .ok_or_else(|| anyhow!("Filesystem endpoint config missing"))?;

                let endpoint = FilesystemEndpoint::new(endpoint_config.clone())
                    .context("Failed to create filesystem endpoint")?;
                Ok(Arc::new(endpoint))
            }

            unknown => bail!(
                "Unknown endpoint backend: '{}'. Supported: http, filesystem",
                unknown
            ),
        }
    }
}
