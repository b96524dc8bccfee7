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

// HTTP ingestion gateway endpoint
//
// Single record:  POST {url}/streams/{stream}/records
//   body: raw payload
//   x-partition-key, x-explicit-hash-key, x-sequence-number-for-ordering
//
// Batch:          POST {url}/streams/{stream}/batch
//   body: {"records": [{"data": [..bytes..], "partition_key" | "explicit_hash_key": ".."}, ..]}
//
// Both respond with JSON (PutRecordResponse / PutRecordsResponse).

use super::backend::StreamEndpoint;
use crate::config::HttpEndpointConfig;
use crate::error::EndpointError;
use crate::protocol::{Datum, PutRecordRequest, PutRecordResponse, PutRecordsResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Request, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const PARTITION_KEY_HEADER: &str = "x-partition-key";
pub const EXPLICIT_HASH_KEY_HEADER: &str = "x-explicit-hash-key";
pub const SEQUENCE_FOR_ORDERING_HEADER: &str = "x-sequence-number-for-ordering";

/// JSON body of a batch submission
#[derive(Serialize)]
struct PutRecordsBody<'a> {
    records: &'a [Datum],
}

/// Client for an HTTP stream ingestion gateway
pub struct HttpEndpoint {
    client: Client,
    base_url: Url,
}

impl HttpEndpoint {
    pub fn new(config: HttpEndpointConfig) -> Result<Self, EndpointError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| EndpointError::Rejected(format!("invalid endpoint url '{}': {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(EndpointError::Rejected(format!(
                "endpoint url '{}' cannot be a base",
                config.url
            )));
        }

        let mut client_builder = reqwest::ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout());

        // Add API token if provided
        if let Some(token) = &config.api_token {
            let mut headers = HeaderMap::new();
            let auth_value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|_| EndpointError::InvalidHeader("API token".to_string()))?,
            );
            client_builder = client_builder.default_headers(headers);
        }

        let client = client_builder.build()?;

        Ok(Self { client, base_url })
    }

    fn stream_url(&self, stream_name: &str, action: &str) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["streams", stream_name, action]);
        }
        url
    }

    /// Build the single-record request without sending it
    pub fn build_put_record(&self, request: &PutRecordRequest) -> Result<Request, EndpointError> {
        let mut headers = HeaderMap::new();
        headers.insert(PARTITION_KEY_HEADER, header_value(&request.partition_key)?);
        if let Some(hash_key) = &request.explicit_hash_key {
            headers.insert(EXPLICIT_HASH_KEY_HEADER, header_value(hash_key)?);
        }
        if let Some(seq) = &request.sequence_number_for_ordering {
            headers.insert(SEQUENCE_FOR_ORDERING_HEADER, header_value(seq)?);
        }

        let request = self
            .client
            .post(self.stream_url(&request.stream_name, "records"))
            .header(CONTENT_TYPE, "application/octet-stream")
            .headers(headers)
            .body(request.data.clone())
            .build()?;
        Ok(request)
    }

    /// Build the batch request without sending it
    pub fn build_put_records(
        &self,
        stream_name: &str,
        records: &[Datum],
    ) -> Result<Request, EndpointError> {
        let request = self
            .client
            .post(self.stream_url(stream_name, "batch"))
            .json(&PutRecordsBody { records })
            .build()?;
        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(&self, request: Request) -> Result<T, EndpointError> {
        let url = request.url().clone();
        let response = self.client.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Failed to read error body from {}: {}", url, e);
                    String::new()
                }
            };
            debug!("Request to {} failed with status {}", url, status);
            return Err(EndpointError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, EndpointError> {
    HeaderValue::from_str(value).map_err(|_| EndpointError::InvalidHeader(value.to_string()))
}

#[async_trait]
impl StreamEndpoint for HttpEndpoint {
    async fn put_record(
        &self,
        request: PutRecordRequest,
    ) -> Result<PutRecordResponse, EndpointError> {
        let http_request = self.build_put_record(&request)?;
        self.execute(http_request).await
    }

    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Datum],
    ) -> Result<PutRecordsResponse, EndpointError> {
        let http_request = self.build_put_records(stream_name, records)?;
        self.execute(http_request).await
    }

    async fn health_check(&self) -> bool {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("health");
        }

        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Health check failed with status: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Health check error: {}", e);
                false
            }
        }
    }

    fn endpoint_type(&self) -> &str {
        "http"
    }
}
