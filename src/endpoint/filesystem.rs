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

// Filesystem endpoint implementation
//
// Appends every accepted record as one JSON line to
// {base_path}/{stream}/records.jsonl. Useful for local development and
// for replaying a stream without a gateway.

use super::backend::StreamEndpoint;
use crate::config::FilesystemEndpointConfig;
use crate::error::EndpointError;
use crate::protocol::{
    Datum, PutRecordRequest, PutRecordResponse, PutRecordsResponse, PutRecordsResultEntry,
    RecordKey,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const RECORDS_FILE: &str = "records.jsonl";

/// One line of a stream's records file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub sequence_number: String,
    pub shard_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_hash_key: Option<String>,
    pub data: Bytes,
}

/// Filesystem endpoint for writing stream records to local disk
pub struct FilesystemEndpoint {
    base_path: PathBuf,
    shard_count: u32,
    // Next sequence number to hand out; guarded so appends stay in sequence order
    next_sequence: Mutex<u64>,
}

impl FilesystemEndpoint {
    pub fn new(config: FilesystemEndpointConfig) -> Result<Self, EndpointError> {
        if config.shard_count == 0 {
            return Err(EndpointError::Rejected(
                "filesystem shard_count must be > 0".to_string(),
            ));
        }

        let base_path = PathBuf::from(&config.base_path);
        info!(
            "Initializing filesystem endpoint at: {}",
            base_path.display()
        );

        let seed = Utc::now().timestamp_micros().max(1) as u64;

        Ok(Self {
            base_path,
            shard_count: config.shard_count,
            next_sequence: Mutex::new(seed),
        })
    }

    /// Get the records file path for a stream
    pub fn records_path(&self, stream_name: &str) -> PathBuf {
        self.base_path
            .join(stream_to_dir_name(stream_name))
            .join(RECORDS_FILE)
    }

    /// Shard a routing key maps to
    fn shard_for(&self, key: &str, explicit: bool) -> String {
        let bucket = match key.parse::<u128>() {
            Ok(hash) if explicit => (hash % self.shard_count as u128) as u64,
            _ => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                hasher.finish() % self.shard_count as u64
            }
        };
        format!("shardId-{:012}", bucket)
    }

    async fn append(&self, stream_name: &str, lines: &[u8]) -> Result<(), EndpointError> {
        let path = self.records_path(stream_name);
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                debug!("Creating stream directory: {}", parent.display());
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(lines).await?;
        file.flush().await?;
        Ok(())
    }

    /// Read back every record stored for a stream, in append order
    pub async fn read_records(&self, stream_name: &str) -> Result<Vec<StoredRecord>, EndpointError> {
        let path = self.records_path(stream_name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(EndpointError::from))
            .collect()
    }
}

/// Convert a stream name to a single directory component
pub fn stream_to_dir_name(stream_name: &str) -> String {
    stream_name
        .trim_start_matches('/')
        .replace('/', "_")
        .replace("..", "_")
}

fn format_sequence(n: u64) -> String {
    format!("{:020}", n)
}

#[async_trait]
impl StreamEndpoint for FilesystemEndpoint {
    async fn initialize(&self) -> Result<(), EndpointError> {
        if !self.base_path.exists() {
            info!("Creating base directory: {}", self.base_path.display());
            fs::create_dir_all(&self.base_path).await?;
        }
        Ok(())
    }

    async fn put_record(
        &self,
        request: PutRecordRequest,
    ) -> Result<PutRecordResponse, EndpointError> {
        let mut next = self.next_sequence.lock().await;

        if let Some(token) = &request.sequence_number_for_ordering {
            let previous: u64 = token.parse().map_err(|_| {
                EndpointError::Rejected(format!("invalid sequence number for ordering: '{}'", token))
            })?;
            if previous >= *next {
                return Err(EndpointError::Rejected(format!(
                    "sequence number for ordering {} is not behind the stream head",
                    token
                )));
            }
        }

        let (shard_id, key_for_shard) = match &request.explicit_hash_key {
            Some(hash_key) => (self.shard_for(hash_key, true), hash_key),
            None => (self.shard_for(&request.partition_key, false), &request.partition_key),
        };
        debug!("Routing key '{}' to {}", key_for_shard, shard_id);

        let stored = StoredRecord {
            sequence_number: format_sequence(*next),
            shard_id,
            partition_key: Some(request.partition_key.clone()),
            explicit_hash_key: request.explicit_hash_key.clone(),
            data: request.data,
        };

        let mut line = serde_json::to_vec(&stored)?;
        line.push(b'\n');
        self.append(&request.stream_name, &line).await?;
        *next += 1;

        Ok(PutRecordResponse {
            sequence_number: stored.sequence_number,
            shard_id: stored.shard_id,
        })
    }

    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Datum],
    ) -> Result<PutRecordsResponse, EndpointError> {
        let mut next = self.next_sequence.lock().await;

        let mut lines = Vec::new();
        let mut results = Vec::with_capacity(records.len());
        for (offset, datum) in records.iter().enumerate() {
            let (shard_id, partition_key, explicit_hash_key) = match &datum.key {
                RecordKey::Partition(key) => (self.shard_for(key, false), Some(key.clone()), None),
                RecordKey::ExplicitHash(key) => (self.shard_for(key, true), None, Some(key.clone())),
            };

            let stored = StoredRecord {
                sequence_number: format_sequence(*next + offset as u64),
                shard_id,
                partition_key,
                explicit_hash_key,
                data: datum.data.clone(),
            };
            serde_json::to_writer(&mut lines, &stored)?;
            lines.push(b'\n');

            results.push(PutRecordsResultEntry {
                sequence_number: Some(stored.sequence_number),
                shard_id: Some(stored.shard_id),
                error_code: None,
                error_message: None,
            });
        }

        self.append(stream_name, &lines).await?;
        *next += records.len() as u64;

        debug!(
            "Appended {} records ({} bytes) to stream '{}'",
            records.len(),
            lines.len(),
            stream_name
        );

        Ok(PutRecordsResponse {
            failed_record_count: 0,
            records: results,
        })
    }

    async fn health_check(&self) -> bool {
        match fs::metadata(&self.base_path).await {
            Ok(metadata) if metadata.is_dir() => {
                let test_file = self.base_path.join(".health_check_test");
                match fs::File::create(&test_file).await {
                    Ok(mut f) => {
                        if let Err(e) = f.write_all(b"test").await {
                            warn!("Health check failed - cannot write: {}", e);
                            return false;
                        }
                        let _ = fs::remove_file(&test_file).await;
                        true
                    }
                    Err(e) => {
                        warn!("Health check failed - cannot create file: {}", e);
                        false
                    }
                }
            }
            Ok(_) => {
                warn!(
                    "Health check failed - base path is not a directory: {}",
                    self.base_path.display()
                );
                false
            }
            Err(e) => {
                warn!(
                    "Health check failed - cannot access base path {}: {}",
                    self.base_path.display(),
                    e
                );
                false
            }
        }
    }

    fn endpoint_type(&self) -> &str {
        "filesystem"
    }
}
