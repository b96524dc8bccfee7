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

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Sequence token carried by an ordered producer before its first submission
pub const INITIAL_SEQUENCE_TOKEN: &str = "0";

/// Shard routing key of a buffered record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKey {
    #[serde(rename = "partition_key")]
    Partition(String),
    #[serde(rename = "explicit_hash_key")]
    ExplicitHash(String),
}

impl RecordKey {
    pub fn as_str(&self) -> &str {
        match self {
            RecordKey::Partition(key) | RecordKey::ExplicitHash(key) => key,
        }
    }

    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// One buffered record: payload plus exactly one routing key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datum {
    pub data: Bytes,
    #[serde(flatten)]
    pub key: RecordKey,
}

impl Datum {
    pub fn new(data: impl Into<Bytes>, key: RecordKey) -> Self {
        Self {
            data: data.into(),
            key,
        }
    }

    /// Size counted against the batch limit (payload plus key bytes)
    pub fn size(&self) -> usize {
        self.data.len() + self.key.len()
    }
}

/// Single-record submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRecordRequest {
    pub stream_name: String,
    pub data: Bytes,
    pub partition_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_hash_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number_for_ordering: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRecordResponse {
    pub sequence_number: String,
    pub shard_id: String,
}

/// Per-record outcome inside a batch response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRecordsResultEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PutRecordsResultEntry {
    pub fn is_success(&self) -> bool {
        self.error_code.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRecordsResponse {
    #[serde(default)]
    pub failed_record_count: u32,
    pub records: Vec<PutRecordsResultEntry>,
}
