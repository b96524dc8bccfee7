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

// Batching producer for streaming data ingestion endpoints
//
// - Buffers records per stream and flushes on count or size limits
// - Rejects records above the per-record size limit
// - Keeps single-record submissions ordered via sequence tokens
// - Submits to an HTTP ingestion gateway or a local directory

pub mod buffer;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod partition_key;
pub mod producer;
pub mod protocol;

// Re-export main types
pub use buffer::{BatchLimits, PendingBatch, MAX_BATCH_SIZE, MAX_RECORDS_IN_BATCH, MAX_RECORD_SIZE};
pub use config::{load_config, load_config_with_env, BatcherConfig};
pub use endpoint::{BackendFactory, FilesystemEndpoint, HttpEndpoint, StreamEndpoint};
pub use error::{EndpointError, ProducerError};
pub use partition_key::{PartitionKeyGenerator, TimestampKeyGenerator, UuidKeyGenerator};
pub use producer::{BatchingProducer, ProducerBuilder};
pub use protocol::{
    Datum, PutRecordRequest, PutRecordResponse, PutRecordsResponse, PutRecordsResultEntry,
    RecordKey,
};
