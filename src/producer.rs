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

use crate::buffer::{BatchLimits, PendingBatch};
use crate::config::ProducerSettings;
use crate::endpoint::StreamEndpoint;
use crate::error::{ProducerError, Result};
use crate::partition_key::{self, PartitionKeyGenerator, TimestampKeyGenerator};
use crate::protocol::{
    Datum, PutRecordRequest, PutRecordResponse, PutRecordsResponse, RecordKey,
    INITIAL_SEQUENCE_TOKEN,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

/// Buffers records for one stream and submits them in size/count-bounded batches
///
/// A batch is flushed before an append whenever the buffer already holds
/// `max_records_in_batch` entries, or when the append would push the buffered
/// size past `max_batch_size_bytes`. Whatever remains after a call stays
/// buffered until the next [`flush`](Self::flush).
///
/// In ordered mode, every [`submit_single`](Self::submit_single) carries the
/// sequence number returned by the previous one, so the endpoint keeps those
/// records in submission order.
///
/// All mutating operations take `&mut self`; share a producer between tasks
/// by wrapping it in a lock.
pub struct BatchingProducer<E: ?Sized = dyn StreamEndpoint> {
    stream_name: String,
    ordered: bool,
    ordering_token: String,
    pending: PendingBatch,
    limits: BatchLimits,
    endpoint: Arc<E>,
    key_generator: Arc<dyn PartitionKeyGenerator>,
}

/// Builder for [`BatchingProducer`]
pub struct ProducerBuilder<E: ?Sized> {
    stream_name: String,
    endpoint: Arc<E>,
    ordered: bool,
    limits: BatchLimits,
    key_generator: Arc<dyn PartitionKeyGenerator>,
}

impl<E: StreamEndpoint + ?Sized> ProducerBuilder<E> {
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    pub fn limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn key_generator(mut self, generator: impl PartitionKeyGenerator + 'static) -> Self {
        self.key_generator = Arc::new(generator);
        self
    }

    pub fn shared_key_generator(mut self, generator: Arc<dyn PartitionKeyGenerator>) -> Self {
        self.key_generator = generator;
        self
    }

    pub fn build(self) -> BatchingProducer<E> {
        debug!(
            "Configured producer for stream '{}'; ordered={}",
            self.stream_name, self.ordered
        );

        BatchingProducer {
            stream_name: self.stream_name,
            ordered: self.ordered,
            ordering_token: INITIAL_SEQUENCE_TOKEN.to_string(),
            pending: PendingBatch::new(),
            limits: self.limits,
            endpoint: self.endpoint,
            key_generator: self.key_generator,
        }
    }
}

impl<E: StreamEndpoint + ?Sized> BatchingProducer<E> {
    /// Ordered producer with service limits and timestamp-based default keys
    pub fn new(stream_name: impl Into<String>, endpoint: Arc<E>) -> Self {
        Self::builder(stream_name, endpoint).build()
    }

    pub fn builder(stream_name: impl Into<String>, endpoint: Arc<E>) -> ProducerBuilder<E> {
        ProducerBuilder {
            stream_name: stream_name.into(),
            endpoint,
            ordered: true,
            limits: BatchLimits::default(),
            key_generator: Arc::new(TimestampKeyGenerator::new()),
        }
    }

    /// Create a producer from validated configuration
    pub fn from_settings(settings: &ProducerSettings, endpoint: Arc<E>) -> anyhow::Result<Self> {
        let generator = partition_key::from_strategy(&settings.partition_key_strategy)?;
        Ok(Self::builder(settings.stream_name.clone(), endpoint)
            .ordered(settings.ordered)
            .limits(settings.limits)
            .shared_key_generator(generator)
            .build())
    }

    /// Put a single record, bypassing the buffer
    ///
    /// # Arguments
    /// * `record` - Payload bytes
    /// * `partition_key` - Shard routing key; a generated key is used when absent
    /// * `explicit_hash_key` - Hash value selecting the shard explicitly; sent
    ///   alongside the partition key
    ///
    /// On failure the ordering token is left unchanged.
    pub async fn submit_single(
        &mut self,
        record: impl Into<Bytes>,
        partition_key: Option<&str>,
        explicit_hash_key: Option<&str>,
    ) -> Result<PutRecordResponse> {
        let partition_key = match non_empty(partition_key) {
            Some(key) => key.to_string(),
            None => self.key_generator.generate(),
        };

        let request = PutRecordRequest {
            stream_name: self.stream_name.clone(),
            data: record.into(),
            partition_key,
            explicit_hash_key: non_empty(explicit_hash_key).map(str::to_string),
            sequence_number_for_ordering: self.ordered.then(|| self.ordering_token.clone()),
        };

        let response = self.endpoint.put_record(request).await?;
        if self.ordered {
            self.ordering_token = response.sequence_number.clone();
        }
        Ok(response)
    }

    /// Buffer a sequence of records, flushing whenever a limit would be crossed
    ///
    /// Returns the responses of the flushes this call triggered, in order. Each
    /// record without a caller-supplied key gets its own generated key.
    ///
    /// Fails with [`ProducerError::OversizedRecord`] on the first record larger
    /// than `max_record_size_bytes`, or [`ProducerError::RecordExceedsBatch`]
    /// when payload and key together exceed `max_batch_size_bytes`; that record
    /// and the ones after it are not buffered. Records appended before the failure stay buffered.
    pub async fn submit_many<I>(
        &mut self,
        records: I,
        partition_key: Option<&str>,
        explicit_hash_key: Option<&str>,
    ) -> Result<Vec<PutRecordsResponse>>
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        let partition_key = non_empty(partition_key);
        let explicit_hash_key = non_empty(explicit_hash_key);
        let mut responses = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            // Flush before adding at the count boundary, never after
            if self.pending.is_full(&self.limits) {
                responses.extend(self.flush().await?);
            }

            let data: Bytes = record.into();
            if data.len() > self.limits.max_record_size_bytes {
                return Err(ProducerError::OversizedRecord {
                    index,
                    limit: self.limits.max_record_size_bytes,
                    size: data.len(),
                });
            }

            let key = match (explicit_hash_key, partition_key) {
                (Some(hash_key), _) => RecordKey::ExplicitHash(hash_key.to_string()),
                (None, Some(key)) => RecordKey::Partition(key.to_string()),
                (None, None) => RecordKey::Partition(self.key_generator.generate()),
            };
            let datum = Datum::new(data, key);
            if datum.size() > self.limits.max_batch_size_bytes {
                return Err(ProducerError::RecordExceedsBatch {
                    index,
                    limit: self.limits.max_batch_size_bytes,
                    size: datum.size(),
                });
            }

            if self.pending.would_overflow(datum.size(), &self.limits) {
                responses.extend(self.flush().await?);
            }

            self.pending.push(datum);
        }

        Ok(responses)
    }

    /// Submit everything buffered as one batch
    ///
    /// Returns `None` without contacting the endpoint when nothing is buffered.
    /// The buffer is cleared only after the endpoint accepted the call; on
    /// failure it is left intact so the flush can be retried.
    pub async fn flush(&mut self) -> Result<Option<PutRecordsResponse>> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        let (records, bytes) = self.pending.stats();
        debug!(
            "Flushing {} records ({} bytes) to stream '{}'",
            records, bytes, self.stream_name
        );

        let response = self
            .endpoint
            .put_records(&self.stream_name, self.pending.records())
            .await?;

        if response.failed_record_count > 0 {
            warn!(
                "{} of {} records were rejected by stream '{}'",
                response.failed_record_count, records, self.stream_name
            );
        }

        self.pending.clear();
        Ok(Some(response))
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Sequence number the next ordered `submit_single` will carry
    pub fn ordering_token(&self) -> &str {
        &self.ordering_token
    }

    pub fn limits(&self) -> &BatchLimits {
        &self.limits
    }

    pub fn pending_records(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_bytes(&self) -> usize {
        self.pending.total_size()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn endpoint(&self) -> &Arc<E> {
        &self.endpoint
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
