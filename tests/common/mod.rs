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

// Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use stream_batcher::{
    Datum, EndpointError, PutRecordRequest, PutRecordResponse, PutRecordsResponse,
    PutRecordsResultEntry, StreamEndpoint,
};

/// In-memory endpoint that records every call and can be told to fail
#[derive(Default)]
pub struct RecordingEndpoint {
    singles: Mutex<Vec<PutRecordRequest>>,
    batches: Mutex<Vec<Vec<Datum>>>,
    fail_singles: AtomicUsize,
    fail_batches: AtomicUsize,
    sequence: AtomicU64,
}

impl RecordingEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` single-record calls with a throttling status
    pub fn fail_next_singles(&self, n: usize) {
        self.fail_singles.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` batch calls with a throttling status
    pub fn fail_next_batches(&self, n: usize) {
        self.fail_batches.store(n, Ordering::SeqCst);
    }

    pub fn singles(&self) -> Vec<PutRecordRequest> {
        self.singles.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<Datum>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    /// Every payload accepted through batches, in submission order
    pub fn submitted_payloads(&self) -> Vec<Bytes> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|d| d.data.clone())
            .collect()
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn throttled() -> EndpointError {
        EndpointError::Status {
            status: 503,
            body: "throughput exceeded".to_string(),
        }
    }
}

#[async_trait]
impl StreamEndpoint for RecordingEndpoint {
    async fn put_record(
        &self,
        request: PutRecordRequest,
    ) -> Result<PutRecordResponse, EndpointError> {
        if Self::take_failure(&self.fail_singles) {
            return Err(Self::throttled());
        }

        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.singles.lock().unwrap().push(request);
        Ok(PutRecordResponse {
            sequence_number: format!("{:020}", n),
            shard_id: "shardId-000000000000".to_string(),
        })
    }

    async fn put_records(
        &self,
        _stream_name: &str,
        records: &[Datum],
    ) -> Result<PutRecordsResponse, EndpointError> {
        if Self::take_failure(&self.fail_batches) {
            return Err(Self::throttled());
        }

        let results = records
            .iter()
            .map(|_| {
                let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                PutRecordsResultEntry {
                    sequence_number: Some(format!("{:020}", n)),
                    shard_id: Some("shardId-000000000000".to_string()),
                    ..Default::default()
                }
            })
            .collect();

        self.batches.lock().unwrap().push(records.to_vec());
        Ok(PutRecordsResponse {
            failed_record_count: 0,
            records: results,
        })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn endpoint_type(&self) -> &str {
        "recording"
    }
}

/// Payload of `len` bytes whose content identifies `id`
pub fn payload(id: usize, len: usize) -> Vec<u8> {
    let tag = id.to_le_bytes();
    (0..len).map(|i| tag[i % tag.len()] ^ (i as u8)).collect()
}
