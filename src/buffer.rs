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

use crate::protocol::Datum;
use serde::{Deserialize, Serialize};

// Service limits for a single batch submission
pub const MAX_RECORDS_IN_BATCH: usize = 500;
pub const MAX_RECORD_SIZE: usize = 1024 * 1024; // 1 MiB
pub const MAX_BATCH_SIZE: usize = 5 * MAX_RECORD_SIZE; // 5 MiB

/// Flush thresholds for a pending batch
///
/// Defaults are the service maxima. Lower values are allowed (see config
/// validation), higher values would be rejected by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    #[serde(default = "default_max_records")]
    pub max_records_in_batch: usize,

    #[serde(default = "default_max_batch_size")]
    pub max_batch_size_bytes: usize,

    #[serde(default = "default_max_record_size")]
    pub max_record_size_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_records_in_batch: MAX_RECORDS_IN_BATCH,
            max_batch_size_bytes: MAX_BATCH_SIZE,
            max_record_size_bytes: MAX_RECORD_SIZE,
        }
    }
}

fn default_max_records() -> usize {
    MAX_RECORDS_IN_BATCH
}
fn default_max_batch_size() -> usize {
    MAX_BATCH_SIZE
}
fn default_max_record_size() -> usize {
    MAX_RECORD_SIZE
}

/// Records waiting for the next batch submission
///
/// `total_size` always equals the sum of [`Datum::size`] over the buffered
/// entries.
#[derive(Debug, Default)]
pub struct PendingBatch {
    records: Vec<Datum>,
    total_size: usize,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, datum: Datum) {
        self.total_size += datum.size();
        self.records.push(datum);
    }

    /// Whether the record count has reached `limits.max_records_in_batch`
    pub fn is_full(&self, limits: &BatchLimits) -> bool {
        self.records.len() >= limits.max_records_in_batch
    }

    /// Whether appending `size` more bytes would exceed the batch size limit
    pub fn would_overflow(&self, size: usize, limits: &BatchLimits) -> bool {
        self.total_size + size > limits.max_batch_size_bytes
    }

    pub fn records(&self) -> &[Datum] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.total_size = 0;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Get statistics as (records, bytes)
    pub fn stats(&self) -> (usize, usize) {
        (self.records.len(), self.total_size)
    }
}
