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

// Error types for the producer and its endpoints

use thiserror::Error;

/// Failure surfaced by a remote (or local) stream endpoint
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode endpoint response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("endpoint rejected record: {0}")]
    Rejected(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

/// Errors returned by [`BatchingProducer`](crate::producer::BatchingProducer)
#[derive(Debug, Error)]
pub enum ProducerError {
    /// A single record is larger than the per-record limit and was not buffered
    #[error("record #{index} exceeded max record size of {limit} bytes; size={size}")]
    OversizedRecord {
        index: usize,
        limit: usize,
        size: usize,
    },

    /// A record and its key together are larger than a whole batch may be
    #[error("record #{index} exceeded max batch size of {limit} bytes; size={size} including key")]
    RecordExceedsBatch {
        index: usize,
        limit: usize,
        size: usize,
    },

    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

impl ProducerError {
    pub fn is_oversized(&self) -> bool {
        matches!(
            self,
            ProducerError::OversizedRecord { .. } | ProducerError::RecordExceedsBatch { .. }
        )
    }
}

pub type Result<T, E = ProducerError> = std::result::Result<T, E>;
