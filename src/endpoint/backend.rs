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

// Stream endpoint trait

use crate::error::EndpointError;
use crate::protocol::{Datum, PutRecordRequest, PutRecordResponse, PutRecordsResponse};
use async_trait::async_trait;

/// Remote submission interface used by the producer
///
/// Implementations own transport concerns (timeouts, authentication,
/// connection pooling). They do not retry; failures are returned to the
/// producer unchanged.
#[async_trait]
pub trait StreamEndpoint: Send + Sync {
    /// Prepare the destination (create directories, probe the gateway)
    async fn initialize(&self) -> Result<(), EndpointError> {
        Ok(())
    }

    /// Submit a single record
    ///
    /// When `request.sequence_number_for_ordering` is set, the endpoint must
    /// assign a sequence number greater than it.
    async fn put_record(&self, request: PutRecordRequest)
        -> Result<PutRecordResponse, EndpointError>;

    /// Submit a batch of records in order
    ///
    /// # Arguments
    /// * `stream_name` - Target stream
    /// * `records` - Buffered records, never empty when called by the producer
    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Datum],
    ) -> Result<PutRecordsResponse, EndpointError>;

    /// Health check
    async fn health_check(&self) -> bool;

    /// Get endpoint type identifier
    fn endpoint_type(&self) -> &str;
}
