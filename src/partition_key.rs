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

// Default partition key strategies

use anyhow::{bail, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Produces partition keys for records submitted without one
///
/// Keys only need to be unique enough to spread load across shards;
/// they are not identifiers.
pub trait PartitionKeyGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<F> PartitionKeyGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Wall-clock nanoseconds combined with a per-generator counter
#[derive(Debug, Default)]
pub struct TimestampKeyGenerator {
    counter: AtomicU64,
}

impl TimestampKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PartitionKeyGenerator for TimestampKeyGenerator {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        format!("{}{}", n, nanos)
    }
}

/// Random v4 UUID per key
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidKeyGenerator;

impl PartitionKeyGenerator for UuidKeyGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Build a generator from its configured strategy name ("timestamp" or "uuid")
pub fn from_strategy(name: &str) -> Result<Arc<dyn PartitionKeyGenerator>> {
    match name {
        "timestamp" => Ok(Arc::new(TimestampKeyGenerator::new())),
        "uuid" => Ok(Arc::new(UuidKeyGenerator)),
        unknown => bail!(
            "Unknown partition key strategy: '{}'. Supported: timestamp, uuid",
            unknown
        ),
    }
}
