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

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use stream_batcher::config::{load_config_with_env, LoggingConfig};
use stream_batcher::{BackendFactory, BatchingProducer, PutRecordsResponse, StreamEndpoint};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Stream Batcher - push newline-delimited records to a stream endpoint
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Stream name (overrides config file)
    #[arg(short, long)]
    stream: Option<String>,

    /// Input file with one record per line; stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Partition key for every record; generated per record when omitted
    #[arg(long)]
    partition_key: Option<String>,

    /// Explicit hash key for every record
    #[arg(long)]
    explicit_hash_key: Option<String>,

    /// Submit records one at a time instead of batching
    #[arg(long)]
    single: bool,

    /// Disable sequence ordering of single-record submissions
    #[arg(long)]
    unordered: bool,
}

type LineReader = Lines<Box<dyn AsyncBufRead + Unpin + Send>>;

#[derive(Debug, Default)]
struct RunStats {
    records: usize,
    batches: usize,
    rejected: u64,
}

impl RunStats {
    fn record_batches(&mut self, responses: &[PutRecordsResponse]) {
        self.batches += responses.len();
        self.rejected += responses
            .iter()
            .map(|r| r.failed_record_count as u64)
            .sum::<u64>();
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match logging.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

async fn open_input(input: Option<&PathBuf>) -> Result<LineReader> {
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    Ok(reader.lines())
}

/// Feed input lines to the producer until EOF or `shutdown` resolves
///
/// Only the wait for the next line races `shutdown`; a submission in progress
/// always completes, so every counted record is either sent or still buffered.
async fn pump<E, R, S>(
    producer: &mut BatchingProducer<E>,
    lines: &mut Lines<R>,
    args: &Args,
    stats: &mut RunStats,
    shutdown: S,
) -> Result<()>
where
    E: StreamEndpoint + ?Sized,
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let partition_key = args.partition_key.as_deref();
    let explicit_hash_key = args.explicit_hash_key.as_deref();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = &mut shutdown => break,
        };
        let Some(line) = line else { break };
        if line.is_empty() {
            continue;
        }

        if args.single {
            let response = producer
                .submit_single(line.into_bytes(), partition_key, explicit_hash_key)
                .await?;
            debug!(
                "Record accepted with sequence number {} on {}",
                response.sequence_number, response.shard_id
            );
        } else {
            let responses = producer
                .submit_many(std::iter::once(line.into_bytes()), partition_key, explicit_hash_key)
                .await?;
            stats.record_batches(&responses);
        }
        stats.records += 1;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration from file
    let mut config = load_config_with_env(&args.config)?;

    // Apply CLI overrides
    if let Some(stream) = &args.stream {
        config.producer.stream_name = stream.clone();
    }
    if args.unordered {
        config.producer.ordered = false;
    }

    init_tracing(&config.logging)?;

    info!("Starting Stream Batcher");
    info!("Loaded configuration from: {:?}", args.config);
    info!("Stream: {}", config.producer.stream_name);
    info!("Endpoint backend: {}", config.endpoint.backend);

    let endpoint = BackendFactory::create(&config.endpoint)?;
    endpoint
        .initialize()
        .await
        .context("Failed to initialize endpoint")?;
    if !endpoint.health_check().await {
        anyhow::bail!("Endpoint '{}' failed its health check", endpoint.endpoint_type());
    }

    let mut producer = BatchingProducer::from_settings(&config.producer, endpoint)?;
    let mut lines = open_input(args.input.as_ref()).await?;
    let mut stats = RunStats::default();

    // Stop reading on Ctrl+C, but still flush what is buffered
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, flushing buffered records");
    };
    pump(&mut producer, &mut lines, &args, &mut stats, shutdown).await?;

    if let Some(response) = producer.flush().await? {
        stats.record_batches(std::slice::from_ref(&response));
    }

    info!(
        "Submitted {} records in {} batches to stream '{}' ({} rejected)",
        stats.records,
        stats.batches,
        producer.stream_name(),
        stats.rejected
    );

    Ok(())
}
