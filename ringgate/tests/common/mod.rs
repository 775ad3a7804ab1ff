#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use ringgate::pipeline::Pipeline;
use ringgate::report::RunSummary;
use ringgate_config::shared::{BufferConfig, DelayRange, PacingConfig, RunConfig, WorkersConfig};

/// Upper bound for a whole run in tests, so that a hang fails instead of blocking forever.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(20);

/// Pacing in the low milliseconds, enough to interleave workers without slowing tests down.
pub fn fast_pacing() -> PacingConfig {
    PacingConfig {
        producer_delay: DelayRange::new(0, 2),
        consumer_delay: DelayRange::new(0, 2),
        poll_backoff: DelayRange::new(1, 2),
    }
}

pub fn run_config(capacity: usize, items_per_producer: u64, pacing: PacingConfig) -> RunConfig {
    RunConfig {
        buffer: BufferConfig { capacity },
        workers: WorkersConfig {
            items_per_producer,
            max_producers: 5,
            max_consumers: capacity.min(5),
        },
        pacing,
    }
}

/// Sorted items every producer of a run is expected to insert.
pub fn expected_items(producers: u64, items_per_producer: u64) -> Vec<u64> {
    let mut items: Vec<u64> = (1..=producers)
        .flat_map(|p| (0..items_per_producer).map(move |i| p * items_per_producer + i + 1))
        .collect();
    items.sort_unstable();

    items
}

pub async fn with_timeout<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(RUN_TIMEOUT, future)
        .await
        .expect("run did not complete in time")
}

/// Starts `pipeline` and waits for it to complete.
pub async fn run_to_completion(mut pipeline: Pipeline) -> RunSummary {
    pipeline.start().await.unwrap();
    with_timeout(pipeline.wait()).await.unwrap()
}
