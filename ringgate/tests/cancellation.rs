mod common;

use std::time::Duration;

use ringgate::pipeline::Pipeline;
use ringgate::workers::{ConsumerExit, ProducerState};
use ringgate_config::shared::{DelayRange, PacingConfig};
use ringgate_telemetry::tracing::init_test_tracing;

use crate::common::{run_config, with_timeout};

fn slow_pacing() -> PacingConfig {
    PacingConfig {
        producer_delay: DelayRange::new(20, 30),
        consumer_delay: DelayRange::new(1, 5),
        poll_backoff: DelayRange::new(1, 5),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_run_stops_every_worker() {
    init_test_tracing();

    let mut pipeline = Pipeline::new(run_config(4, 50, slow_pacing()), 3, 2).unwrap();
    pipeline.start().await.unwrap();

    let mut producer_states = pipeline.producer_states();
    producer_states[0]
        .wait_for(|state| matches!(state, ProducerState::Producing { inserted } if *inserted >= 2))
        .await
        .unwrap();

    let summary = with_timeout(pipeline.shutdown_and_wait()).await.unwrap();

    assert!(summary.cancelled);
    assert!(summary.producers.iter().all(|report| report.cancelled));
    assert_eq!(summary.consumer_exits(ConsumerExit::Cancelled), 2);
    assert!(summary.total_produced < summary.expected_items);
    assert!(summary.total_consumed <= summary.total_produced);

    // Whatever was consumed was produced, exactly once.
    let produced = summary.produced_items();
    let consumed = summary.consumed_items();
    assert!(consumed.iter().all(|item| produced.binary_search(item).is_ok()));
    let mut deduplicated = consumed.clone();
    deduplicated.dedup();
    assert_eq!(deduplicated, consumed);

    // Items left behind stay accounted for in the ring.
    let snapshot = summary.final_snapshot;
    assert!(snapshot.is_quiescent_consistent());
    assert_eq!(
        snapshot.buffered as u64,
        summary.total_produced - summary.total_consumed
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_from_another_task_unblocks_wait() {
    init_test_tracing();

    let mut pipeline = Pipeline::new(run_config(2, 50, slow_pacing()), 1, 1).unwrap();
    pipeline.start().await.unwrap();

    let shutdown_tx = pipeline.shutdown_tx();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.shutdown();
    });

    let summary = with_timeout(pipeline.wait()).await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.sentinels_injected, 0);
    assert_eq!(summary.sentinels_reclaimed, 0);
    assert!(summary.final_snapshot.is_quiescent_consistent());
}
