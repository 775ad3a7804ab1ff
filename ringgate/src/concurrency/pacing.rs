use std::time::Duration;

use rand::Rng;
use ringgate_config::shared::DelayRange;
use tokio::time::sleep;

use crate::concurrency::shutdown::ShutdownRx;

/// How a suspension ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    Elapsed,
    Cancelled,
}

impl Suspension {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Suspension::Cancelled)
    }
}

/// Samples a uniformly distributed duration from `range`.
pub fn sample_delay(range: &DelayRange) -> Duration {
    if range.min_ms >= range.max_ms {
        return range.min();
    }

    let millis = rand::rng().random_range(range.min_ms..=range.max_ms);
    Duration::from_millis(millis)
}

/// Suspends the current task for a random duration within `range`.
///
/// Returns early with [`Suspension::Cancelled`] if cancellation is requested before or during
/// the wait. A zero duration still yields to the scheduler so that polling loops cannot starve
/// other tasks.
pub async fn suspend(range: &DelayRange, shutdown_rx: &ShutdownRx) -> Suspension {
    if shutdown_rx.is_shutdown() {
        return Suspension::Cancelled;
    }

    let delay = sample_delay(range);
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return Suspension::Elapsed;
    }

    tokio::select! {
        _ = sleep(delay) => Suspension::Elapsed,
        _ = shutdown_rx.wait_for_shutdown() => Suspension::Cancelled,
    }
}
