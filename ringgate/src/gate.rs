//! Bounded-buffer admission protocol.
//!
//! The [`Gate`] owns the ring together with the produced/consumed counters and coordinates
//! access through three primitives:
//!
//! - `empty_slots`: counting permits for free slots, starting at the ring capacity.
//! - `full_slots`: counting permits for occupied slots, starting at zero.
//! - the access lock: a mutex around [`GateState`], the only way to reach the ring and counters.
//!
//! Both sides acquire their capacity permit first and the access lock second. A producer never
//! waits for a free slot while holding the lock, so it can never block the consumer that would
//! free one.
//!
//! Every admission is cancel safe. Permits are held as guards until the critical section has
//! run, so dropping an admission future before that point hands the permit back untouched. Once
//! the lock is held, the remaining steps are synchronous and always complete.

use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tracing::debug;

use crate::bail;
use crate::buffer::RingBuffer;
use crate::error::{ErrorKind, GateResult};
use crate::types::Item;

/// State guarded by the access lock.
#[derive(Debug)]
struct GateState {
    ring: RingBuffer<Item>,
    /// Regular items inserted so far. Sentinels are never counted.
    total_produced: u64,
    /// Regular items removed so far. Sentinels are never counted.
    total_consumed: u64,
}

impl GateState {
    fn new(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            total_produced: 0,
            total_consumed: 0,
        }
    }
}

/// Outcome of a producer admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Occupied slots right after the insertion.
    pub buffered: usize,
    /// Regular items produced so far, including this one.
    pub total_produced: u64,
}

/// Outcome of a consumer admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// A regular item was removed and counted as consumed.
    Regular {
        item: u64,
        /// Occupied slots right after the removal.
        buffered: usize,
        total_produced: u64,
        total_consumed: u64,
    },
    /// A sentinel sits at the head of the ring.
    ///
    /// It is left in place and the full-slot permit is handed back, so a peer consumer that
    /// acquires the permit observes the same sentinel.
    Shutdown,
}

/// A reserved full-slot permit, obtained before taking the access lock.
///
/// Dropping it without calling [`Gate::take`] returns the permit to the full-slot counter.
#[derive(Debug)]
#[must_use = "a reserved slot does nothing unless passed to `Gate::take`"]
pub struct FullSlot<'a> {
    permit: SemaphorePermit<'a>,
}

/// Production progress as seen under the access lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionStatus {
    /// Whether every expected regular item has been inserted.
    pub produced_all: bool,
    /// Occupied slots, sentinels included.
    pub buffered: usize,
}

impl ProductionStatus {
    /// True when no regular item can ever be removed again.
    pub fn is_exhausted(&self) -> bool {
        self.produced_all && self.buffered == 0
    }
}

/// Point-in-time view of the gate, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSnapshot {
    pub capacity: usize,
    pub buffered: usize,
    pub total_produced: u64,
    pub total_consumed: u64,
    pub empty_permits: usize,
    pub full_permits: usize,
}

impl GateSnapshot {
    /// Whether the permit counters match the ring exactly.
    ///
    /// Only meaningful while no admission is in flight.
    pub fn is_quiescent_consistent(&self) -> bool {
        self.buffered <= self.capacity
            && self.empty_permits + self.full_permits == self.capacity
            && self.full_permits == self.buffered
    }
}

#[derive(Debug)]
struct GateInner {
    empty_slots: Semaphore,
    full_slots: Semaphore,
    state: Mutex<GateState>,
    capacity: usize,
}

/// Shared handle to the bounded buffer and its admission protocol.
#[derive(Debug, Clone)]
pub struct Gate {
    inner: Arc<GateInner>,
}

impl Gate {
    /// Creates a gate around an empty ring of `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(GateInner {
                empty_slots: Semaphore::new(capacity),
                full_slots: Semaphore::new(0),
                state: Mutex::new(GateState::new(capacity)),
                capacity,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Inserts `item` following the producer admission protocol.
    ///
    /// Waits without spinning until a slot is free. Regular items increment `total_produced`
    /// inside the critical section.
    pub async fn put(&self, item: Item) -> GateResult<Insertion> {
        let Ok(empty_permit) = self.inner.empty_slots.acquire().await else {
            bail!(ErrorKind::InvalidState, "Empty-slot counter was closed");
        };

        let mut state = self.inner.state.lock().await;

        if state.ring.put(item).is_err() {
            bail!(
                ErrorKind::InvalidState,
                "Ring full despite a reserved empty slot",
                format!("capacity {}, item {item}", self.inner.capacity)
            );
        }
        if let Item::Regular(_) = item {
            state.total_produced += 1;
        }

        let insertion = Insertion {
            buffered: state.ring.len(),
            total_produced: state.total_produced,
        };
        debug_assert!(state.ring.invariants_hold());

        drop(state);

        // The slot moves from the empty counter to the full counter.
        empty_permit.forget();
        self.inner.full_slots.add_permits(1);

        Ok(insertion)
    }

    /// Reserves a full slot without waiting, returning `None` if no item is available.
    pub fn try_reserve_full(&self) -> Option<FullSlot<'_>> {
        self.inner
            .full_slots
            .try_acquire()
            .ok()
            .map(|permit| FullSlot { permit })
    }

    /// Reserves a full slot, waiting until one is available.
    pub async fn reserve_full(&self) -> GateResult<FullSlot<'_>> {
        match self.inner.full_slots.acquire().await {
            Ok(permit) => Ok(FullSlot { permit }),
            Err(_) => bail!(ErrorKind::InvalidState, "Full-slot counter was closed"),
        }
    }

    /// Takes the head item of the ring for a previously reserved full slot.
    ///
    /// A regular item is removed, counted and its slot released to producers. A sentinel stays
    /// at the head and the reservation goes back to the full-slot counter.
    pub async fn take(&self, slot: FullSlot<'_>) -> GateResult<Removal> {
        let mut state = self.inner.state.lock().await;
        let head = state.ring.peek().copied();

        match head {
            Some(Item::Shutdown) => {
                drop(state);
                // Hands the permit back to the full-slot counter.
                drop(slot);

                Ok(Removal::Shutdown)
            }
            Some(Item::Regular(_)) => {
                let Some(Item::Regular(item)) = state.ring.get() else {
                    bail!(ErrorKind::InvalidState, "Ring head changed under the access lock");
                };
                state.total_consumed += 1;

                let removal = Removal::Regular {
                    item,
                    buffered: state.ring.len(),
                    total_produced: state.total_produced,
                    total_consumed: state.total_consumed,
                };
                debug_assert!(state.ring.invariants_hold());

                drop(state);

                // The slot moves from the full counter to the empty counter.
                slot.permit.forget();
                self.inner.empty_slots.add_permits(1);

                Ok(removal)
            }
            None => {
                bail!(
                    ErrorKind::InvalidState,
                    "Ring empty despite a reserved full slot",
                    format!(
                        "total produced {}, total consumed {}",
                        state.total_produced, state.total_consumed
                    )
                );
            }
        }
    }

    /// Reads production progress under the access lock.
    pub async fn production_status(&self, expected_items: u64) -> ProductionStatus {
        let state = self.inner.state.lock().await;

        ProductionStatus {
            produced_all: state.total_produced >= expected_items,
            buffered: state.ring.len(),
        }
    }

    /// Removes sentinels left at the head of the ring once no consumer is running.
    ///
    /// Stops at the first regular item or when no full slot is available, and returns how many
    /// sentinels were removed. Each removal releases its slot back to producers.
    pub async fn reclaim_sentinels(&self) -> usize {
        let mut reclaimed = 0;

        while let Some(slot) = self.try_reserve_full() {
            let mut state = self.inner.state.lock().await;

            if state.ring.peek() != Some(&Item::Shutdown) {
                break;
            }

            let _ = state.ring.get();
            drop(state);

            slot.permit.forget();
            self.inner.empty_slots.add_permits(1);
            reclaimed += 1;
        }

        debug!(reclaimed, "reclaimed sentinels from the ring");

        reclaimed
    }

    /// Returns a consistent view of the ring and counters.
    pub async fn snapshot(&self) -> GateSnapshot {
        let state = self.inner.state.lock().await;

        GateSnapshot {
            capacity: self.inner.capacity,
            buffered: state.ring.len(),
            total_produced: state.total_produced,
            total_consumed: state.total_consumed,
            empty_permits: self.inner.empty_slots.available_permits(),
            full_permits: self.inner.full_slots.available_permits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_put_then_take_moves_permits() {
        let gate = Gate::new(2);

        let insertion = gate.put(Item::Regular(7)).await.unwrap();
        assert_eq!(
            insertion,
            Insertion {
                buffered: 1,
                total_produced: 1
            }
        );

        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.empty_permits, 1);
        assert_eq!(snapshot.full_permits, 1);
        assert!(snapshot.is_quiescent_consistent());

        let slot = gate.try_reserve_full().unwrap();
        let removal = gate.take(slot).await.unwrap();
        assert_eq!(
            removal,
            Removal::Regular {
                item: 7,
                buffered: 0,
                total_produced: 1,
                total_consumed: 1,
            }
        );

        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.empty_permits, 2);
        assert_eq!(snapshot.full_permits, 0);
        assert!(snapshot.is_quiescent_consistent());
    }

    #[tokio::test]
    async fn test_try_reserve_on_empty_gate_fails() {
        let gate = Gate::new(3);
        assert!(gate.try_reserve_full().is_none());
    }

    #[tokio::test]
    async fn test_put_blocks_while_ring_is_full() {
        let gate = Gate::new(1);
        gate.put(Item::Regular(1)).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), gate.put(Item::Regular(2)));
        assert!(blocked.await.is_err());

        // The cancelled admission must not have leaked its wait or touched the ring.
        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.buffered, 1);
        assert_eq!(snapshot.total_produced, 1);
        assert!(snapshot.is_quiescent_consistent());

        let slot = gate.try_reserve_full().unwrap();
        gate.take(slot).await.unwrap();
        gate.put(Item::Regular(2)).await.unwrap();
        assert_eq!(gate.snapshot().await.total_produced, 2);
    }

    #[tokio::test]
    async fn test_sentinel_stays_at_head_for_peers() {
        let gate = Gate::new(2);
        gate.put(Item::Shutdown).await.unwrap();

        for _ in 0..3 {
            let slot = gate.try_reserve_full().unwrap();
            assert_eq!(gate.take(slot).await.unwrap(), Removal::Shutdown);
        }

        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.buffered, 1);
        assert_eq!(snapshot.full_permits, 1);
        assert_eq!(snapshot.total_produced, 0);
        assert_eq!(snapshot.total_consumed, 0);
    }

    #[tokio::test]
    async fn test_dropped_reservation_returns_permit() {
        let gate = Gate::new(2);
        gate.put(Item::Regular(3)).await.unwrap();

        let slot = gate.try_reserve_full().unwrap();
        assert!(gate.try_reserve_full().is_none());
        drop(slot);

        assert!(gate.try_reserve_full().is_some());
    }

    #[tokio::test]
    async fn test_reclaim_sentinels_restores_empty_ring() {
        let gate = Gate::new(3);
        gate.put(Item::Shutdown).await.unwrap();
        gate.put(Item::Shutdown).await.unwrap();

        assert_eq!(gate.reclaim_sentinels().await, 2);

        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.buffered, 0);
        assert_eq!(snapshot.empty_permits, 3);
        assert_eq!(snapshot.full_permits, 0);
    }

    #[tokio::test]
    async fn test_reclaim_stops_at_regular_item() {
        let gate = Gate::new(3);
        gate.put(Item::Regular(1)).await.unwrap();
        gate.put(Item::Shutdown).await.unwrap();

        assert_eq!(gate.reclaim_sentinels().await, 0);
        assert_eq!(gate.snapshot().await.buffered, 2);
    }

    #[tokio::test]
    async fn test_production_status() {
        let gate = Gate::new(2);
        assert!(!gate.production_status(1).await.produced_all);

        gate.put(Item::Regular(1)).await.unwrap();
        let status = gate.production_status(1).await;
        assert!(status.produced_all);
        assert!(!status.is_exhausted());

        let slot = gate.try_reserve_full().unwrap();
        gate.take(slot).await.unwrap();
        assert!(gate.production_status(1).await.is_exhausted());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admissions_conserve_items() {
        let gate = Gate::new(3);
        let mut tasks = Vec::new();

        for producer in 0..4u64 {
            let gate = gate.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..25 {
                    gate.put(Item::Regular(producer * 100 + i + 1)).await.unwrap();
                }
                Vec::new()
            }));
        }

        for _ in 0..2 {
            let gate = gate.clone();
            tasks.push(tokio::spawn(async move {
                let mut taken = Vec::new();
                while taken.len() < 50 {
                    let slot = gate.reserve_full().await.unwrap();
                    if let Removal::Regular { item, buffered, .. } = gate.take(slot).await.unwrap()
                    {
                        assert!(buffered <= 3);
                        taken.push(item);
                    }
                }
                taken
            }));
        }

        let mut consumed = Vec::new();
        for task in tasks {
            consumed.extend(task.await.unwrap());
        }
        consumed.sort_unstable();

        let mut expected: Vec<u64> = (0..4u64)
            .flat_map(|p| (0..25).map(move |i| p * 100 + i + 1))
            .collect();
        expected.sort_unstable();

        assert_eq!(consumed, expected);

        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.total_produced, 100);
        assert_eq!(snapshot.total_consumed, 100);
        assert!(snapshot.is_quiescent_consistent());
    }
}
