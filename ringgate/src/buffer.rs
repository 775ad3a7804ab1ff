//! Fixed-capacity circular storage.
//!
//! [`RingBuffer`] has no synchronization of its own. It is only ever touched while the gate's
//! access lock is held, and the gate's permits guarantee that a slot is free before
//! [`RingBuffer::put`] and occupied before [`RingBuffer::get`]. Both operations still report a
//! violated precondition instead of corrupting the ring.

/// Circular buffer with head/tail/count bookkeeping.
#[derive(Debug)]
pub struct RingBuffer<T> {
    storage: Box<[Option<T>]>,
    /// Next index to read.
    head: usize,
    /// Next index to write.
    tail: usize,
    /// Number of occupied slots, always in `0..=capacity`.
    count: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty ring with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be greater than zero");

        let storage = (0..capacity).map(|_| None).collect::<Vec<_>>();

        Self {
            storage: storage.into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Stores `item` at the tail and advances it.
    ///
    /// Returns the item back if every slot is occupied.
    pub fn put(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }

        self.storage[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;

        Ok(())
    }

    /// Removes and returns the item at the head, advancing it.
    ///
    /// Returns `None` if the ring is empty.
    pub fn get(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let item = self.storage[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;

        item
    }

    /// Returns the item at the head without removing it.
    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }

        self.storage[self.head].as_ref()
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Returns whether the bookkeeping is consistent with the slots.
    ///
    /// Checks `count <= capacity`, that the indices are in range, that `tail` trails `head` by
    /// `count` slots and that exactly `count` slots are occupied.
    pub fn invariants_hold(&self) -> bool {
        let capacity = self.capacity();

        self.count <= capacity
            && self.head < capacity
            && self.tail < capacity
            && (self.head + self.count) % capacity == self.tail
            && self.storage.iter().filter(|slot| slot.is_some()).count() == self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_items_in_put_order() {
        let mut ring = RingBuffer::new(3);

        for item in [1, 2, 3] {
            ring.put(item).unwrap();
        }

        assert_eq!(ring.get(), Some(1));
        ring.put(4).unwrap();
        assert_eq!(ring.get(), Some(2));
        assert_eq!(ring.get(), Some(3));
        assert_eq!(ring.get(), Some(4));
        assert_eq!(ring.get(), None);
        assert!(ring.invariants_hold());
    }

    #[test]
    fn test_indices_wrap_around_capacity() {
        let mut ring = RingBuffer::new(2);

        for round in 0..5 {
            ring.put(round).unwrap();
            assert_eq!(ring.get(), Some(round));
            assert!(ring.invariants_hold());
        }

        assert_eq!(ring.head(), 1);
        assert_eq!(ring.tail(), 1);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_put_on_full_ring_hands_item_back() {
        let mut ring = RingBuffer::new(2);
        ring.put("a").unwrap();
        ring.put("b").unwrap();

        assert!(ring.is_full());
        assert_eq!(ring.put("c"), Err("c"));
        assert_eq!(ring.len(), 2);
        assert!(ring.invariants_hold());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut ring = RingBuffer::new(2);
        assert_eq!(ring.peek(), None);

        ring.put(9).unwrap();
        assert_eq!(ring.peek(), Some(&9));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.get(), Some(9));
    }

    #[test]
    fn test_count_stays_within_capacity_under_mixed_operations() {
        let mut ring = RingBuffer::new(4);
        let mut expected = std::collections::VecDeque::new();

        // Deterministic pseudo-random walk over put/get.
        let mut state = 17u32;
        for value in 0..200u32 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            if state % 3 == 0 {
                assert_eq!(ring.get(), expected.pop_front());
            } else if ring.put(value).is_ok() {
                expected.push_back(value);
            }

            assert!(ring.len() <= ring.capacity());
            assert_eq!(ring.len(), expected.len());
            assert!(ring.invariants_hold());
        }
    }

    #[test]
    #[should_panic(expected = "ring capacity must be greater than zero")]
    fn test_zero_capacity_panics() {
        let _ = RingBuffer::<u64>::new(0);
    }
}
