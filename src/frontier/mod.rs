//! Frontier of pending query work.
//!
//! The authority keeps every not-yet-issued [`Warrant`] in a FIFO, which
//! is what makes the chaining breadth-first. The queue is a circular
//! buffer that grows by its initial capacity whenever a push finds it full.
//! It never shrinks and never deduplicates; deduplication is the job of
//! each telecom's visited set.

use crate::crypto::Ciphertext;
use serde::{Deserialize, Serialize};

/// Default initial capacity of the authority's frontier.
pub const DEFAULT_FRONTIER_CAPACITY: usize = 16;

/// What a warrant asks about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarrantPayload {
    /// Seed identifier known to the authority in the clear.
    Plain(String),
    /// Identifier already encrypted for the destination telecom.
    Sealed(Ciphertext),
}

/// One unit of pending query work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warrant {
    pub payload: WarrantPayload,
    /// Index of the telecom that owns the identifier.
    pub destination: usize,
    /// Hops still allowed after this query.
    pub depth: u32,
}

impl Warrant {
    /// Seed warrant for the start of a round.
    pub fn seed(identifier: impl Into<String>, destination: usize, depth: u32) -> Self {
        Self {
            payload: WarrantPayload::Plain(identifier.into()),
            destination,
            depth,
        }
    }

    /// Warrant for a neighbor discovered by a telecom.
    pub fn sealed(ciphertext: Ciphertext, destination: usize, depth: u32) -> Self {
        Self {
            payload: WarrantPayload::Sealed(ciphertext),
            destination,
            depth,
        }
    }
}

/// Auto-growing circular FIFO.
#[derive(Debug, Clone)]
pub struct FrontierQueue<T> {
    slots: Vec<Option<T>>,
    /// Growth increment (the initial capacity).
    size: usize,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> FrontierQueue<T> {
    /// Create a queue with the given initial capacity (at least 1).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let mut slots = Vec::with_capacity(size);
        slots.resize_with(size, || None);
        Self {
            slots,
            size,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Append at the tail, growing the buffer if it is full.
    pub fn push(&mut self, item: T) {
        if self.head == self.tail && self.count > 0 {
            self.grow();
        }
        self.slots[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
    }

    /// Remove from the head. `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        item
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn len(&self) -> usize {
        self.count
    }

    /// Current buffer capacity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Reallocate into `old_len + size` slots, unwrapping the ring so the
    /// head lands at index 0.
    fn grow(&mut self) {
        let old_len = self.slots.len();
        let mut slots = Vec::with_capacity(old_len + self.size);
        slots.extend(self.slots.drain(self.head..));
        slots.extend(self.slots.drain(..));
        slots.resize_with(old_len + self.size, || None);

        self.slots = slots;
        self.head = 0;
        self.tail = old_len;
    }
}

impl<T> Default for FrontierQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTIER_CAPACITY)
    }
}

/// The authority's frontier.
pub type WarrantQueue = FrontierQueue<Warrant>;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pop_empty_returns_none() {
        let mut queue: FrontierQueue<u32> = FrontierQueue::new(4);
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
        // Still usable afterwards
        queue.push(1);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = FrontierQueue::new(4);
        for i in 0..3 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_grows_by_initial_size() {
        let mut queue = FrontierQueue::new(3);
        for i in 0..4 {
            queue.push(i);
        }
        assert_eq!(queue.capacity(), 6);

        for i in 4..7 {
            queue.push(i);
        }
        assert_eq!(queue.capacity(), 9);

        for i in 0..7 {
            assert_eq!(queue.pop(), Some(i));
        }
    }

    #[test]
    fn test_grow_while_wrapped() {
        let mut queue = FrontierQueue::new(3);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.pop(), Some(1));
        queue.push(3);
        queue.push(4); // wraps to slot 0
        queue.push(5); // full with head at 1: grow
        queue.push(6);

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut queue = FrontierQueue::new(0);
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.pop(), Some("a"));
        assert_eq!(queue.pop(), Some("b"));
    }

    #[test]
    fn test_no_deduplication() {
        let mut queue = WarrantQueue::default();
        queue.push(Warrant::seed("A", 0, 2));
        queue.push(Warrant::seed("A", 0, 2));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_seed_warrant() {
        let warrant = Warrant::seed("1234567890", 0, 3);
        assert_eq!(warrant.payload, WarrantPayload::Plain("1234567890".to_string()));
        assert_eq!(warrant.destination, 0);
        assert_eq!(warrant.depth, 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(u32),
        Pop,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => any::<u32>().prop_map(Op::Push),
            1 => Just(Op::Pop),
        ]
    }

    proptest! {
        /// Property: pop order equals push order for any interleaving,
        /// including across grow events
        #[test]
        fn fifo_law_holds(
            size in 1usize..6,
            ops in prop::collection::vec(op_strategy(), 0..200),
        ) {
            let mut queue = FrontierQueue::new(size);
            let mut model = std::collections::VecDeque::new();

            for op in ops {
                match op {
                    Op::Push(v) => {
                        queue.push(v);
                        model.push_back(v);
                    }
                    Op::Pop => {
                        prop_assert_eq!(queue.pop(), model.pop_front());
                    }
                }
                prop_assert_eq!(queue.len(), model.len());
                prop_assert_eq!(queue.is_empty(), model.is_empty());
            }

            while let Some(expected) = model.pop_front() {
                prop_assert_eq!(queue.pop(), Some(expected));
            }
            prop_assert_eq!(queue.pop(), None);
        }
    }
}
