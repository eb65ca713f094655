//! Indexed binary min-heap
//!
//! A priority queue with O(log n) removal of arbitrary items. An index map
//! tracks where every item sits in the heap, so membership tests and removal
//! never scan.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Binary min-heap keyed by priority, lowest first.
///
/// Each item appears at most once; enqueueing an item that is already queued
/// changes its priority instead of adding a duplicate. Items with equal
/// priority dequeue in unspecified order.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T, P = f32> {
    heap: Vec<(T, P)>,
    index: FxHashMap<T, usize>,
}

impl<T, P> PriorityQueue<T, P>
where
    T: Copy + Eq + Hash,
    P: Copy + PartialOrd,
{
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Create an empty queue with room for `capacity` items
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Insert an item, or re-key it if it is already queued.
    pub fn enqueue(&mut self, item: T, priority: P) {
        debug_assert!(
            priority.partial_cmp(&priority).is_some(),
            "unordered priority"
        );

        if let Some(&slot) = self.index.get(&item) {
            let previous = self.heap[slot].1;
            self.heap[slot].1 = priority;
            if priority < previous {
                self.sift_up(slot);
            } else {
                self.sift_down(slot);
            }
            return;
        }

        let slot = self.heap.len();
        self.heap.push((item, priority));
        self.index.insert(item, slot);
        self.sift_up(slot);
    }

    /// Remove and return the item with the lowest priority
    pub fn dequeue(&mut self) -> Option<T> {
        self.dequeue_entry().map(|(item, _)| item)
    }

    /// Remove and return the lowest item together with its priority
    pub fn dequeue_entry(&mut self) -> Option<(T, P)> {
        if self.heap.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    /// Lowest item and its priority, without removing it
    #[must_use]
    pub fn peek(&self) -> Option<(T, P)> {
        self.heap.first().copied()
    }

    /// Remove an arbitrary item, returning its priority.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotQueued`] if the item is absent; the heap is
    /// left untouched.
    pub fn remove(&mut self, item: &T) -> Result<P, QueueError> {
        let slot = *self.index.get(item).ok_or(QueueError::NotQueued)?;
        Ok(self.remove_at(slot).1)
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Current priority of a queued item
    #[must_use]
    pub fn priority_of(&self, item: &T) -> Option<P> {
        self.index.get(item).map(|&slot| self.heap[slot].1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    /// Queued items in heap order (not sorted)
    pub fn items(&self) -> impl Iterator<Item = (T, P)> + '_ {
        self.heap.iter().copied()
    }

    fn remove_at(&mut self, slot: usize) -> (T, P) {
        let removed = self.heap.swap_remove(slot);
        self.index.remove(&removed.0);

        if slot < self.heap.len() {
            // The former last entry now fills the hole and may need to move
            // either way.
            self.index.insert(self.heap[slot].0, slot);
            self.sift_down(slot);
            self.sift_up(slot);
        }
        removed
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.heap[slot].1 < self.heap[parent].1 {
                self.swap(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;

            if left < len && self.heap[left].1 < self.heap[smallest].1 {
                smallest = left;
            }
            if right < len && self.heap[right].1 < self.heap[smallest].1 {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.index.insert(self.heap[a].0, a);
        self.index.insert(self.heap[b].0, b);
    }

    #[cfg(test)]
    fn is_heap(&self) -> bool {
        (1..self.heap.len()).all(|i| self.heap[(i - 1) / 2].1 <= self.heap[i].1)
            && self
                .heap
                .iter()
                .enumerate()
                .all(|(slot, (item, _))| self.index.get(item) == Some(&slot))
            && self.index.len() == self.heap.len()
    }
}

impl<T, P> Default for PriorityQueue<T, P>
where
    T: Copy + Eq + Hash,
    P: Copy + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Errors reported by [`PriorityQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The item is not in the queue
    NotQueued,
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotQueued => write!(f, "Item is not in the queue"),
        }
    }
}

impl std::error::Error for QueueError {}
