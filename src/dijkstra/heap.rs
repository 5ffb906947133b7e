// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

const ABSENT: usize = usize::MAX;

/// Binary min-heap of node ids, ordered by externally stored keys (tentative distances).
///
/// Alongside the heap array, the position of every queued node is kept in `slots`,
/// so that [IndexedMinHeap::decrease_key] can move an entry in place in O(log n).
/// The keys are passed into every operation instead of being owned, as they are
/// the distance vector of the search itself.
#[derive(Debug, Clone, Default)]
pub(super) struct IndexedMinHeap {
    items: Vec<usize>,
    slots: Vec<usize>,
}

impl IndexedMinHeap {
    /// Creates an empty heap able to hold node ids in `0..capacity`.
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::default(),
            slots: vec![ABSENT; capacity],
        }
    }

    #[inline]
    pub(super) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub(super) fn contains(&self, item: usize) -> bool {
        self.slots[item] != ABSENT
    }

    /// Removes all entries, in time proportional to the number of entries.
    pub(super) fn clear(&mut self) {
        for &item in &self.items {
            self.slots[item] = ABSENT;
        }
        self.items.clear();
    }

    /// Adds a node which is not yet in the heap.
    pub(super) fn push(&mut self, item: usize, keys: &[u64]) {
        debug_assert!(!self.contains(item));
        let pos = self.items.len();
        self.items.push(item);
        self.slots[item] = pos;
        self.sift_up(pos, keys);
    }

    /// Restores the heap order after the key of a queued node was lowered.
    ///
    /// Keys may only decrease, thus the entry only ever moves towards the root.
    pub(super) fn decrease_key(&mut self, item: usize, keys: &[u64]) {
        debug_assert!(self.contains(item));
        self.sift_up(self.slots[item], keys);
    }

    /// Either pushes a node, or moves its existing entry after its key was lowered.
    pub(super) fn push_or_decrease(&mut self, item: usize, keys: &[u64]) {
        if self.contains(item) {
            self.decrease_key(item, keys);
        } else {
            self.push(item, keys);
        }
    }

    /// Removes and returns the node with the smallest key.
    pub(super) fn pop(&mut self, keys: &[u64]) -> Option<usize> {
        let top = *self.items.first()?;
        let last = self.items.len() - 1;
        self.swap(0, last);
        self.items.pop();
        self.slots[top] = ABSENT;

        if !self.items.is_empty() {
            self.sift_down(0, keys);
        }

        Some(top)
    }

    fn sift_up(&mut self, mut pos: usize, keys: &[u64]) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if keys[self.items[pos]] >= keys[self.items[parent]] {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize, keys: &[u64]) {
        let len = self.items.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && keys[self.items[left]] < keys[self.items[smallest]] {
                smallest = left;
            }
            if right < len && keys[self.items[right]] < keys[self.items[smallest]] {
                smallest = right;
            }
            if smallest == pos {
                break;
            }

            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
        self.slots[self.items[a]] = a;
        self.slots[self.items[b]] = b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn check_invariants(h: &IndexedMinHeap, keys: &[u64]) {
        for (pos, &item) in h.items.iter().enumerate() {
            assert_eq!(h.slots[item], pos);
            if pos > 0 {
                assert!(keys[h.items[(pos - 1) / 2]] <= keys[item]);
            }
        }
        let queued = h.slots.iter().filter(|&&s| s != ABSENT).count();
        assert_eq!(queued, h.items.len());
    }

    #[test]
    fn pops_in_key_order() {
        let keys: [u64; 6] = [5, 3, 9, 1, 7, 3];
        let mut h = IndexedMinHeap::with_capacity(keys.len());
        for item in 0..keys.len() {
            h.push(item, &keys);
            check_invariants(&h, &keys);
        }

        let mut popped = Vec::default();
        while let Some(item) = h.pop(&keys) {
            check_invariants(&h, &keys);
            popped.push(keys[item]);
        }
        assert_eq!(popped, vec![1, 3, 3, 5, 7, 9]);
        assert!(h.is_empty());
    }

    #[test]
    fn decrease_key_moves_entry_up() {
        let mut keys: [u64; 4] = [10, 20, 30, 40];
        let mut h = IndexedMinHeap::with_capacity(keys.len());
        for item in 0..keys.len() {
            h.push(item, &keys);
        }

        keys[3] = 5;
        h.decrease_key(3, &keys);
        check_invariants(&h, &keys);
        assert_eq!(h.pop(&keys), Some(3));

        keys[2] = 15;
        h.push_or_decrease(2, &keys);
        check_invariants(&h, &keys);
        assert_eq!(h.pop(&keys), Some(0));
        assert_eq!(h.pop(&keys), Some(2));
        assert_eq!(h.pop(&keys), Some(1));
        assert_eq!(h.pop(&keys), None);
    }

    #[test]
    fn clear() {
        let keys: [u64; 3] = [1, 2, 3];
        let mut h = IndexedMinHeap::with_capacity(keys.len());
        h.push(0, &keys);
        h.push(2, &keys);
        h.clear();

        assert!(h.is_empty());
        assert!(!h.contains(0));
        assert!(!h.contains(2));
        h.push(2, &keys);
        assert_eq!(h.pop(&keys), Some(2));
    }

    #[test]
    fn random_operations() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut keys = vec![u64::MAX; 200];
        let mut h = IndexedMinHeap::with_capacity(keys.len());
        let mut last_popped: u64 = 0;

        for _ in 0..2000 {
            let item = rng.gen_range(0..keys.len());
            let key = rng.gen_range(last_popped..last_popped + 1000);
            if key < keys[item] {
                keys[item] = key;
                h.push_or_decrease(item, &keys);
            }
            check_invariants(&h, &keys);

            if rng.gen_bool(0.3) {
                if let Some(item) = h.pop(&keys) {
                    assert!(keys[item] >= last_popped);
                    last_popped = keys[item];
                    keys[item] = u64::MAX;
                }
            }
        }
    }
}
