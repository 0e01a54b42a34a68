//! Fixed-capacity history buffer
//!
//! Every rolling window in Anchorline (emotion history, feedback history,
//! the session intervention log) is a [`BoundedHistory`]. Appending past
//! capacity evicts the oldest entry, so the cap is part of the type rather
//! than something each caller has to remember to slice.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ring buffer with O(1) append and oldest-first eviction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history holding at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, returning the evicted entry if the buffer was full
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };

        self.entries.push_back(entry);
        evicted
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The last `n` entries, oldest first
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &T> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(start)
    }

    /// Keep only entries matching the predicate
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.entries.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_eviction_order() {
        let mut history = BoundedHistory::new(3);
        assert_eq!(history.push(1), None);
        assert_eq!(history.push(2), None);
        assert_eq!(history.push(3), None);
        assert_eq!(history.push(4), Some(1));

        let items: Vec<_> = history.iter().copied().collect();
        assert_eq!(items, vec![2, 3, 4]);
        assert_eq!(history.latest(), Some(&4));
    }

    #[test]
    fn test_last_n() {
        let mut history = BoundedHistory::new(10);
        for i in 0..6 {
            history.push(i);
        }

        let tail: Vec<_> = history.last_n(3).copied().collect();
        assert_eq!(tail, vec![3, 4, 5]);

        let all: Vec<_> = history.last_n(100).copied().collect();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut history = BoundedHistory::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(&"b"));
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(cap in 1usize..64, pushes in 0usize..256) {
            let mut history = BoundedHistory::new(cap);
            for i in 0..pushes {
                history.push(i);
                prop_assert!(history.len() <= cap);
            }
            prop_assert_eq!(history.len(), pushes.min(cap));
            if pushes > 0 {
                prop_assert_eq!(history.latest(), Some(&(pushes - 1)));
            }
        }
    }
}
