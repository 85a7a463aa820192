//! Bounded top-k selection: O(n log k) via a min-heap of size k.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use docqa_core::types::SegmentId;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Hit {
    pub score: f32,
    pub id: SegmentId,
    /// Position of the entry inside the index, for cheap lookup.
    pub pos: usize,
}

// Ordering: better = higher score, then lower id. The heap keeps the worst
// candidate on top so it can be evicted in O(log k).
impl Ord for Hit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Hit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Hit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Hit {}

pub(crate) struct TopK {
    k: usize,
    heap: BinaryHeap<std::cmp::Reverse<Hit>>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self { k, heap: BinaryHeap::with_capacity(k + 1) }
    }

    pub fn push(&mut self, score: f32, id: SegmentId, pos: usize) {
        self.heap.push(std::cmp::Reverse(Hit { score, id, pos }));
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    /// Drain into descending-score, ascending-id order.
    pub fn into_sorted(self) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self.heap.into_iter().map(|r| r.0).collect();
        hits.sort_by(|a, b| b.cmp(a));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_k_best() {
        let mut selector = TopK::new(2);
        for (pos, score) in [0.1f32, 0.9, 0.5, 0.7].into_iter().enumerate() {
            selector.push(score, pos, pos);
        }
        let hits = selector.into_sorted();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 3);
    }

    #[test]
    fn equal_scores_order_by_ascending_id() {
        let mut selector = TopK::new(3);
        selector.push(0.5, 2, 2);
        selector.push(0.5, 0, 0);
        selector.push(0.5, 1, 1);
        let ids: Vec<_> = selector.into_sorted().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn k_larger_than_input_returns_everything() {
        let mut selector = TopK::new(10);
        selector.push(0.3, 0, 0);
        selector.push(0.6, 1, 1);
        let hits = selector.into_sorted();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
    }
}
