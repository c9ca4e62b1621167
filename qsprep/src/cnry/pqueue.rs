use delegate::delegate;
use priority_queue::DoublePriorityQueue;

use super::state::CnRyState;

/// A min-priority queue of search nodes.
///
/// Nodes are keyed by their label mask and ordered by cost. Ties are broken
/// by insertion order, so the search is deterministic.
#[derive(Debug, Clone, Default)]
pub struct CnRyPQ {
    queue: DoublePriorityQueue<u64, (usize, u64)>,
    next_seq: u64,
}

impl CnRyPQ {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a node, or lower its cost if it is already queued.
    ///
    /// Returns `false` if the node was already queued with an equal or lower
    /// cost, in which case the queue is unchanged.
    pub fn push(&mut self, state: CnRyState) -> bool {
        let mask = state.mask();
        if let Some(&(cost, _)) = self.queue.get_priority(&mask) {
            if cost <= state.cost() {
                return false;
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(mask, (state.cost(), seq));
        true
    }

    /// Pop the cheapest node.
    pub fn pop(&mut self) -> Option<CnRyState> {
        let (mask, (cost, _)) = self.queue.pop_min()?;
        Some(CnRyState::new(mask, cost))
    }

    /// The cost of the cheapest node.
    #[allow(unused)]
    pub fn min_cost(&self) -> Option<usize> {
        self.queue.peek_min().map(|(_, &(cost, _))| cost)
    }

    delegate! {
        to self.queue {
            pub fn len(&self) -> usize;
            #[allow(unused)]
            pub fn is_empty(&self) -> bool;
        }
    }
}
