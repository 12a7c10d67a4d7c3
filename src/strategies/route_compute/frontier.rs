use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FrontierEntry {
    cost: f64,
    node: u32,
}

impl Eq for FrontierEntry {}

// Reversed so the max-heap pops the cheapest entry, lower node id first on ties.
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-priority queue of tentative distances with lazy deletion.
#[derive(Debug, Default, Clone)]
pub struct DistanceFrontier {
    heap: BinaryHeap<FrontierEntry>,
}

impl DistanceFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: u32, cost: f64) {
        self.heap.push(FrontierEntry { cost, node });
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pops the cheapest entry the caller does not consider stale.
    pub fn pop_min<F>(&mut self, mut is_stale: F) -> Option<(u32, f64)>
    where
        F: FnMut(u32, f64) -> bool,
    {
        while let Some(FrontierEntry { cost, node }) = self.heap.pop() {
            if !is_stale(node, cost) {
                return Some((node, cost));
            }
        }
        None
    }
}
