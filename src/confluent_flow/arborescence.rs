use crate::confluent_flow::reduction::ReductionStats;
use num_traits::NumAssign;
use std::collections::BTreeMap;

/// In-tree rooted at a node adjacent to the sink.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Arborescence<Flow> {
    pub color: usize,
    pub congestion: Flow,
    /// `(tail, head)` arcs in the order the tails joined the tree.
    pub tree_arcs: Vec<(usize, usize)>,
}

impl<Flow> Arborescence<Flow> {
    pub fn new(color: usize, congestion: Flow) -> Self {
        Self::with_arcs(color, congestion, Vec::new())
    }

    pub fn with_arcs(color: usize, congestion: Flow, tree_arcs: Vec<(usize, usize)>) -> Self {
        Arborescence { color, congestion, tree_arcs }
    }

    #[inline]
    pub fn num_members(&self) -> usize {
        self.tree_arcs.len() + 1
    }
}

/// A confluent flow: every node that delivers demand forwards all of it along
/// a single arc, so the routes form a forest of arborescences whose roots are
/// the neighbors of the sink.
#[derive(Debug, Clone)]
pub struct ConfluentFlow<Flow> {
    sink: usize,
    arborescences: BTreeMap<usize, Arborescence<Flow>>,
    next_hops: BTreeMap<usize, usize>,
    requested: Flow,
    delivered: Flow,
    stats: ReductionStats,
}

impl<Flow> ConfluentFlow<Flow>
where
    Flow: NumAssign + Ord + Copy,
{
    pub(crate) fn assemble(sink: usize, arborescences: BTreeMap<usize, Arborescence<Flow>>, requested: Flow, delivered: Flow, stats: ReductionStats) -> Self {
        let next_hops = arborescences.values().flat_map(|tree| tree.tree_arcs.iter().copied()).collect();
        ConfluentFlow { sink, arborescences, next_hops, requested, delivered, stats }
    }

    #[inline]
    pub fn sink(&self) -> usize {
        self.sink
    }

    pub fn arborescences(&self) -> &BTreeMap<usize, Arborescence<Flow>> {
        &self.arborescences
    }

    pub fn arborescence(&self, root: usize) -> Option<&Arborescence<Flow>> {
        self.arborescences.get(&root)
    }

    pub fn into_arborescences(self) -> BTreeMap<usize, Arborescence<Flow>> {
        self.arborescences
    }

    pub fn sinks(&self) -> impl Iterator<Item = usize> + '_ {
        self.arborescences.keys().copied()
    }

    /// Head of the tree arc leaving `node`. Roots forward to the sink itself.
    pub fn next_hop(&self, node: usize) -> Option<usize> {
        if self.arborescences.contains_key(&node) {
            return Some(self.sink);
        }
        self.next_hops.get(&node).copied()
    }

    pub fn sink_of(&self, node: usize) -> Option<usize> {
        let mut current = node;
        // a path visits every tree arc at most once
        for _ in 0..=self.next_hops.len() {
            if self.arborescences.contains_key(&current) {
                return Some(current);
            }
            current = *self.next_hops.get(&current)?;
        }
        None
    }

    pub fn total_congestion(&self) -> Flow {
        self.arborescences.values().fold(Flow::zero(), |sum, tree| sum + tree.congestion)
    }

    pub fn max_congestion(&self) -> Option<Flow> {
        self.arborescences.values().map(|tree| tree.congestion).max()
    }

    #[inline]
    pub fn requested(&self) -> Flow {
        self.requested
    }

    #[inline]
    pub fn delivered(&self) -> Flow {
        self.delivered
    }

    pub fn undelivered(&self) -> Flow {
        self.requested - self.delivered
    }

    #[inline]
    pub fn is_fully_delivered(&self) -> bool {
        self.delivered == self.requested
    }

    #[inline]
    pub fn stats(&self) -> ReductionStats {
        self.stats
    }
}
