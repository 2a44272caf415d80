use crate::maximum_flow::graph::Graph;
use num_traits::NumAssign;
use std::collections::VecDeque;

pub(crate) const UNREACHED: usize = usize::MAX;

/// One direction of a graph edge. The forward arc starts with the edge's
/// capacity as residual, its twin with none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ResidualArc<Flow> {
    pub head: usize,
    pub residual: Flow,
    pub twin: usize,
}

/// Residual network in compressed adjacency form: the arcs leaving `u` are
/// `arcs[offsets[u]..offsets[u + 1]]`.
#[derive(Default, Debug)]
pub(crate) struct ResidualNetwork<Flow> {
    pub offsets: Vec<usize>,
    pub arcs: Vec<ResidualArc<Flow>>,
    // forward arc of every graph edge
    edge_arcs: Vec<usize>,
    capacities: Vec<Flow>,
    pub levels: Vec<usize>,
}

impl<Flow> ResidualNetwork<Flow>
where
    Flow: NumAssign + Ord + Copy,
{
    pub fn build(graph: &Graph<Flow>) -> Self {
        let n = graph.num_nodes();
        let mut offsets = vec![0; n + 1];
        for edge in graph.edges() {
            offsets[edge.from + 1] += 1;
            offsets[edge.to + 1] += 1;
        }
        for u in 0..n {
            offsets[u + 1] += offsets[u];
        }

        let mut slot = offsets.clone();
        let mut arcs = vec![ResidualArc { head: 0, residual: Flow::zero(), twin: 0 }; 2 * graph.num_edges()];
        let mut edge_arcs = Vec::with_capacity(graph.num_edges());
        for edge in graph.edges() {
            let forward = slot[edge.from];
            slot[edge.from] += 1;
            let backward = slot[edge.to];
            slot[edge.to] += 1;
            arcs[forward] = ResidualArc { head: edge.to, residual: edge.capacity, twin: backward };
            arcs[backward] = ResidualArc { head: edge.from, residual: Flow::zero(), twin: forward };
            edge_arcs.push(forward);
        }

        ResidualNetwork {
            offsets,
            arcs,
            edge_arcs,
            capacities: graph.edges().map(|edge| edge.capacity).collect(),
            levels: vec![UNREACHED; n],
        }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn arc_ids(&self, u: usize) -> std::ops::Range<usize> {
        self.offsets[u]..self.offsets[u + 1]
    }

    pub fn out_residual(&self, u: usize) -> Flow {
        self.arc_ids(u).fold(Flow::zero(), |sum, a| sum + self.arcs[a].residual)
    }

    #[inline]
    pub fn augment(&mut self, arc_id: usize, delta: Flow) {
        let twin = self.arcs[arc_id].twin;
        self.arcs[arc_id].residual -= delta;
        self.arcs[twin].residual += delta;
    }

    /// Breadth-first levels from `source` over arcs with residual capacity.
    /// Returns whether `sink` was reached.
    pub fn assign_levels(&mut self, source: usize, sink: usize) -> bool {
        self.levels.fill(UNREACHED);
        self.levels[source] = 0;
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            for a in self.arc_ids(u) {
                let arc = &self.arcs[a];
                if arc.residual > Flow::zero() && self.levels[arc.head] == UNREACHED {
                    self.levels[arc.head] = self.levels[u] + 1;
                    queue.push_back(arc.head);
                }
            }
        }
        self.levels[sink] != UNREACHED
    }

    /// Writes the flow of every forward arc onto the graph edges.
    pub fn write_flows(&self, graph: &mut Graph<Flow>) {
        for ((edge, &a), &capacity) in graph.edges.iter_mut().zip(&self.edge_arcs).zip(&self.capacities) {
            edge.flow = capacity - self.arcs[a].residual;
        }
    }
}
