use crate::confluent_flow::demand_graph::DemandGraph;
use crate::error::{ConfluentFlowError, InvalidInput, Result};
use crate::maximum_flow::graph::Graph;
use crate::maximum_flow::{MaximumFlowSolver, Status};
use num_traits::{CheckedAdd, NumAssign};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use tracing::debug;

/// Positive-flow subgraph of a maximum flow, mutated in place by the reduction.
///
/// Nodes are addressed by the handles of the [`DemandGraph`] the support was
/// built from. Adjacency is kept in ordered maps so every scan runs in
/// ascending node order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportGraph<Flow> {
    present: Vec<bool>,
    demands: Vec<Flow>,
    successors: Vec<BTreeMap<usize, Flow>>,
    predecessors: Vec<BTreeSet<usize>>,
    num_arcs: usize,
}

impl<Flow> SupportGraph<Flow>
where
    Flow: NumAssign + Ord + Copy + Debug,
{
    /// Solves a maximum flow from a virtual source, feeding every node with
    /// positive demand, to `sink`, and keeps the arcs carrying flow.
    ///
    /// A node's demand in the support graph is the part of its demand the
    /// maximum flow actually routes. The sink's own demand is not routed.
    pub fn build<S>(graph: &DemandGraph<Flow>, sink: usize, solver: &mut S) -> Result<Self>
    where
        Flow: CheckedAdd,
        S: MaximumFlowSolver<Flow>,
    {
        graph.validate()?;
        graph.check_node(sink)?;

        let mut network = Graph::default();
        network.add_nodes(graph.num_nodes());
        let source = network.add_node();

        // no flow from the virtual source can exceed the total demand
        let unbounded = graph.total_demand().ok_or(InvalidInput::DemandOverflow)?;
        let mut arc_edges = Vec::with_capacity(graph.num_arcs());
        for arc in graph.arcs() {
            let capacity = arc.capacity.unwrap_or(unbounded);
            let edge_id = network.add_edge(arc.from, arc.to, capacity).ok_or(ConfluentFlowError::MaximumFlow(Status::BadInput))?;
            arc_edges.push(edge_id);
        }

        let mut supply_edges = Vec::new();
        for (node, &demand) in graph.demands().iter().enumerate() {
            if node == sink || demand <= Flow::zero() {
                continue;
            }
            let edge_id = network.add_edge(source, node, demand).ok_or(ConfluentFlowError::MaximumFlow(Status::BadInput))?;
            supply_edges.push((node, edge_id));
        }

        let status = solver.solve(source, sink, &mut network);
        if status != Status::Optimal {
            return Err(ConfluentFlowError::MaximumFlow(status));
        }

        let mut support = SupportGraph::with_nodes(graph.num_nodes());
        for (arc, &edge_id) in graph.arcs().iter().zip(arc_edges.iter()) {
            match network.flow(edge_id) {
                Some(flow) if flow > Flow::zero() && arc.from != sink => support.add_arc(arc.from, arc.to, flow),
                _ => {}
            }
        }
        for (node, edge_id) in supply_edges {
            match network.flow(edge_id) {
                Some(routed) if routed > Flow::zero() => support.set_demand(node, routed),
                _ => {}
            }
        }

        debug!(
            nodes = support.num_nodes(),
            arcs = support.num_arcs(),
            delivered = ?network.flow_value(source),
            "built support graph"
        );
        Ok(support)
    }

    pub fn with_nodes(num_nodes: usize) -> Self {
        SupportGraph {
            present: vec![false; num_nodes],
            demands: vec![Flow::zero(); num_nodes],
            successors: vec![BTreeMap::new(); num_nodes],
            predecessors: vec![BTreeSet::new(); num_nodes],
            num_arcs: 0,
        }
    }

    pub fn from_arcs<I>(arcs: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, Flow)>,
    {
        let mut support = SupportGraph::with_nodes(0);
        for (from, to, weight) in arcs {
            support.add_arc(from, to, weight);
        }
        support
    }

    #[inline]
    pub fn node_bound(&self) -> usize {
        self.present.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.present.iter().filter(|&&present| present).count()
    }

    #[inline]
    pub fn num_arcs(&self) -> usize {
        self.num_arcs
    }

    #[inline]
    pub fn contains_node(&self, u: usize) -> bool {
        self.present.get(u).copied().unwrap_or(false)
    }

    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.present.iter().enumerate().filter(|(_, &present)| present).map(|(u, _)| u)
    }

    pub fn demand(&self, u: usize) -> Flow {
        self.demands.get(u).copied().unwrap_or_else(Flow::zero)
    }

    pub fn set_demand(&mut self, u: usize, demand: Flow) {
        self.ensure_node(u);
        self.demands[u] = demand;
    }

    pub fn total_demand(&self) -> Flow {
        self.nodes().fold(Flow::zero(), |sum, u| sum + self.demands[u])
    }

    pub fn weight(&self, u: usize, v: usize) -> Option<Flow> {
        self.successors.get(u)?.get(&v).copied()
    }

    #[inline]
    pub fn has_arc(&self, u: usize, v: usize) -> bool {
        self.weight(u, v).is_some()
    }

    pub fn successors(&self, u: usize) -> impl Iterator<Item = (usize, Flow)> + '_ {
        self.successors.get(u).into_iter().flat_map(|out| out.iter().map(|(&v, &w)| (v, w)))
    }

    pub fn predecessors(&self, u: usize) -> impl Iterator<Item = usize> + '_ {
        self.predecessors.get(u).into_iter().flat_map(|inc| inc.iter().copied())
    }

    pub fn out_degree(&self, u: usize) -> usize {
        self.successors.get(u).map_or(0, BTreeMap::len)
    }

    pub fn out_weight(&self, u: usize) -> Flow {
        self.successors(u).fold(Flow::zero(), |sum, (_, w)| sum + w)
    }

    pub fn in_weight(&self, u: usize) -> Flow {
        self.predecessors(u).fold(Flow::zero(), |sum, p| sum + self.successors[p][&u])
    }

    /// Flow conservation at `u`: everything entering or originating at `u` leaves it.
    pub fn is_conserved(&self, u: usize) -> bool {
        self.out_weight(u) == self.demand(u) + self.in_weight(u)
    }

    pub fn arcs(&self) -> impl Iterator<Item = (usize, usize, Flow)> + '_ {
        self.successors.iter().enumerate().flat_map(|(u, out)| out.iter().map(move |(&v, &w)| (u, v, w)))
    }

    /// Adds `weight` to arc `(u, v)`, creating the arc and its endpoints if needed.
    pub fn add_arc(&mut self, u: usize, v: usize, weight: Flow) {
        if weight <= Flow::zero() {
            return;
        }
        self.ensure_node(u.max(v));
        self.present[u] = true;
        self.present[v] = true;
        match self.successors[u].get_mut(&v) {
            Some(w) => *w += weight,
            None => {
                self.successors[u].insert(v, weight);
                self.predecessors[v].insert(u);
                self.num_arcs += 1;
            }
        }
    }

    /// Returns false if the arc does not exist.
    pub fn increase_weight(&mut self, u: usize, v: usize, delta: Flow) -> bool {
        match self.successors.get_mut(u).and_then(|out| out.get_mut(&v)) {
            Some(w) => {
                *w += delta;
                true
            }
            None => false,
        }
    }

    /// Subtracts `delta` from arc `(u, v)` and deletes the arc once its weight
    /// reaches zero. Returns true if the arc was deleted.
    pub fn decrease_weight(&mut self, u: usize, v: usize, delta: Flow) -> bool {
        let Some(w) = self.successors.get_mut(u).and_then(|out| out.get_mut(&v)) else {
            return false;
        };
        if *w > delta {
            *w -= delta;
            return false;
        }
        self.remove_arc(u, v);
        true
    }

    pub fn remove_arc(&mut self, u: usize, v: usize) -> Option<Flow> {
        let weight = self.successors.get_mut(u)?.remove(&v)?;
        self.predecessors[v].remove(&u);
        self.num_arcs -= 1;
        Some(weight)
    }

    /// Deletes `u` together with every arc touching it.
    pub fn remove_node(&mut self, u: usize) {
        if !self.contains_node(u) {
            return;
        }
        for v in std::mem::take(&mut self.successors[u]).into_keys() {
            self.predecessors[v].remove(&u);
            self.num_arcs -= 1;
        }
        for p in std::mem::take(&mut self.predecessors[u]) {
            self.successors[p].remove(&u);
            self.num_arcs -= 1;
        }
        self.present[u] = false;
        self.demands[u] = Flow::zero();
    }

    fn ensure_node(&mut self, u: usize) {
        if u >= self.present.len() {
            self.present.resize(u + 1, false);
            self.demands.resize(u + 1, Flow::zero());
            self.successors.resize(u + 1, BTreeMap::new());
            self.predecessors.resize(u + 1, BTreeSet::new());
        }
        self.present[u] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maximum_flow::MaximumFlowAlgorithm;
    use rstest::rstest;

    struct Refusing;

    impl MaximumFlowSolver<i64> for Refusing {
        fn solve(&mut self, _source: usize, _sink: usize, _graph: &mut Graph<i64>) -> Status {
            Status::NotSolved
        }
    }

    #[test]
    fn arcs_are_removable() {
        let mut support = SupportGraph::from_arcs([(0, 1, 2), (1, 2, 2), (0, 1, 1)]);
        assert_eq!(support.num_arcs(), 2);
        assert_eq!(support.weight(0, 1), Some(3));

        assert!(!support.decrease_weight(0, 1, 1));
        assert_eq!(support.weight(0, 1), Some(2));
        assert!(support.decrease_weight(0, 1, 2));
        assert!(!support.has_arc(0, 1));
        assert_eq!(support.predecessors(1).count(), 0);
        assert!(!support.increase_weight(0, 1, 1));

        support.remove_node(2);
        assert_eq!(support.num_arcs(), 0);
        assert_eq!(support.nodes().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn conservation_accounts_for_demand() {
        let mut support = SupportGraph::from_arcs([(0, 1, 2), (1, 2, 3)]);
        support.set_demand(0, 2);
        support.set_demand(1, 1);
        assert!(support.is_conserved(0));
        assert!(support.is_conserved(1));
        assert_eq!(support.in_weight(2), 3);
        assert_eq!(support.out_weight(2), 0);
    }

    #[rstest]
    #[case::dinic(MaximumFlowAlgorithm::Dinic)]
    #[case::edmonds_karp(MaximumFlowAlgorithm::EdmondsKarp)]
    #[case::ford_fulkerson(MaximumFlowAlgorithm::FordFulkerson)]
    fn keeps_only_arcs_with_flow(#[case] mut algorithm: MaximumFlowAlgorithm) {
        let mut graph: DemandGraph<i64> = DemandGraph::from_arcs([(0, 1, 1), (1, 3, 5), (0, 2, 5), (2, 3, 5), (2, 1, 5)]).unwrap();
        graph.set_demand(0, 3).unwrap();
        graph.set_demand(2, 1).unwrap();

        let support = SupportGraph::build(&graph, 3, &mut algorithm).unwrap();
        assert_eq!(support.total_demand(), 4);
        assert_eq!(support.out_weight(0), 3);
        assert_eq!(support.in_weight(3), 4);
        for u in [0, 1, 2] {
            assert!(support.is_conserved(u), "node {u}");
        }
        assert!(support.arcs().all(|(_, _, w)| w > 0));
    }

    #[test]
    fn routed_demand_replaces_requested_demand() {
        let mut graph: DemandGraph<i64> = DemandGraph::default();
        graph.add_nodes(3);
        graph.add_arc(0, 1, 2).unwrap();
        graph.add_uncapacitated_arc(1, 2).unwrap();
        graph.set_demand(0, 5).unwrap();
        graph.set_demand(2, 7).unwrap();

        let support = SupportGraph::build(&graph, 2, &mut MaximumFlowAlgorithm::Dinic).unwrap();
        assert_eq!(support.demand(0), 2);
        // the sink's own demand never enters the support graph
        assert_eq!(support.demand(2), 0);
        assert_eq!(support.weight(1, 2), Some(2));
        assert!(support.is_conserved(0));
    }

    #[test]
    fn unreachable_nodes_are_left_out() {
        let mut graph: DemandGraph<i64> = DemandGraph::default();
        graph.add_nodes(4);
        graph.add_arc(0, 3, 1).unwrap();
        graph.add_arc(2, 1, 1).unwrap();
        graph.set_demand(0, 1).unwrap();
        graph.set_demand(2, 1).unwrap();

        let support = SupportGraph::build(&graph, 3, &mut MaximumFlowAlgorithm::EdmondsKarp).unwrap();
        assert_eq!(support.nodes().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn solver_failures_propagate() {
        let mut graph: DemandGraph<i64> = DemandGraph::default();
        graph.add_nodes(2);
        graph.add_arc(0, 1, 1).unwrap();
        assert_eq!(SupportGraph::build(&graph, 1, &mut Refusing), Err(ConfluentFlowError::MaximumFlow(Status::NotSolved)));
        assert!(SupportGraph::build(&graph, 2, &mut Refusing).unwrap_err().is_invalid_input());
    }
}
