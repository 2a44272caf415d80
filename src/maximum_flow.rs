mod residual;
pub mod dinic;
pub mod edmonds_karp;
pub mod ford_fulkerson;
pub mod graph;

use crate::maximum_flow::dinic::Dinic;
use crate::maximum_flow::edmonds_karp::EdmondsKarp;
use crate::maximum_flow::ford_fulkerson::FordFulkerson;
use crate::maximum_flow::graph::Graph;
use num_traits::NumAssign;

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum Status {
    #[default]
    NotSolved,
    BadInput,
    Optimal,
}

/// A maximum s-t flow algorithm. On `Status::Optimal` every edge of `graph`
/// carries its flow and the flow value equals the maximum.
pub trait MaximumFlowSolver<Flow> {
    fn solve(&mut self, source: usize, sink: usize, graph: &mut Graph<Flow>) -> Status;
}

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum MaximumFlowAlgorithm {
    #[default]
    Dinic,
    EdmondsKarp,
    FordFulkerson,
}

impl MaximumFlowAlgorithm {
    pub fn solve<Flow>(self, source: usize, sink: usize, graph: &mut Graph<Flow>) -> Status
    where
        Flow: NumAssign + Ord + Copy,
    {
        match self {
            MaximumFlowAlgorithm::Dinic => Dinic::default().solve(source, sink, graph),
            MaximumFlowAlgorithm::EdmondsKarp => EdmondsKarp::default().solve(source, sink, graph),
            MaximumFlowAlgorithm::FordFulkerson => FordFulkerson::default().solve(source, sink, graph),
        }
    }
}

impl<Flow> MaximumFlowSolver<Flow> for MaximumFlowAlgorithm
where
    Flow: NumAssign + Ord + Copy,
{
    fn solve(&mut self, source: usize, sink: usize, graph: &mut Graph<Flow>) -> Status {
        MaximumFlowAlgorithm::solve(*self, source, sink, graph)
    }
}

pub(crate) fn is_valid_terminal_pair<Flow>(source: usize, sink: usize, graph: &Graph<Flow>) -> bool
where
    Flow: NumAssign + Ord + Copy,
{
    source < graph.num_nodes() && sink < graph.num_nodes() && source != sink
}
