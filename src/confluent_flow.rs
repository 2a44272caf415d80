mod aggregate;
pub mod arborescence;
mod break_sawtooth;
pub mod demand_graph;
mod pivot;
pub mod reduction;
pub mod support_graph;

use crate::confluent_flow::arborescence::ConfluentFlow;
use crate::confluent_flow::demand_graph::DemandGraph;
use crate::confluent_flow::reduction::Reduction;
use crate::confluent_flow::support_graph::SupportGraph;
use crate::error::{InvalidInput, Result};
use crate::maximum_flow::{MaximumFlowAlgorithm, MaximumFlowSolver};
use num_traits::{CheckedAdd, NumAssign};
use std::fmt::Debug;
use tracing::{info, instrument, warn};

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub struct ConfluentFlowConfig {
    /// Algorithm for the maximum flow the reduction starts from.
    pub maximum_flow: MaximumFlowAlgorithm,
    /// Verify flow conservation at every free node after each operator.
    pub check_invariants: bool,
}

/// Computes a confluent flow from a demand graph to a single sink.
///
/// A maximum flow routes as much demand as the capacities allow. Its
/// positive-flow arcs are then reduced into a forest of arborescences, one per
/// neighbor of the sink, so that each node forwards its whole flow along a
/// single arc.
///
/// ```
/// use confluent_flow::confluent_flow::demand_graph::DemandGraph;
/// use confluent_flow::confluent_flow::ConfluentFlowSolver;
///
/// let mut graph: DemandGraph<u64> = DemandGraph::default();
/// graph.add_nodes(4);
/// graph.set_demand(0, 2).unwrap();
/// graph.set_demand(1, 1).unwrap();
/// graph.add_arc(0, 1, 1).unwrap();
/// graph.add_arc(0, 2, 1).unwrap();
/// graph.add_uncapacitated_arc(1, 3).unwrap();
/// graph.add_uncapacitated_arc(2, 3).unwrap();
///
/// let flow = ConfluentFlowSolver::default().solve(&graph, 3).unwrap();
/// assert_eq!(flow.sinks().collect::<Vec<_>>(), vec![1, 2]);
/// assert_eq!(flow.total_congestion(), 3);
/// assert!(flow.next_hop(0).is_some());
/// ```
#[derive(Default, Debug, Clone)]
pub struct ConfluentFlowSolver {
    config: ConfluentFlowConfig,
}

impl ConfluentFlowSolver {
    pub fn new(config: ConfluentFlowConfig) -> Self {
        ConfluentFlowSolver { config }
    }

    pub fn config(&self) -> &ConfluentFlowConfig {
        &self.config
    }

    pub fn solve<Flow>(&self, graph: &DemandGraph<Flow>, sink: usize) -> Result<ConfluentFlow<Flow>>
    where
        Flow: NumAssign + CheckedAdd + Ord + Copy + Debug,
    {
        let mut solver = self.config.maximum_flow;
        self.solve_with(graph, sink, &mut solver)
    }

    /// Like [`solve`](Self::solve), with a caller-provided maximum flow solver.
    #[instrument(skip_all, fields(sink = sink, nodes = graph.num_nodes(), arcs = graph.num_arcs()))]
    pub fn solve_with<Flow, S>(&self, graph: &DemandGraph<Flow>, sink: usize, solver: &mut S) -> Result<ConfluentFlow<Flow>>
    where
        Flow: NumAssign + CheckedAdd + Ord + Copy + Debug,
        S: MaximumFlowSolver<Flow>,
    {
        info!("solving confluent flow");
        let support = SupportGraph::build(graph, sink, solver)?;
        let delivered = support.total_demand();
        let total = graph.total_demand().ok_or(InvalidInput::DemandOverflow)?;
        let requested = total - graph.demand(sink).unwrap_or_else(Flow::zero);

        let mut reduction = Reduction::new(support, sink)?;
        while !reduction.is_finished() {
            reduction.step()?;
            if self.config.check_invariants {
                reduction.check_conservation()?;
            }
        }

        let stats = reduction.stats();
        let flow = ConfluentFlow::assemble(sink, reduction.into_trees(), requested, delivered, stats);
        if !flow.is_fully_delivered() {
            warn!(requested = ?flow.requested(), delivered = ?flow.delivered(), "demand only partially delivered");
        }
        info!(
            arborescences = flow.arborescences().len(),
            delivered = ?flow.delivered(),
            iterations = stats.iterations(),
            "solved confluent flow"
        );
        Ok(flow)
    }
}

/// Solves with the default configuration.
pub fn confluent_flow<Flow>(graph: &DemandGraph<Flow>, sink: usize) -> Result<ConfluentFlow<Flow>>
where
    Flow: NumAssign + CheckedAdd + Ord + Copy + Debug,
{
    ConfluentFlowSolver::default().solve(graph, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfluentFlowError, InvalidInput};
    use crate::maximum_flow::Status;

    #[test]
    fn rejects_sink_out_of_range() {
        let mut graph: DemandGraph<i32> = DemandGraph::default();
        graph.add_nodes(2);
        assert_eq!(
            confluent_flow(&graph, 2).unwrap_err(),
            ConfluentFlowError::InvalidInput(InvalidInput::NodeOutOfRange { node: 2, num_nodes: 2 })
        );
    }

    #[test]
    fn rejects_overflowing_demand() {
        let mut graph: DemandGraph<u8> = DemandGraph::from_arcs([(0, 2, 1), (1, 2, 1)]).unwrap();
        graph.set_demand(0, 200).unwrap();
        graph.set_demand(1, 100).unwrap();
        let err = confluent_flow(&graph, 2).unwrap_err();
        assert_eq!(err, ConfluentFlowError::InvalidInput(InvalidInput::DemandOverflow));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn nothing_to_route() {
        let graph: DemandGraph<i32> = DemandGraph::from_arcs([(0, 1, 4)]).unwrap();
        let flow = confluent_flow(&graph, 1).unwrap();
        assert!(flow.arborescences().is_empty());
        assert!(flow.is_fully_delivered());
        assert_eq!(flow.stats().iterations(), 0);
    }

    #[test]
    fn surfaces_maximum_flow_status() {
        struct Failing;
        impl MaximumFlowSolver<i32> for Failing {
            fn solve(&mut self, _: usize, _: usize, _: &mut crate::maximum_flow::graph::Graph<i32>) -> Status {
                Status::BadInput
            }
        }
        let graph: DemandGraph<i32> = DemandGraph::from_arcs([(0, 1, 4)]).unwrap();
        let err = ConfluentFlowSolver::default().solve_with(&graph, 1, &mut Failing).unwrap_err();
        assert_eq!(err, ConfluentFlowError::MaximumFlow(Status::BadInput));
        assert!(err.is_internal());
    }
}
