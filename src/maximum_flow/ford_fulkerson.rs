use crate::maximum_flow::graph::Graph;
use crate::maximum_flow::residual::ResidualNetwork;
use crate::maximum_flow::{is_valid_terminal_pair, MaximumFlowSolver, Status};
use num_traits::NumAssign;

/// Depth-first augmenting paths. Terminates on integral capacities.
#[derive(Default)]
pub struct FordFulkerson {
    visited: Vec<bool>,
}

impl<Flow> MaximumFlowSolver<Flow> for FordFulkerson
where
    Flow: NumAssign + Ord + Copy,
{
    fn solve(&mut self, source: usize, sink: usize, graph: &mut Graph<Flow>) -> Status {
        if !is_valid_terminal_pair(source, sink, graph) {
            return Status::BadInput;
        }
        let mut network = ResidualNetwork::build(graph);
        let limit = network.out_residual(source);

        let mut total = Flow::zero();
        while total < limit {
            self.visited.clear();
            self.visited.resize(network.num_nodes(), false);
            let delta = self.augment(&mut network, source, sink, limit - total);
            if delta == Flow::zero() {
                break;
            }
            total += delta;
        }

        network.write_flows(graph);
        Status::Optimal
    }
}

impl FordFulkerson {
    fn augment<Flow>(&mut self, network: &mut ResidualNetwork<Flow>, u: usize, sink: usize, limit: Flow) -> Flow
    where
        Flow: NumAssign + Ord + Copy,
    {
        if u == sink {
            return limit;
        }
        self.visited[u] = true;
        for a in network.arc_ids(u) {
            let (head, residual) = (network.arcs[a].head, network.arcs[a].residual);
            if self.visited[head] || residual == Flow::zero() {
                continue;
            }
            let delta = self.augment(network, head, sink, limit.min(residual));
            if delta > Flow::zero() {
                network.augment(a, delta);
                return delta;
            }
        }
        Flow::zero()
    }
}
