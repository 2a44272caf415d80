use crate::maximum_flow::graph::Graph;
use crate::maximum_flow::residual::ResidualNetwork;
use crate::maximum_flow::{is_valid_terminal_pair, MaximumFlowSolver, Status};
use num_traits::NumAssign;

/// Blocking flows on the level graph, O(n^2 m).
#[derive(Default)]
pub struct Dinic {
    // next arc to try per node within one phase
    next_arc: Vec<usize>,
}

impl<Flow> MaximumFlowSolver<Flow> for Dinic
where
    Flow: NumAssign + Ord + Copy,
{
    fn solve(&mut self, source: usize, sink: usize, graph: &mut Graph<Flow>) -> Status {
        if !is_valid_terminal_pair(source, sink, graph) {
            return Status::BadInput;
        }
        let mut network = ResidualNetwork::build(graph);
        let limit = network.out_residual(source);

        while network.assign_levels(source, sink) {
            self.next_arc = network.offsets[..network.num_nodes()].to_vec();
            let mut pushed = Flow::zero();
            loop {
                let delta = self.push(&mut network, source, sink, limit);
                if delta == Flow::zero() {
                    break;
                }
                pushed += delta;
            }
            if pushed == Flow::zero() {
                break;
            }
        }

        network.write_flows(graph);
        Status::Optimal
    }
}

impl Dinic {
    // sends up to `limit` from `u` to `sink` along level-increasing arcs
    fn push<Flow>(&mut self, network: &mut ResidualNetwork<Flow>, u: usize, sink: usize, limit: Flow) -> Flow
    where
        Flow: NumAssign + Ord + Copy,
    {
        if u == sink {
            return limit;
        }
        while self.next_arc[u] < network.offsets[u + 1] {
            let a = self.next_arc[u];
            let (head, residual) = (network.arcs[a].head, network.arcs[a].residual);
            if residual > Flow::zero() && network.levels[head] == network.levels[u] + 1 {
                let delta = self.push(network, head, sink, limit.min(residual));
                if delta > Flow::zero() {
                    network.augment(a, delta);
                    return delta;
                }
            }
            self.next_arc[u] += 1;
        }
        Flow::zero()
    }
}
