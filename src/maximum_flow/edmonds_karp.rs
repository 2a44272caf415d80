use crate::maximum_flow::graph::Graph;
use crate::maximum_flow::residual::{ResidualNetwork, UNREACHED};
use crate::maximum_flow::{is_valid_terminal_pair, MaximumFlowSolver, Status};
use num_traits::NumAssign;
use std::collections::VecDeque;

/// Shortest augmenting paths by breadth-first search, O(n m^2).
#[derive(Default)]
pub struct EdmondsKarp {
    // arc used to enter each node on the current search tree
    parent_arc: Vec<usize>,
}

impl<Flow> MaximumFlowSolver<Flow> for EdmondsKarp
where
    Flow: NumAssign + Ord + Copy,
{
    fn solve(&mut self, source: usize, sink: usize, graph: &mut Graph<Flow>) -> Status {
        if !is_valid_terminal_pair(source, sink, graph) {
            return Status::BadInput;
        }
        let mut network = ResidualNetwork::build(graph);

        while self.search(&network, source, sink) {
            let path = self.path_to(&network, source, sink);
            let Some(bottleneck) = path.iter().map(|&a| network.arcs[a].residual).min() else {
                break;
            };
            for a in path {
                network.augment(a, bottleneck);
            }
        }

        network.write_flows(graph);
        Status::Optimal
    }
}

impl EdmondsKarp {
    fn search<Flow>(&mut self, network: &ResidualNetwork<Flow>, source: usize, sink: usize) -> bool
    where
        Flow: NumAssign + Ord + Copy,
    {
        self.parent_arc.clear();
        self.parent_arc.resize(network.num_nodes(), UNREACHED);
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            for a in network.arc_ids(u) {
                let head = network.arcs[a].head;
                if head == source || self.parent_arc[head] != UNREACHED || network.arcs[a].residual == Flow::zero() {
                    continue;
                }
                self.parent_arc[head] = a;
                if head == sink {
                    return true;
                }
                queue.push_back(head);
            }
        }
        false
    }

    fn path_to<Flow>(&self, network: &ResidualNetwork<Flow>, source: usize, sink: usize) -> Vec<usize>
    where
        Flow: NumAssign + Ord + Copy,
    {
        let mut path = Vec::new();
        let mut v = sink;
        while v != source {
            let a = self.parent_arc[v];
            path.push(a);
            v = network.arcs[network.arcs[a].twin].head;
        }
        path
    }
}
