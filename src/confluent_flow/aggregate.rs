use crate::confluent_flow::reduction::{Color, Reduction};
use num_traits::NumAssign;
use std::fmt::Debug;
use tracing::debug;

impl<Flow> Reduction<Flow>
where
    Flow: NumAssign + Ord + Copy + Debug,
{
    /// Merges a frontier node into an arborescence when all of its outgoing
    /// arcs lead into that arborescence. The heaviest of those arcs becomes
    /// the node's tree arc. Returns false if no frontier node qualifies.
    pub fn aggregate(&mut self) -> bool {
        let Some((node, color)) = self.frontier_nodes.iter().find_map(|&n| self.single_tree_color(n).map(|c| (n, c))) else {
            return false;
        };
        let Some(sink) = self.sink_for_color(color) else {
            return false;
        };
        let Some(head) = self.heaviest_successor(node) else {
            return false;
        };

        self.colors[node] = Color::Colored(color);
        if let Some(tree) = self.trees.get_mut(&sink) {
            tree.tree_arcs.push((node, head));
        }
        self.frontier_nodes.remove(&node);
        self.free_nodes.remove(&node);

        let feeders: Vec<usize> = self.graph.predecessors(node).filter(|u| self.free_nodes.contains(u)).collect();
        self.frontier_nodes.extend(feeders);

        debug!(node, sink, "aggregated node");
        true
    }

    // the color shared by every out-neighbor of `node`, if there is one
    fn single_tree_color(&self, node: usize) -> Option<usize> {
        let mut colors = self.graph.successors(node).map(|(v, _)| self.color(v));
        let Color::Colored(first) = colors.next()? else {
            return None;
        };
        let uniform = colors.all(|c| c == Color::Colored(first));
        (uniform && self.sink_for_color(first).is_some()).then_some(first)
    }

    // ties go to the smallest head
    fn heaviest_successor(&self, node: usize) -> Option<usize> {
        self.graph
            .successors(node)
            .fold(None, |best: Option<(usize, Flow)>, (v, w)| match best {
                Some((_, best_weight)) if best_weight >= w => best,
                _ => Some((v, w)),
            })
            .map(|(v, _)| v)
    }
}
