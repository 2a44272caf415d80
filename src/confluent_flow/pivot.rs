use crate::confluent_flow::reduction::{Color, Reduction};
use num_traits::NumAssign;
use std::fmt::Debug;
use tracing::debug;

struct PivotMove {
    node: usize,
    tree1: usize,
    tree2: usize,
    color1: usize,
    color2: usize,
}

impl<Flow> Reduction<Flow>
where
    Flow: NumAssign + Ord + Copy + Debug,
{
    /// Moves the flow a frontier node sends into one arborescence over to
    /// another arborescence it also feeds.
    ///
    /// `tree1` must have exactly one frontier feeder, the pivot node. Flow goes
    /// to whichever side keeps the congestion of the two trees more balanced:
    /// into `tree1` if `congestion(tree1) + 2 * flow2 < congestion(tree2)`, into
    /// `tree2` otherwise. Either way the pivot node feeds one tree fewer.
    /// Returns false if no arborescence qualifies.
    pub fn pivot(&mut self) -> bool {
        let Some(PivotMove { node, tree1, tree2, color1, color2 }) = self.find_pivot() else {
            return false;
        };
        let (Some(congestion1), Some(congestion2)) = (self.congestion(tree1), self.congestion(tree2)) else {
            return false;
        };
        let flow1 = self.flow_into(node, color1);
        let flow2 = self.flow_into(node, color2);

        let (from, to, from_color, to_color, moved) = if congestion1 + flow2 + flow2 < congestion2 {
            (tree2, tree1, color2, color1, flow2)
        } else {
            (tree1, tree2, color1, color2, flow1)
        };
        let Some(head) = self.graph.successors(node).map(|(v, _)| v).find(|&v| self.color(v) == Color::Colored(to_color)) else {
            return false;
        };
        self.graph.increase_weight(node, head, moved);
        let dropped: Vec<usize> = self.graph.successors(node).map(|(v, _)| v).filter(|&v| self.color(v) == Color::Colored(from_color)).collect();
        for v in dropped {
            self.graph.remove_arc(node, v);
        }
        if let Some(tree) = self.trees.get_mut(&to) {
            tree.congestion += moved;
        }
        if let Some(tree) = self.trees.get_mut(&from) {
            tree.congestion -= moved;
        }
        self.refresh_frontier(node);

        debug!(node, from, to, ?moved, "pivoted flow");
        true
    }

    fn find_pivot(&self) -> Option<PivotMove> {
        self.trees.iter().find_map(|(&tree1, tree)| {
            let color1 = tree.color;
            let mut feeders = self.frontier_nodes.iter().filter(|&&u| self.feeds_color(u, color1));
            let node = *feeders.next()?;
            if feeders.next().is_some() {
                return None;
            }
            let color2 = self.graph.successors(node).find_map(|(v, _)| match self.color(v) {
                Color::Colored(c) if c != color1 => Some(c),
                _ => None,
            })?;
            let tree2 = self.sink_for_color(color2)?;
            Some(PivotMove { node, tree1, tree2, color1, color2 })
        })
    }

    fn feeds_color(&self, u: usize, color: usize) -> bool {
        self.graph.successors(u).any(|(v, _)| self.color(v) == Color::Colored(color))
    }

    fn flow_into(&self, u: usize, color: usize) -> Flow {
        self.graph
            .successors(u)
            .filter(|&(v, _)| self.color(v) == Color::Colored(color))
            .fold(Flow::zero(), |sum, (_, w)| sum + w)
    }

    fn congestion(&self, root: usize) -> Option<Flow> {
        self.trees.get(&root).map(|tree| tree.congestion)
    }
}

#[cfg(test)]
mod tests {
    use crate::confluent_flow::arborescence::Arborescence;
    use crate::confluent_flow::reduction::Reduction;
    use crate::confluent_flow::support_graph::SupportGraph;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn two_trees(congestion5: i64) -> Reduction<i64> {
        let graph = SupportGraph::from_arcs([
            (0, 1, 1),
            (0, 2, 1),
            (0, 3, 1),
            (0, 4, 1),
            (0, 5, 1),
            (1, 3, 1),
            (2, 4, 2),
            (3, 5, 3),
            (6, 7, 1),
            (6, 8, 1),
            (9, 7, 1),
            (9, 8, 1),
        ]);
        let trees = BTreeMap::from([
            (4, Arborescence::with_arcs(0, 3, vec![(2, 4)])),
            (5, Arborescence::with_arcs(1, congestion5, vec![(1, 3), (3, 5)])),
            (7, Arborescence::new(2, 1)),
            (8, Arborescence::new(3, 0)),
        ]);
        Reduction::from_coloring(graph, trees, [(2, 0), (1, 1), (3, 1)])
    }

    #[rstest]
    #[case::into_the_larger_tree(4, vec![(0, 1, 3), (0, 3, 1), (0, 5, 1)], 1, 6)]
    #[case::into_the_lighter_tree(11, vec![(0, 2, 4), (0, 4, 1)], 6, 8)]
    fn balances_congestion(
        #[case] congestion5: i64,
        #[case] pivot_arcs: Vec<(usize, usize, i64)>,
        #[case] congestion4: i64,
        #[case] new_congestion5: i64,
    ) {
        let mut reduction = two_trees(congestion5);
        assert_eq!(reduction.frontier_nodes().iter().copied().collect::<Vec<_>>(), vec![0, 6, 9]);

        assert!(reduction.pivot());

        let arcs: Vec<_> = reduction.graph().arcs().filter(|&(u, _, _)| u == 0).collect();
        assert_eq!(arcs, pivot_arcs);
        assert_eq!(reduction.graph().weight(2, 4), Some(2));
        assert_eq!(reduction.graph().weight(3, 5), Some(3));
        assert_eq!(reduction.trees()[&4].congestion, congestion4);
        assert_eq!(reduction.trees()[&5].congestion, new_congestion5);
        assert_eq!(reduction.trees()[&7].congestion, 1);
        assert_eq!(reduction.trees()[&8].congestion, 0);
        assert!(reduction.frontier_nodes().contains(&0));
    }

    #[test]
    fn needs_a_single_feeder() {
        // both 0 and 1 feed each tree
        let graph = SupportGraph::from_arcs([(0, 2, 1), (0, 3, 1), (1, 2, 1), (1, 3, 1)]);
        let trees = BTreeMap::from([(2, Arborescence::new(0, 2)), (3, Arborescence::new(1, 2))]);
        let mut reduction = Reduction::from_coloring(graph, trees, []);
        assert!(!reduction.pivot());
    }
}
