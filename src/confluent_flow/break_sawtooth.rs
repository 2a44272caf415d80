use crate::confluent_flow::reduction::{Color, Reduction};
use num_traits::NumAssign;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt::Debug;
use tracing::debug;

/// Arc of the auxiliary graph in which every arborescence is contracted into
/// its root. `true_neighbor` is the head of the support-graph arc it stands for.
#[derive(Clone, Copy, Debug)]
struct AuxiliaryArc<Flow> {
    reverse: bool,
    true_neighbor: usize,
    weight: Flow,
}

type AuxiliaryGraph<Flow> = BTreeMap<usize, BTreeMap<usize, AuxiliaryArc<Flow>>>;

impl<Flow> Reduction<Flow>
where
    Flow: NumAssign + Ord + Copy + Debug,
{
    /// Cancels flow around one cycle of the auxiliary graph.
    ///
    /// A free node `u` with an arc into arborescence `s` gets a forward arc
    /// `u -> s` and a reverse arc `s -> u`. Sending `min_flow` around a cycle
    /// lowers every forward arc and raises the support arc behind every reverse
    /// arc, which keeps conservation at each node on the cycle and deletes at
    /// least one arc. Returns false if the auxiliary graph has no usable cycle.
    pub fn break_sawtooth(&mut self) -> bool {
        let auxiliary = self.auxiliary_graph();
        let Some(cycle) = find_cycle(&auxiliary) else {
            return false;
        };

        let arcs: Vec<(usize, usize, AuxiliaryArc<Flow>)> = cycle
            .iter()
            .zip(cycle.iter().cycle().skip(1))
            .map(|(&u, &v)| (u, v, auxiliary[&u][&v]))
            .collect();
        let Some(min_flow) = arcs.iter().filter(|(_, _, arc)| !arc.reverse).map(|(_, _, arc)| arc.weight).min() else {
            return false;
        };

        let mut tails = BTreeSet::new();
        for &(u, v, arc) in &arcs {
            if arc.reverse {
                self.graph.increase_weight(v, arc.true_neighbor, min_flow);
            } else if self.graph.decrease_weight(u, arc.true_neighbor, min_flow) {
                tails.insert(u);
            }
        }
        for u in tails {
            if self.graph.out_degree(u) == 0 {
                self.release(u);
            } else {
                self.refresh_frontier(u);
            }
        }

        debug!(?cycle, ?min_flow, "broke sawtooth cycle");
        true
    }

    fn auxiliary_graph(&self) -> AuxiliaryGraph<Flow> {
        let mut auxiliary: AuxiliaryGraph<Flow> = BTreeMap::new();
        for &u in &self.free_nodes {
            for (v, weight) in self.graph.successors(u) {
                match self.color(v) {
                    Color::Uncolored => {
                        auxiliary.entry(u).or_default().insert(v, AuxiliaryArc { reverse: false, true_neighbor: v, weight });
                    }
                    Color::Colored(color) => {
                        let Some(root) = self.sink_for_color(color) else {
                            continue;
                        };
                        // several arcs into one tree collapse onto the first
                        auxiliary.entry(u).or_default().entry(root).or_insert(AuxiliaryArc { reverse: false, true_neighbor: v, weight });
                        auxiliary.entry(root).or_default().entry(u).or_insert(AuxiliaryArc { reverse: true, true_neighbor: v, weight });
                    }
                }
            }
        }
        auxiliary
    }
}

/// A simple cycle that is not a forward arc paired with its own reverse arc:
/// either two real antiparallel arcs, or a cycle of length at least three.
fn find_cycle<Flow>(auxiliary: &AuxiliaryGraph<Flow>) -> Option<Vec<usize>> {
    for (&a, out) in auxiliary {
        for (&b, arc) in out {
            if let Some(back) = auxiliary.get(&b).and_then(|out| out.get(&a)) {
                if !arc.reverse && !back.reverse {
                    return Some(vec![a, b]);
                }
            }
            if let Some(path) = indirect_path(auxiliary, b, a) {
                let mut cycle = vec![a];
                cycle.extend_from_slice(&path[..path.len() - 1]);
                return Some(cycle);
            }
        }
    }
    None
}

// shortest path from -> ... -> to that does not take the arc from -> to
fn indirect_path<Flow>(auxiliary: &AuxiliaryGraph<Flow>, from: usize, to: usize) -> Option<Vec<usize>> {
    let mut prev = HashMap::from([(from, from)]);
    let mut queue = VecDeque::from([from]);
    while let Some(x) = queue.pop_front() {
        for &y in auxiliary.get(&x).into_iter().flat_map(BTreeMap::keys) {
            if (x == from && y == to) || prev.contains_key(&y) {
                continue;
            }
            prev.insert(y, x);
            if y == to {
                let mut path = vec![to];
                let mut v = to;
                while v != from {
                    v = prev[&v];
                    path.push(v);
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(y);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::confluent_flow::arborescence::Arborescence;
    use crate::confluent_flow::reduction::Reduction;
    use crate::confluent_flow::support_graph::SupportGraph;
    use rstest::{fixture, rstest};
    use std::collections::BTreeMap;

    fn sawtooth(arcs: &[(usize, usize, i64)]) -> Reduction<i64> {
        let graph = SupportGraph::from_arcs(arcs.iter().copied());
        let trees = BTreeMap::from([
            (8, Arborescence::with_arcs(1, 2, vec![(4, 8)])),
            (9, Arborescence::with_arcs(2, 5, vec![])),
            (10, Arborescence::with_arcs(3, 9, vec![(1, 3), (3, 7), (3, 10), (7, 10)])),
        ]);
        Reduction::from_coloring(graph, trees, [(4, 1), (1, 3), (3, 3), (7, 3)])
    }

    #[fixture]
    fn one_cycle() -> Reduction<i64> {
        sawtooth(&[
            (0, 1, 3),
            (0, 2, 1),
            (1, 3, 3),
            (2, 6, 2),
            (3, 10, 3),
            (3, 7, 1),
            (4, 8, 1),
            (5, 4, 1),
            (5, 9, 2),
            (6, 9, 3),
            (6, 10, 1),
            (7, 10, 2),
        ])
    }

    #[fixture]
    fn two_cycles() -> Reduction<i64> {
        sawtooth(&[
            (0, 1, 3),
            (0, 2, 1),
            (1, 3, 3),
            (2, 6, 3),
            (3, 10, 3),
            (3, 7, 1),
            (4, 8, 1),
            (5, 4, 1),
            (5, 2, 1),
            (5, 9, 2),
            (6, 9, 3),
            (6, 10, 2),
            (7, 10, 2),
        ])
    }

    #[rstest]
    fn reroutes_flow_around_one_cycle(mut one_cycle: Reduction<i64>) {
        assert!(one_cycle.break_sawtooth());
        assert_eq!(
            one_cycle.graph().arcs().collect::<Vec<_>>(),
            vec![
                (0, 1, 4),
                (1, 3, 3),
                (2, 6, 1),
                (3, 7, 1),
                (3, 10, 3),
                (4, 8, 1),
                (5, 4, 1),
                (5, 9, 2),
                (6, 9, 3),
                (7, 10, 2),
            ]
        );
        // 0 and 6 only feed colored nodes now
        assert_eq!(one_cycle.frontier_nodes().iter().copied().collect::<Vec<_>>(), vec![0, 5, 6]);
        assert!(!one_cycle.break_sawtooth());
    }

    #[rstest]
    fn breaks_cycles_until_none_is_left(mut two_cycles: Reduction<i64>) {
        let net = |reduction: &Reduction<i64>, u: usize| reduction.graph().out_weight(u) - reduction.graph().in_weight(u);
        let before: Vec<i64> = [0, 2, 5, 6].map(|u| net(&two_cycles, u)).to_vec();

        let mut breaks = 0;
        while two_cycles.break_sawtooth() {
            breaks += 1;
        }
        assert_eq!(breaks, 2);
        assert_eq!(
            two_cycles.graph().arcs().collect::<Vec<_>>(),
            vec![
                (0, 1, 4),
                (1, 3, 3),
                (2, 6, 1),
                (3, 7, 1),
                (3, 10, 3),
                (4, 8, 1),
                (5, 4, 1),
                (5, 9, 3),
                (6, 9, 2),
                (6, 10, 1),
                (7, 10, 2),
            ]
        );
        assert_eq!([0, 2, 5, 6].map(|u| net(&two_cycles, u)).to_vec(), before);
    }

    #[test]
    fn cancels_real_two_cycles() {
        let graph = SupportGraph::from_arcs([(0, 1, 3), (1, 0, 1), (1, 2, 2)]);
        let trees = BTreeMap::from([(2, Arborescence::new(0, 2))]);
        let mut reduction = Reduction::from_coloring(graph, trees, []);

        assert!(reduction.break_sawtooth());
        assert_eq!(reduction.graph().arcs().collect::<Vec<_>>(), vec![(0, 1, 2), (1, 2, 2)]);
    }

    #[test]
    fn ignores_forward_and_reverse_pairs() {
        let graph = SupportGraph::from_arcs([(0, 2, 1), (1, 2, 1), (0, 3, 1)]);
        let trees = BTreeMap::from([(2, Arborescence::new(0, 2)), (3, Arborescence::new(1, 1))]);
        let mut reduction = Reduction::from_coloring(graph, trees, []);
        assert!(!reduction.break_sawtooth());
    }
}
