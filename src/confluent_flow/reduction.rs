use crate::confluent_flow::arborescence::Arborescence;
use crate::confluent_flow::support_graph::SupportGraph;
use crate::error::{InvariantViolation, Result};
use num_traits::NumAssign;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Debug;
use tracing::{debug, trace};

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    #[default]
    Uncolored,
    Colored(usize),
}

impl Color {
    #[inline]
    pub fn is_colored(self) -> bool {
        matches!(self, Color::Colored(_))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operator {
    Aggregate,
    BreakSawtooth,
    Pivot,
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct ReductionStats {
    pub aggregations: usize,
    pub sawtooth_breaks: usize,
    pub pivots: usize,
    /// Free nodes dropped because they no longer carried any flow.
    pub released_nodes: usize,
}

impl ReductionStats {
    pub fn iterations(&self) -> usize {
        self.aggregations + self.sawtooth_breaks + self.pivots
    }
}

/// State of the reduction from a support graph to a forest of arborescences.
///
/// Each iteration applies exactly one of [`aggregate`](Reduction::aggregate),
/// [`break_sawtooth`](Reduction::break_sawtooth) or [`pivot`](Reduction::pivot),
/// in that order of priority, until no free node is left.
pub struct Reduction<Flow> {
    pub(super) graph: SupportGraph<Flow>,
    pub(super) colors: Vec<Color>,
    // keyed by sink node
    pub(super) trees: BTreeMap<usize, Arborescence<Flow>>,
    pub(super) sink_for_color: Vec<Option<usize>>,
    pub(super) frontier_nodes: BTreeSet<usize>,
    pub(super) free_nodes: BTreeSet<usize>,
    pub(super) stats: ReductionStats,
}

impl<Flow> Reduction<Flow>
where
    Flow: NumAssign + Ord + Copy + Debug,
{
    /// Roots one arborescence at every node with an arc into `sink`, then
    /// removes `sink` from the graph.
    ///
    /// A root absorbs its own demand and everything flowing into it. Flow the
    /// maximum flow sends from a root onward to other nodes is withdrawn first,
    /// so every unit of delivered demand is counted at exactly one root.
    pub fn new(mut graph: SupportGraph<Flow>, sink: usize) -> Result<Self> {
        let sinks: Vec<usize> = graph.predecessors(sink).collect();
        withdraw_sink_outflow(&mut graph, sink, &sinks)?;

        let mut colors = vec![Color::Uncolored; graph.node_bound()];
        let mut trees = BTreeMap::new();
        let mut frontier_nodes = BTreeSet::new();
        for (color, &root) in sinks.iter().enumerate() {
            let congestion = graph.demand(root) + graph.in_weight(root);
            trees.insert(root, Arborescence::new(color, congestion));
            colors[root] = Color::Colored(color);
        }
        for &root in &sinks {
            frontier_nodes.extend(graph.predecessors(root).filter(|&u| !colors[u].is_colored()));
        }
        graph.remove_node(sink);

        let idle: Vec<usize> = graph.nodes().filter(|&u| !colors[u].is_colored() && graph.out_degree(u) == 0).collect();
        for u in idle {
            graph.remove_node(u);
        }
        let free_nodes: BTreeSet<usize> = graph.nodes().filter(|&u| !colors[u].is_colored()).collect();

        debug!(sinks = sinks.len(), frontier = frontier_nodes.len(), free = free_nodes.len(), "initialized arborescences");
        Ok(Reduction {
            graph,
            colors,
            trees,
            sink_for_color: sinks.into_iter().map(Some).collect(),
            frontier_nodes,
            free_nodes,
            stats: ReductionStats::default(),
        })
    }

    /// Resumes a reduction from a partial coloring: `trees` are the existing
    /// arborescences keyed by root, `colored` assigns `(node, color)` to the
    /// non-root members. Frontier and free nodes are derived from the graph.
    pub fn from_coloring<I>(graph: SupportGraph<Flow>, trees: BTreeMap<usize, Arborescence<Flow>>, colored: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut colors = vec![Color::Uncolored; graph.node_bound()];
        let mut sink_for_color = Vec::new();
        let paint = |colors: &mut Vec<Color>, node: usize, color: usize| {
            if node >= colors.len() {
                colors.resize(node + 1, Color::Uncolored);
            }
            colors[node] = Color::Colored(color);
        };
        for (&root, tree) in &trees {
            if tree.color >= sink_for_color.len() {
                sink_for_color.resize(tree.color + 1, None);
            }
            sink_for_color[tree.color] = Some(root);
            paint(&mut colors, root, tree.color);
        }
        for (node, color) in colored {
            paint(&mut colors, node, color);
        }

        let mut reduction = Reduction {
            graph,
            colors,
            trees,
            sink_for_color,
            frontier_nodes: BTreeSet::new(),
            free_nodes: BTreeSet::new(),
            stats: ReductionStats::default(),
        };
        let free: Vec<usize> = reduction.graph.nodes().filter(|&u| !reduction.color(u).is_colored() && reduction.graph.out_degree(u) > 0).collect();
        reduction.free_nodes.extend(free.iter().copied());
        for u in free {
            reduction.refresh_frontier(u);
        }
        reduction
    }

    /// Applies operators until every node carrying flow is colored.
    pub fn run(&mut self) -> Result<()> {
        while !self.is_finished() {
            self.step()?;
        }
        Ok(())
    }

    /// Applies the first operator that makes progress.
    pub fn step(&mut self) -> Result<Operator> {
        let operator = if self.aggregate() {
            self.stats.aggregations += 1;
            Operator::Aggregate
        } else if self.break_sawtooth() {
            self.stats.sawtooth_breaks += 1;
            Operator::BreakSawtooth
        } else if self.pivot() {
            self.stats.pivots += 1;
            Operator::Pivot
        } else {
            return Err(InvariantViolation::Stalled { free_nodes: self.free_nodes.len() }.into());
        };
        Ok(operator)
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.free_nodes.is_empty()
    }

    /// Checks flow conservation at every free node.
    pub fn check_conservation(&self) -> Result<()> {
        match self.free_nodes.iter().find(|&&u| !self.graph.is_conserved(u)) {
            Some(&node) => Err(InvariantViolation::Conservation { node }.into()),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn color(&self, u: usize) -> Color {
        self.colors.get(u).copied().unwrap_or_default()
    }

    pub fn sink_for_color(&self, color: usize) -> Option<usize> {
        self.sink_for_color.get(color).copied().flatten()
    }

    pub fn graph(&self) -> &SupportGraph<Flow> {
        &self.graph
    }

    pub fn trees(&self) -> &BTreeMap<usize, Arborescence<Flow>> {
        &self.trees
    }

    pub fn frontier_nodes(&self) -> &BTreeSet<usize> {
        &self.frontier_nodes
    }

    pub fn free_nodes(&self) -> &BTreeSet<usize> {
        &self.free_nodes
    }

    pub fn stats(&self) -> ReductionStats {
        self.stats
    }

    pub fn into_trees(self) -> BTreeMap<usize, Arborescence<Flow>> {
        self.trees
    }

    /// Keeps `u` in the frontier exactly when it is free and has a colored out-neighbor.
    pub(super) fn refresh_frontier(&mut self, u: usize) {
        let feeds_tree = self.graph.successors(u).any(|(v, _)| self.color(v).is_colored());
        if feeds_tree && self.free_nodes.contains(&u) {
            if self.frontier_nodes.insert(u) {
                trace!(node = u, "entered frontier");
            }
        } else if self.frontier_nodes.remove(&u) {
            trace!(node = u, "left frontier");
        }
    }

    /// Drops a free node that no longer sends any flow.
    pub(super) fn release(&mut self, u: usize) {
        self.free_nodes.remove(&u);
        self.frontier_nodes.remove(&u);
        self.graph.remove_node(u);
        self.stats.released_nodes += 1;
        trace!(node = u, "released idle node");
    }
}

fn withdraw_sink_outflow<Flow>(graph: &mut SupportGraph<Flow>, sink: usize, roots: &[usize]) -> Result<()>
where
    Flow: NumAssign + Ord + Copy + Debug,
{
    // (root the flow left from, node holding the surplus, amount)
    let mut pending = VecDeque::new();
    for &root in roots {
        let outflow: Vec<(usize, Flow)> = graph.successors(root).filter(|&(v, _)| v != sink).collect();
        for (v, weight) in outflow {
            graph.remove_arc(root, v);
            pending.push_back((root, v, weight));
        }
    }

    while let Some((root, u, mut surplus)) = pending.pop_front() {
        if u == sink || roots.binary_search(&u).is_ok() {
            continue;
        }
        let outflow: Vec<(usize, Flow)> = graph.successors(u).collect();
        for (v, weight) in outflow {
            if surplus == Flow::zero() {
                break;
            }
            let amount = weight.min(surplus);
            graph.decrease_weight(u, v, amount);
            surplus -= amount;
            pending.push_back((root, v, amount));
        }
        if surplus > Flow::zero() {
            return Err(InvariantViolation::SinkOutflow { sink: root, node: u }.into());
        }
        trace!(root, node = u, "withdrew flow leaving a root");
    }
    Ok(())
}
