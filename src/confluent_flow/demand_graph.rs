use crate::error::{InvalidInput, Result};
use num_traits::{CheckedAdd, NumAssign};

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct DemandArc<Flow> {
    pub from: usize,
    pub to: usize,
    /// `None` is an uncapacitated arc.
    pub capacity: Option<Flow>,
}

/// Input network: every node may carry a demand destined for the sink.
///
/// ```
/// use confluent_flow::confluent_flow::demand_graph::DemandGraph;
///
/// let mut graph: DemandGraph<i64> = DemandGraph::default();
/// let [a, b, t] = [graph.add_node(), graph.add_node(), graph.add_node()];
/// graph.set_demand(a, 2).unwrap();
/// graph.add_arc(a, b, 2).unwrap();
/// graph.add_uncapacitated_arc(b, t).unwrap();
/// assert_eq!(graph.total_demand(), Some(2));
/// assert!(graph.set_demand(b, -1).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DemandGraph<Flow> {
    demands: Vec<Flow>,
    arcs: Vec<DemandArc<Flow>>,
}

impl<Flow> Default for DemandGraph<Flow> {
    fn default() -> Self {
        DemandGraph { demands: Vec::new(), arcs: Vec::new() }
    }
}

impl<Flow> DemandGraph<Flow>
where
    Flow: NumAssign + Ord + Copy,
{
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.demands.len()
    }

    #[inline]
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    pub fn add_node(&mut self) -> usize {
        self.demands.push(Flow::zero());
        self.demands.len() - 1
    }

    pub fn add_nodes(&mut self, num_nodes: usize) -> Vec<usize> {
        let first = self.demands.len();
        self.demands.resize(first + num_nodes, Flow::zero());
        (first..self.demands.len()).collect()
    }

    pub fn set_demand(&mut self, node: usize, demand: Flow) -> Result<()> {
        self.check_node(node)?;
        if demand < Flow::zero() {
            return Err(InvalidInput::NegativeDemand { node }.into());
        }
        self.demands[node] = demand;
        Ok(())
    }

    pub fn demand(&self, node: usize) -> Option<Flow> {
        self.demands.get(node).copied()
    }

    pub fn demands(&self) -> &[Flow] {
        &self.demands
    }

    // return arc index
    pub fn add_arc(&mut self, from: usize, to: usize, capacity: Flow) -> Result<usize> {
        self.push_arc(DemandArc { from, to, capacity: Some(capacity) })
    }

    pub fn add_uncapacitated_arc(&mut self, from: usize, to: usize) -> Result<usize> {
        self.push_arc(DemandArc { from, to, capacity: None })
    }

    pub fn arcs(&self) -> &[DemandArc<Flow>] {
        &self.arcs
    }

    /// `None` if the sum overflows `Flow`.
    pub fn total_demand(&self) -> Option<Flow>
    where
        Flow: CheckedAdd,
    {
        self.demands.iter().try_fold(Flow::zero(), |sum, demand| sum.checked_add(demand))
    }

    /// Builds a graph from `(from, to, capacity)` triples, growing the node
    /// set to cover every endpoint.
    pub fn from_arcs<I>(arcs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, Flow)>,
    {
        let mut graph = DemandGraph::default();
        for (from, to, capacity) in arcs {
            let needed = from.max(to) + 1;
            if needed > graph.num_nodes() {
                graph.add_nodes(needed - graph.num_nodes());
            }
            graph.add_arc(from, to, capacity)?;
        }
        Ok(graph)
    }

    /// Checks every demand and arc. Solving runs this before any flow is computed.
    pub fn validate(&self) -> Result<()> {
        for (node, &demand) in self.demands.iter().enumerate() {
            if demand < Flow::zero() {
                return Err(InvalidInput::NegativeDemand { node }.into());
            }
        }
        self.arcs.iter().try_for_each(|arc| self.check_arc(arc))
    }

    pub(crate) fn check_node(&self, node: usize) -> Result<()> {
        if node >= self.num_nodes() {
            return Err(InvalidInput::NodeOutOfRange { node, num_nodes: self.num_nodes() }.into());
        }
        Ok(())
    }

    fn check_arc(&self, arc: &DemandArc<Flow>) -> Result<()> {
        self.check_node(arc.from)?;
        self.check_node(arc.to)?;
        if arc.from == arc.to {
            return Err(InvalidInput::SelfLoop { node: arc.from }.into());
        }
        if matches!(arc.capacity, Some(capacity) if capacity < Flow::zero()) {
            return Err(InvalidInput::NegativeCapacity { from: arc.from, to: arc.to }.into());
        }
        Ok(())
    }

    fn push_arc(&mut self, arc: DemandArc<Flow>) -> Result<usize> {
        self.check_arc(&arc)?;
        self.arcs.push(arc);
        Ok(self.arcs.len() - 1)
    }
}
