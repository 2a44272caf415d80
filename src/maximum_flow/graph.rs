use num_traits::NumAssign;

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Edge<Flow> {
    pub from: usize,
    pub to: usize,
    pub flow: Flow,
    pub capacity: Flow,
}

/// Capacitated digraph handed to a maximum flow solver, which writes the
/// flow of every edge back into it. Nodes and edges are addressed by the
/// indices `add_node` and `add_edge` return.
#[derive(Debug, Clone)]
pub struct Graph<Flow> {
    num_nodes: usize,
    pub(crate) edges: Vec<Edge<Flow>>,
}

impl<Flow> Default for Graph<Flow> {
    fn default() -> Self {
        Graph { num_nodes: 0, edges: Vec::new() }
    }
}

impl<Flow> Graph<Flow>
where
    Flow: NumAssign + Ord + Copy,
{
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn add_node(&mut self) -> usize {
        self.num_nodes += 1;
        self.num_nodes - 1
    }

    pub fn add_nodes(&mut self, count: usize) -> Vec<usize> {
        let first = self.num_nodes;
        self.num_nodes += count;
        (first..self.num_nodes).collect()
    }

    /// Returns `None` for an endpoint outside the graph or a negative capacity.
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: Flow) -> Option<usize> {
        if from.max(to) >= self.num_nodes || capacity < Flow::zero() {
            return None;
        }
        self.edges.push(Edge { from, to, flow: Flow::zero(), capacity });
        Some(self.edges.len() - 1)
    }

    pub fn edge(&self, edge_id: usize) -> Option<&Edge<Flow>> {
        self.edges.get(edge_id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge<Flow>> + '_ {
        self.edges.iter()
    }

    #[inline]
    pub fn flow(&self, edge_id: usize) -> Option<Flow> {
        self.edges.get(edge_id).map(|edge| edge.flow)
    }

    pub fn flow_value(&self, source: usize) -> Flow {
        let out = self.sum_flows(|edge| edge.from == source);
        let back = self.sum_flows(|edge| edge.to == source);
        out - back
    }

    /// Flow entering `node` minus flow leaving it.
    pub fn excess(&self, node: usize) -> Flow {
        let inflow = self.sum_flows(|edge| edge.to == node);
        let outflow = self.sum_flows(|edge| edge.from == node);
        inflow - outflow
    }

    fn sum_flows(&self, select: impl Fn(&Edge<Flow>) -> bool) -> Flow {
        self.edges.iter().filter(|edge| select(edge)).fold(Flow::zero(), |sum, edge| sum + edge.flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_edges_outside_the_graph() {
        let mut graph: Graph<i64> = Graph::default();
        graph.add_nodes(2);
        assert_eq!(graph.add_edge(0, 1, 3), Some(0));
        assert_eq!(graph.add_edge(0, 2, 3), None);
        assert_eq!(graph.add_edge(1, 0, -1), None);
        assert_eq!(graph.num_edges(), 1);
        assert_eq!(graph.edge(0).map(|edge| edge.capacity), Some(3));
    }

    #[test]
    fn flow_value_counts_net_outflow() {
        let mut graph: Graph<i64> = Graph::default();
        assert_eq!(graph.add_nodes(3), vec![0, 1, 2]);
        graph.add_edge(0, 1, 5).unwrap();
        graph.add_edge(1, 0, 5).unwrap();
        graph.add_edge(1, 2, 5).unwrap();
        for (edge, flow) in graph.edges.iter_mut().zip([4, 1, 3]) {
            edge.flow = flow;
        }
        assert_eq!(graph.flow_value(0), 3);
        assert_eq!(graph.excess(2), 3);
        assert_eq!(graph.excess(1), 0);
        assert_eq!(graph.flow(1), Some(1));
    }
}
