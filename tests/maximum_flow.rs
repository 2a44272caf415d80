use confluent_flow::maximum_flow::dinic::Dinic;
use confluent_flow::maximum_flow::edmonds_karp::EdmondsKarp;
use confluent_flow::maximum_flow::ford_fulkerson::FordFulkerson;
use confluent_flow::maximum_flow::graph::Graph;
use confluent_flow::maximum_flow::{MaximumFlowAlgorithm, MaximumFlowSolver, Status};
use rstest::rstest;

fn textbook_network() -> Graph<i64> {
    let mut graph = Graph::default();
    graph.add_nodes(6);
    for (from, to, capacity) in [(0, 1, 16), (0, 2, 13), (1, 2, 10), (2, 1, 4), (1, 3, 12), (3, 2, 9), (2, 4, 14), (4, 3, 7), (3, 5, 20), (4, 5, 4)] {
        graph.add_edge(from, to, capacity).unwrap();
    }
    graph
}

#[rstest]
#[case(MaximumFlowAlgorithm::Dinic)]
#[case(MaximumFlowAlgorithm::EdmondsKarp)]
#[case(MaximumFlowAlgorithm::FordFulkerson)]
fn finds_maximum_flow(#[case] algorithm: MaximumFlowAlgorithm) {
    let mut graph = textbook_network();
    assert_eq!(algorithm.solve(0, 5, &mut graph), Status::Optimal);
    assert_eq!(graph.flow_value(0), 23);
    assert_eq!(graph.excess(5), 23);
    for node in 1..5 {
        assert_eq!(graph.excess(node), 0, "node {node}");
    }
    assert!(graph.edges().all(|edge| 0 <= edge.flow && edge.flow <= edge.capacity));
}

#[rstest]
#[case::dinic(Box::new(Dinic::default()))]
#[case::edmonds_karp(Box::new(EdmondsKarp::default()))]
#[case::ford_fulkerson(Box::new(FordFulkerson::default()))]
fn rejects_bad_terminals(#[case] mut solver: Box<dyn MaximumFlowSolver<i64>>) {
    let mut graph = textbook_network();
    assert_eq!(solver.solve(0, 0, &mut graph), Status::BadInput);
    assert_eq!(solver.solve(0, 6, &mut graph), Status::BadInput);
    assert_eq!(graph.flow_value(0), 0);
}

#[rstest]
#[case(MaximumFlowAlgorithm::Dinic)]
#[case(MaximumFlowAlgorithm::EdmondsKarp)]
#[case(MaximumFlowAlgorithm::FordFulkerson)]
fn disconnected_sink_gets_nothing(#[case] mut algorithm: MaximumFlowAlgorithm) {
    let mut graph: Graph<u32> = Graph::default();
    graph.add_nodes(4);
    graph.add_edge(0, 1, 5).unwrap();
    graph.add_edge(2, 3, 5).unwrap();
    assert_eq!(MaximumFlowSolver::solve(&mut algorithm, 0, 3, &mut graph), Status::Optimal);
    assert_eq!(graph.excess(3), 0);
}
