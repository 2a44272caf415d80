use confluent_flow::maximum_flow::MaximumFlowAlgorithm;
use confluent_flow::{ConfluentFlow, ConfluentFlowConfig, ConfluentFlowSolver, DemandGraph};
use num_traits::Zero;
use std::fmt::Display;
use tracing_subscriber::EnvFilter;

fn eleven_nodes() -> confluent_flow::Result<(DemandGraph<u64>, usize)> {
    let mut graph = DemandGraph::default();
    graph.add_nodes(12);
    let sink = 11;
    for (node, demand) in [(0, 4), (2, 1), (3, 1), (5, 4), (6, 2), (7, 1), (8, 1), (10, 2)] {
        graph.set_demand(node, demand)?;
    }
    for (from, to, capacity) in [
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
        (8, sink, 2),
        (9, sink, 5),
        (10, sink, 9),
    ] {
        graph.add_arc(from, to, capacity)?;
    }
    Ok((graph, sink))
}

fn lcm(a: u64, b: u64) -> u64 {
    let (mut x, mut y) = (a, b);
    while y != 0 {
        (x, y) = (y, x % y);
    }
    a / x * b
}

/// `layers` rows of a triangle draining into a sink below the last row.
/// Every node of row `i` has demand `1 / (i + 1)` and the capacities make
/// demand plus inflow equal to 1 at every node. All values are scaled by
/// `lcm(1..=layers)` to stay integral.
fn pyramid(layers: usize) -> confluent_flow::Result<(DemandGraph<u64>, usize)> {
    let scale = (1..=layers as u64).fold(1, lcm);
    let id = |i: usize, j: usize| i * (i + 1) / 2 + j;

    let mut graph = DemandGraph::default();
    graph.add_nodes(layers * (layers + 1) / 2 + 1);
    let sink = layers * (layers + 1) / 2;
    for i in 0..layers {
        let share = scale / (i as u64 + 1);
        for j in 0..=i {
            graph.set_demand(id(i, j), share)?;
        }
    }
    for i in 0..layers - 1 {
        let step = scale / (i as u64 + 2);
        let mut capacity = scale - step;
        for j in 0..=i {
            graph.add_arc(id(i, j), id(i + 1, j), capacity)?;
            capacity = scale - capacity;
            graph.add_arc(id(i, j), id(i + 1, j + 1), capacity)?;
            capacity = scale - capacity - step;
        }
    }
    for j in 0..layers {
        graph.add_uncapacitated_arc(id(layers - 1, j), sink)?;
    }
    Ok((graph, sink))
}

fn print_forest<Flow: Display + Copy + Ord + num_traits::NumAssign>(name: &str, flow: &ConfluentFlow<Flow>) {
    println!("{name}: delivered {} of {}", flow.delivered(), flow.requested());
    for (root, tree) in flow.arborescences() {
        let arcs: Vec<String> = tree.tree_arcs.iter().map(|(u, v)| format!("{u}->{v}")).collect();
        println!("  root {root:>2} color {} congestion {:>4}  [{}]", tree.color, tree.congestion, arcs.join(", "));
    }
    if let Some(max) = flow.max_congestion().filter(|max| !max.is_zero()) {
        println!("  max congestion {max}, {:?}", flow.stats());
    }
}

fn main() -> confluent_flow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let (graph, sink) = eleven_nodes()?;
    let flow = ConfluentFlowSolver::default().solve(&graph, sink)?;
    print_forest("eleven nodes", &flow);

    let solver = ConfluentFlowSolver::new(ConfluentFlowConfig { maximum_flow: MaximumFlowAlgorithm::EdmondsKarp, check_invariants: true });
    for layers in [4, 6, 8] {
        let (graph, sink) = pyramid(layers)?;
        let flow = solver.solve(&graph, sink)?;
        print_forest(&format!("pyramid with {layers} layers"), &flow);
    }
    Ok(())
}
