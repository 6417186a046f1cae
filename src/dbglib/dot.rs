use crate::dbglib::{DbGraph, NodeId};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Copy the live part of the graph into petgraph, nodes labeled by their (k-1)-mer and
/// edges by multiplicity
pub fn to_petgraph(graph: &DbGraph) -> DiGraph<String, u64> {
    let mut pg = DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    let index: HashMap<NodeId, NodeIndex> = graph
        .sorted_node_ids()
        .into_iter()
        .map(|n| {
            let label = String::from_utf8_lossy(graph.seq(n)).into_owned();
            (n, pg.add_node(label))
        })
        .collect();

    for (from, to, weight) in graph.edges() {
        if let (Some(a), Some(b)) = (index.get(&from), index.get(&to)) {
            pg.add_edge(*a, *b, weight);
        }
    }
    pg
}

/// Graphviz rendering of the graph
pub fn to_dot(graph: &DbGraph) -> String {
    format!("{}", Dot::new(&to_petgraph(graph)))
}
