use crate::dbglib::{DbGraph, NodeId};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contig {
    pub seq: String,
    /// Number of kmers (edges) walked
    pub edges: usize,
    /// Mean multiplicity of the walked edges
    pub coverage: f64,
}

impl Contig {
    fn from_path(graph: &DbGraph, path: &[NodeId], total: u64) -> Self {
        let mut seq = graph.seq(path[0]).to_vec();
        seq.extend(path[1..].iter().filter_map(|n| graph.seq(*n).last()));
        let edges = path.len() - 1;
        Self {
            // nodes only ever hold ACGT
            seq: String::from_utf8_lossy(&seq).into_owned(),
            edges,
            coverage: total as f64 / edges.max(1) as f64,
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Nodes where a non-branching walk must begin: anything that isn't exactly one-in one-out.
/// Lexicographic order
pub fn get_starting_nodes(graph: &DbGraph) -> Vec<NodeId> {
    graph
        .sorted_node_ids()
        .into_iter()
        .filter(|&n| !graph.is_simple(n))
        .collect()
}

/// Nodes without successors
pub fn get_sink_nodes(graph: &DbGraph) -> Vec<NodeId> {
    graph
        .sorted_node_ids()
        .into_iter()
        .filter(|&n| graph.out_degree(n) == 0)
        .collect()
}

/// Take the edge start->first then keep going while the current node is one-in one-out.
/// Stops at a branch, a dead end, or a node this walk already passed through
fn walk(
    graph: &DbGraph,
    start: NodeId,
    first: NodeId,
    consumed: &mut HashSet<(NodeId, NodeId)>,
) -> Contig {
    let mut path = vec![start, first];
    let mut visited = HashSet::from([start]);
    let mut total = graph.weight(start, first).unwrap_or(0);
    consumed.insert((start, first));

    let mut cur = first;
    while graph.is_simple(cur) && visited.insert(cur) {
        let Some((next, weight)) = graph.successors(cur).next() else {
            break;
        };
        if !consumed.insert((cur, next)) {
            break;
        }
        total += weight;
        path.push(next);
        cur = next;
    }

    Contig::from_path(graph, &path, total)
}

/// Walk every edge exactly once, one contig per maximal non-branching path.
/// Pure cycles with no starting node are entered at their lexicographically smallest node
pub fn extract_contigs(graph: &DbGraph) -> Vec<Contig> {
    let mut consumed: HashSet<(NodeId, NodeId)> = HashSet::with_capacity(graph.edge_count());
    let mut contigs = vec![];

    for start in get_starting_nodes(graph) {
        let outs: Vec<NodeId> = graph.successors(start).map(|(n, _)| n).collect();
        for first in outs {
            if !consumed.contains(&(start, first)) {
                contigs.push(walk(graph, start, first, &mut consumed));
            }
        }
    }

    let n_linear = contigs.len();
    // Only isolated cycles have edges left
    if consumed.len() < graph.edge_count() {
        for start in graph.sorted_node_ids() {
            if let Some((first, _)) = graph.successors(start).next() {
                if !consumed.contains(&(start, first)) {
                    contigs.push(walk(graph, start, first, &mut consumed));
                }
            }
        }
    }
    debug!(
        "{} contigs from paths, {} from cycles",
        n_linear,
        contigs.len() - n_linear
    );

    contigs
}
