use crate::dbglib::KmerCounts;
use indexmap::{map::Entry, IndexMap, IndexSet};

/// Index of a (k-1)-mer in the graph's arena
pub type NodeId = usize;

/// de Bruijn graph over (k-1)-mers.
///
/// Nodes are interned, so a (k-1)-mer has exactly one id for the life of the graph. Each kmer
/// is an edge from its prefix to its suffix carrying the number of times it was seen.
/// Removed nodes keep their arena slot but are no longer alive.
#[derive(Debug, Clone)]
pub struct DbGraph {
    kmer: usize,
    nodes: IndexSet<Vec<u8>>,
    succs: Vec<IndexMap<NodeId, u64>>,
    preds: Vec<IndexSet<NodeId>>,
    alive: Vec<bool>,
    num_nodes: usize,
    num_edges: usize,
}

impl DbGraph {
    pub fn new(kmer: usize) -> Self {
        Self {
            kmer,
            nodes: IndexSet::new(),
            succs: vec![],
            preds: vec![],
            alive: vec![],
            num_nodes: 0,
            num_edges: 0,
        }
    }

    /// Build from aggregated counts. Node ids follow the counts' order
    pub fn from_counts(counts: &KmerCounts) -> Self {
        let mut graph = DbGraph::new(counts.kmer);
        for (kmer, cnt) in counts.iter() {
            graph.add_kmer_weighted(kmer, cnt);
        }
        graph
    }

    pub fn kmer(&self) -> usize {
        self.kmer
    }

    fn intern(&mut self, seq: &[u8]) -> NodeId {
        let id = match self.nodes.get_index_of(seq) {
            Some(id) => id,
            None => {
                let (id, _) = self.nodes.insert_full(seq.to_vec());
                self.succs.push(IndexMap::new());
                self.preds.push(IndexSet::new());
                self.alive.push(false);
                id
            }
        };
        if !self.alive[id] {
            self.alive[id] = true;
            self.num_nodes += 1;
        }
        id
    }

    pub fn add_kmer(&mut self, kmer: &[u8]) {
        self.add_kmer_weighted(kmer, 1);
    }

    /// Add `weight` observations of a kmer, creating its nodes and edge on first sight
    pub fn add_kmer_weighted(&mut self, kmer: &[u8], weight: u64) {
        debug_assert_eq!(kmer.len(), self.kmer);
        let from = self.intern(&kmer[..kmer.len() - 1]);
        let to = self.intern(&kmer[1..]);
        match self.succs[from].entry(to) {
            Entry::Occupied(mut e) => *e.get_mut() += weight,
            Entry::Vacant(e) => {
                e.insert(weight);
                self.num_edges += 1;
                self.preds[to].insert(from);
            }
        }
    }

    /// Id of a live node
    pub fn node_id(&self, seq: &[u8]) -> Option<NodeId> {
        self.nodes
            .get_index_of(seq)
            .filter(|&id| self.alive[id])
    }

    pub fn seq(&self, node: NodeId) -> &[u8] {
        &self.nodes[node]
    }

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.alive.get(node).copied().unwrap_or(false)
    }

    pub fn node_count(&self) -> usize {
        self.num_nodes
    }

    pub fn edge_count(&self) -> usize {
        self.num_edges
    }

    /// Live nodes in arena order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(move |&id| self.alive[id])
    }

    /// Live nodes in lexicographic order of their sequence
    pub fn sorted_node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.node_ids().collect();
        ids.sort_by(|a, b| self.nodes[*a].cmp(&self.nodes[*b]));
        ids
    }

    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, u64)> + '_ {
        self.succs[node].iter().map(|(n, w)| (*n, *w))
    }

    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.preds[node].iter().copied()
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.succs[node].len()
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.preds[node].len()
    }

    /// Exactly one edge in and one edge out
    pub fn is_simple(&self, node: NodeId) -> bool {
        self.in_degree(node) == 1 && self.out_degree(node) == 1
    }

    pub fn weight(&self, from: NodeId, to: NodeId) -> Option<u64> {
        self.succs.get(from).and_then(|s| s.get(&to)).copied()
    }

    /// The kmer an edge stands for
    pub fn edge_kmer(&self, from: NodeId, to: NodeId) -> Vec<u8> {
        let mut kmer = self.nodes[from].clone();
        if let Some(last) = self.nodes[to].last() {
            kmer.push(*last);
        }
        kmer
    }

    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Option<u64> {
        let weight = self.succs[from].shift_remove(&to)?;
        self.preds[to].shift_remove(&from);
        self.num_edges -= 1;
        Some(weight)
    }

    /// Drop a node along with every edge touching it
    pub fn remove_node(&mut self, node: NodeId) {
        if !self.is_alive(node) {
            return;
        }
        let outs: Vec<NodeId> = self.succs[node].keys().copied().collect();
        for to in outs {
            self.remove_edge(node, to);
        }
        let ins: Vec<NodeId> = self.preds[node].iter().copied().collect();
        for from in ins {
            self.remove_edge(from, node);
        }
        self.alive[node] = false;
        self.num_nodes -= 1;
    }

    /// Remove whichever of `nodes` were left without edges. Returns how many were removed
    pub fn remove_isolated(&mut self, nodes: &[NodeId]) -> usize {
        let mut removed = 0;
        for &node in nodes {
            if self.is_alive(node) && self.in_degree(node) == 0 && self.out_degree(node) == 0 {
                self.remove_node(node);
                removed += 1;
            }
        }
        removed
    }

    /// Every edge as (from, to, multiplicity), in arena order
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, u64)> + '_ {
        self.node_ids()
            .flat_map(move |from| self.successors(from).map(move |(to, w)| (from, to, w)))
    }

    /// Every kmer in the graph with its multiplicity, sorted
    pub fn kmers(&self) -> Vec<(Vec<u8>, u64)> {
        let mut ret: Vec<(Vec<u8>, u64)> = self
            .edges()
            .map(|(from, to, w)| (self.edge_kmer(from, to), w))
            .collect();
        ret.sort();
        ret
    }
}
