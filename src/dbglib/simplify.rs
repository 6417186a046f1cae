use crate::dbglib::{DbGraph, DbgError, NodeId};
use bitflags::bitflags;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;

bitflags! {
    /// Which simplification passes run
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Passes: u8 {
        const TIPS = 0b01;
        const BUBBLES = 0b10;
    }
}

#[derive(Debug, Clone)]
pub struct SimplifyParams {
    pub passes: Passes,
    /// Longest dead-end chain (in edges) that may be clipped
    pub max_tip_len: usize,
    /// Longest branch (in edges) traced when looking for bubbles
    pub max_bubble_len: usize,
    /// Largest length difference (in edges) between two branches of a bubble
    pub bubble_len_slack: usize,
    pub max_rounds: usize,
}

impl SimplifyParams {
    /// Defaults scaled to the kmer size
    pub fn for_kmer(kmer: usize) -> Self {
        Self {
            passes: Passes::all(),
            max_tip_len: 2 * kmer,
            max_bubble_len: 2 * kmer,
            bubble_len_slack: 1,
            max_rounds: 64,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SimplifyReport {
    pub tips_removed: usize,
    pub bubbles_removed: usize,
    pub rounds: usize,
}

/// A non-branching chain of nodes hanging off (or leading between) junctions
#[derive(Debug)]
struct Branch {
    /// Nodes in edge direction
    nodes: Vec<NodeId>,
    total: u64,
}

impl Branch {
    fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    fn support(&self) -> OrderedFloat<f64> {
        OrderedFloat(self.total as f64 / self.len().max(1) as f64)
    }

    fn from_nodes(graph: &DbGraph, nodes: Vec<NodeId>) -> Self {
        let total = nodes
            .windows(2)
            .filter_map(|pair| graph.weight(pair[0], pair[1]))
            .sum();
        Self { nodes, total }
    }

    fn spell(&self, graph: &DbGraph) -> Vec<u8> {
        let mut seq = graph.seq(self.nodes[0]).to_vec();
        seq.extend(self.nodes[1..].iter().filter_map(|n| graph.seq(*n).last()));
        seq
    }

    /// Delete the branch's edges and whatever nodes that leaves stranded
    fn remove(&self, graph: &mut DbGraph) {
        for pair in self.nodes.windows(2) {
            graph.remove_edge(pair[0], pair[1]);
        }
        graph.remove_isolated(&self.nodes);
    }
}

/// Clip tips then pop bubbles until neither changes the graph
pub fn simplify(graph: &mut DbGraph, params: &SimplifyParams) -> Result<SimplifyReport, DbgError> {
    let mut report = SimplifyReport::default();
    loop {
        if report.rounds >= params.max_rounds {
            return Err(DbgError::NonConvergence(report.rounds));
        }
        report.rounds += 1;

        let tips = if params.passes.contains(Passes::TIPS) {
            clip_tips(graph, params.max_tip_len)
        } else {
            0
        };
        let bubbles = if params.passes.contains(Passes::BUBBLES) {
            pop_bubbles(graph, params.max_bubble_len, params.bubble_len_slack)
        } else {
            0
        };
        debug!(
            "simplify round {}: {} tips, {} bubbles",
            report.rounds, tips, bubbles
        );
        report.tips_removed += tips;
        report.bubbles_removed += bubbles;

        if tips == 0 && bubbles == 0 {
            return Ok(report);
        }
    }
}

/// Walk from a dead end toward the graph until a junction is hit.
/// Returns the chain (in edge direction) if it's short enough to be a tip
fn trace_tip(graph: &DbGraph, end: NodeId, max_len: usize) -> Option<Branch> {
    let entry = graph.in_degree(end) == 0 && graph.out_degree(end) == 1;
    let exit = graph.out_degree(end) == 0 && graph.in_degree(end) == 1;
    if !entry && !exit {
        return None;
    }

    let mut nodes = vec![end];
    let mut cur = end;
    loop {
        if nodes.len() > max_len {
            return None;
        }
        let next = if entry {
            graph.successors(cur).next()?.0
        } else {
            graph.predecessors(cur).next()?
        };
        nodes.push(next);

        let (toward, away) = if entry {
            (graph.in_degree(next), graph.out_degree(next))
        } else {
            (graph.out_degree(next), graph.in_degree(next))
        };
        if toward >= 2 {
            break;
        }
        // linear piece with nothing to compete against, or a fork in the wrong direction
        if away != 1 || next == end {
            return None;
        }
        cur = next;
    }

    if exit {
        nodes.reverse();
    }
    Some(Branch::from_nodes(graph, nodes))
}

/// Whether a dead end (a source for entry tips, a sink for exit tips) can be reached from
/// `from` without passing back through `junction`
fn reaches_dead_end(graph: &DbGraph, from: NodeId, junction: NodeId, entry: bool) -> bool {
    let mut seen: HashSet<NodeId> = HashSet::from([junction, from]);
    let mut stack = vec![from];
    while let Some(cur) = stack.pop() {
        let next: Vec<NodeId> = if entry {
            graph.predecessors(cur).collect()
        } else {
            graph.successors(cur).map(|(n, _)| n).collect()
        };
        if next.is_empty() {
            return true;
        }
        for n in next {
            if seen.insert(n) {
                stack.push(n);
            }
        }
    }
    false
}

/// Strongest edge at the tip's junction that isn't the tip's own. Only edges on another path
/// that ends in a dead end count, so a repeat's own loop back into the junction never does
fn competitor_weight(graph: &DbGraph, tip: &Branch, entry: bool) -> u64 {
    let n = tip.nodes.len();
    if entry {
        let (last, junction) = (tip.nodes[n - 2], tip.nodes[n - 1]);
        graph
            .predecessors(junction)
            .filter(|&p| p != last && p != junction)
            .filter(|&p| reaches_dead_end(graph, p, junction, true))
            .filter_map(|p| graph.weight(p, junction))
            .max()
            .unwrap_or(0)
    } else {
        let (junction, first) = (tip.nodes[0], tip.nodes[1]);
        graph
            .successors(junction)
            .filter(|&(s, _)| s != first && s != junction)
            .filter(|&(s, _)| reaches_dead_end(graph, s, junction, false))
            .map(|(_, w)| w)
            .max()
            .unwrap_or(0)
    }
}

/// Remove dead-end chains no longer than `max_tip_len` edges whose junction has another
/// dead-ended branch at least as well supported. Weakest tips go first and every tip is re-traced before removal,
/// so two equal tips at one junction never both disappear.
pub fn clip_tips(graph: &mut DbGraph, max_tip_len: usize) -> usize {
    let mut candidates: Vec<(OrderedFloat<f64>, usize, Vec<u8>, NodeId)> = graph
        .sorted_node_ids()
        .into_iter()
        .filter_map(|end| {
            trace_tip(graph, end, max_tip_len)
                .map(|tip| (tip.support(), tip.len(), graph.seq(end).to_vec(), end))
        })
        .collect();
    candidates.sort();

    let mut removed = 0;
    for (_, _, _, end) in candidates {
        if !graph.is_alive(end) {
            continue;
        }
        let entry = graph.in_degree(end) == 0;
        let Some(tip) = trace_tip(graph, end, max_tip_len) else {
            continue;
        };
        if OrderedFloat(competitor_weight(graph, &tip, entry) as f64) < tip.support() {
            continue;
        }
        debug!(
            "clipping tip {} ({} edges)",
            String::from_utf8_lossy(&tip.spell(graph)),
            tip.len()
        );
        tip.remove(graph);
        removed += 1;
    }
    removed
}

/// Follow a chain of simple nodes out of `start` through `first`.
/// None if it loops back or runs longer than `max_len` edges
fn trace_branch(graph: &DbGraph, start: NodeId, first: NodeId, max_len: usize) -> Option<Branch> {
    let mut nodes = vec![start, first];
    let mut cur = first;
    while graph.is_simple(cur) {
        if nodes.len() > max_len {
            return None;
        }
        let (next, _) = graph.successors(cur).next()?;
        if next == start {
            return None;
        }
        nodes.push(next);
        cur = next;
    }
    if cur == start {
        return None;
    }
    Some(Branch::from_nodes(graph, nodes))
}

fn branch_order(graph: &DbGraph, a: &Branch, b: &Branch) -> Ordering {
    (a.support(), a.total, a.len(), Reverse(a.spell(graph))).cmp(&(
        b.support(),
        b.total,
        b.len(),
        Reverse(b.spell(graph)),
    ))
}

/// Find branches leaving `start` that meet again at the same node and keep only the best
/// supported one. Returns how many branches were removed
fn pop_bubbles_at(graph: &mut DbGraph, start: NodeId, max_len: usize, slack: usize) -> usize {
    let firsts: Vec<NodeId> = graph.successors(start).map(|(n, _)| n).collect();
    let mut branches: Vec<Branch> = firsts
        .into_iter()
        .filter_map(|first| trace_branch(graph, start, first, max_len))
        .collect();

    // group by where the branch lands, strongest first
    branches.sort_by(|a, b| {
        let (a_end, b_end) = (a.nodes[a.nodes.len() - 1], b.nodes[b.nodes.len() - 1]);
        a_end
            .cmp(&b_end)
            .then_with(|| branch_order(graph, b, a))
    });

    let mut removed = 0;
    let mut idx = 0;
    while idx < branches.len() {
        let end = branches[idx].nodes[branches[idx].nodes.len() - 1];
        let best = &branches[idx];
        let mut nxt = idx + 1;
        while nxt < branches.len() && branches[nxt].nodes[branches[nxt].nodes.len() - 1] == end {
            let other = &branches[nxt];
            if best.len().abs_diff(other.len()) <= slack {
                debug!(
                    "popping bubble branch {} (support {:.2}) in favor of {} (support {:.2})",
                    String::from_utf8_lossy(&other.spell(graph)),
                    other.support().0,
                    String::from_utf8_lossy(&best.spell(graph)),
                    best.support().0
                );
                other.remove(graph);
                removed += 1;
            }
            nxt += 1;
        }
        idx = nxt;
    }
    removed
}

/// Collapse bubbles, keeping the better supported path of each
pub fn pop_bubbles(graph: &mut DbGraph, max_bubble_len: usize, slack: usize) -> usize {
    let mut removed = 0;
    for start in graph.sorted_node_ids() {
        if graph.is_alive(start) && graph.out_degree(start) >= 2 {
            removed += pop_bubbles_at(graph, start, max_bubble_len, slack);
        }
    }
    removed
}
