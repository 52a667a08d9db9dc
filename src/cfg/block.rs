//! Basic block partition
//!
//! One linear pass over the CFG nodes in id order, using the leader rule: a
//! node starts a new block if it is a first node, a join, or immediately
//! follows a branch. Blocks own an ordered node sequence and link to their
//! predecessor/successor blocks.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::cfg::node::{CfgNode, Flow};

/// Index of a basic block within one CFG
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub usize);

impl BlockId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A maximal straight-line run of CFG nodes
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    /// Nodes in id order; the first is the leader
    pub nodes: Vec<NodeIndex>,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<BlockId>,
}

impl BasicBlock {
    #[must_use]
    pub fn leader(&self) -> NodeIndex {
        self.nodes[0]
    }

    #[must_use]
    pub fn last(&self) -> NodeIndex {
        *self.nodes.last().unwrap_or(&self.nodes[0])
    }
}

fn non_loopback_in_degree(graph: &DiGraph<CfgNode, Flow>, node: NodeIndex) -> usize {
    graph
        .edges_directed(node, Direction::Incoming)
        .filter(|e| !e.weight().loopback)
        .count()
}

fn is_branch(graph: &DiGraph<CfgNode, Flow>, node: NodeIndex) -> bool {
    graph[node].is_branch_kind() || graph.edges_directed(node, Direction::Outgoing).count() > 1
}

/// Partition the CFG into basic blocks and compute block links.
///
/// Returns the blocks plus a node-to-block map.
pub(crate) fn partition(
    graph: &DiGraph<CfgNode, Flow>,
) -> (Vec<BasicBlock>, HashMap<NodeIndex, BlockId>) {
    let mut in_id_order: Vec<NodeIndex> = graph.node_indices().collect();
    in_id_order.sort_by_key(|&n| graph[n].id);

    let mut blocks: Vec<BasicBlock> = Vec::new();
    let mut node_block: HashMap<NodeIndex, BlockId> = HashMap::new();
    let mut previous: Option<NodeIndex> = None;

    for node in in_id_order {
        let leader = match previous {
            None => true,
            Some(prev) => {
                non_loopback_in_degree(graph, node) != 1
                    || is_branch(graph, prev)
                    // A node whose single predecessor is not the textually
                    // previous node starts its own block.
                    || !graph
                        .edges_directed(node, Direction::Incoming)
                        .any(|e| !e.weight().loopback && e.source() == prev)
            }
        };
        if leader {
            let id = BlockId(blocks.len());
            blocks.push(BasicBlock {
                id,
                nodes: vec![node],
                predecessors: Vec::new(),
                successors: Vec::new(),
            });
        } else {
            blocks.last_mut().expect("leader rule seeds a block").nodes.push(node);
        }
        let id = blocks.last().expect("at least one block exists").id;
        node_block.insert(node, id);
        previous = Some(node);
    }

    for edge in graph.edge_references() {
        let src = node_block[&edge.source()];
        let dst = node_block[&edge.target()];
        if src != dst {
            if !blocks[src.index()].successors.contains(&dst) {
                blocks[src.index()].successors.push(dst);
            }
            if !blocks[dst.index()].predecessors.contains(&src) {
                blocks[dst.index()].predecessors.push(src);
            }
        }
    }

    (blocks, node_block)
}

/// Forward closure over block successor links, excluding the start block
/// unless it is reachable from itself.
pub(crate) fn reachable_from(blocks: &[BasicBlock], start: BlockId) -> Vec<BlockId> {
    let mut reachable = vec![false; blocks.len()];
    let mut stack: Vec<BlockId> = blocks[start.index()].successors.clone();
    while let Some(b) = stack.pop() {
        if reachable[b.index()] {
            continue;
        }
        reachable[b.index()] = true;
        stack.extend(blocks[b.index()].successors.iter().copied());
    }
    reachable
        .iter()
        .enumerate()
        .filter_map(|(i, &r)| r.then_some(BlockId(i)))
        .collect()
}
