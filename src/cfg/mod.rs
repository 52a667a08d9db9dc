//! Control Flow Graph (CFG) module
//!
//! Builds and queries the flow graph of a single method body: one node per
//! constituent statement, labeled flow edges (true/false/loopback), and a
//! basic-block partition derived in one linear pass.

pub mod block;
pub mod builder;
pub mod node;
pub mod visualization;

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::ast::{StatementTree, StmtId};
use crate::error::Result;

pub use block::{BasicBlock, BlockId};
pub use node::{BlockKind, BranchKind, CfgNode, CfgNodeKind, Flow, FlowKind};

/// Control flow graph of one method body.
///
/// Borrows the input statement tree for the duration of the analysis; all
/// node ids are local to this graph.
pub struct Cfg<'a> {
    tree: &'a StatementTree,
    graph: DiGraph<CfgNode, Flow>,
    blocks: Vec<BasicBlock>,
    node_block: HashMap<NodeIndex, BlockId>,
    stmt_nodes: HashMap<StmtId, NodeIndex>,
}

impl<'a> Cfg<'a> {
    /// Build the CFG for a method body.
    ///
    /// Fails with a construction error on a malformed tree; no repair is
    /// attempted.
    pub fn build(tree: &'a StatementTree) -> Result<Self> {
        let parts = builder::CfgBuilder::new(tree).build()?;
        let (blocks, node_block) = block::partition(&parts.graph);
        Ok(Cfg {
            tree,
            graph: parts.graph,
            blocks,
            node_block,
            stmt_nodes: parts.stmt_nodes,
        })
    }

    /// The underlying graph
    pub fn graph(&self) -> &DiGraph<CfgNode, Flow> {
        &self.graph
    }

    /// The input statement tree
    pub fn tree(&self) -> &'a StatementTree {
        self.tree
    }

    pub fn node(&self, idx: NodeIndex) -> &CfgNode {
        &self.graph[idx]
    }

    /// Node for a statement, if the statement produced one (composite blocks
    /// and labeled wrappers do not)
    pub fn node_of_stmt(&self, stmt: StmtId) -> Option<NodeIndex> {
        self.stmt_nodes.get(&stmt).copied()
    }

    /// Nodes sorted by id, i.e. in textual order
    pub fn nodes_in_id_order(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by_key(|&n| self.graph[n].id);
        nodes
    }

    /// The first node: no incoming non-loopback flow.
    ///
    /// `None` for an empty method body.
    pub fn first_node(&self) -> Option<NodeIndex> {
        self.nodes_in_id_order()
            .into_iter()
            .find(|&n| self.is_first(n))
    }

    /// Whether the node has no incoming non-loopback flow
    pub fn is_first(&self, node: NodeIndex) -> bool {
        self.non_loopback_in_degree(node) == 0
    }

    /// Whether the node has more than one incoming non-loopback flow
    pub fn is_join(&self, node: NodeIndex) -> bool {
        self.non_loopback_in_degree(node) > 1
    }

    /// Whether the node is a branch: a Branch variant or more than one
    /// outgoing flow
    pub fn is_branch(&self, node: NodeIndex) -> bool {
        self.graph[node].is_branch_kind()
            || self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .count()
                > 1
    }

    fn non_loopback_in_degree(&self, node: NodeIndex) -> usize {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .filter(|e| !e.weight().loopback)
            .count()
    }

    /// All Exit nodes (return/throw statements)
    pub fn exit_nodes(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&n| matches!(self.graph[n].kind, CfgNodeKind::Exit))
            .collect()
    }

    /// The basic blocks, in leader id order
    pub fn basic_blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// The basic block containing a node
    pub fn block_of(&self, node: NodeIndex) -> BlockId {
        self.node_block[&node]
    }

    /// Basic blocks reachable from `start` via successor links (excluding
    /// `start` unless it is reachable from itself)
    pub fn reachable_blocks(&self, start: BlockId) -> Vec<BlockId> {
        block::reachable_from(&self.blocks, start)
    }

    /// CFG nodes in `block` plus every block reachable from it; used as the
    /// region bound for control-dependence nesting.
    pub(crate) fn region_nodes(&self, block: BlockId) -> Vec<NodeIndex> {
        let mut nodes = self.blocks[block.index()].nodes.clone();
        for b in self.reachable_blocks(block) {
            nodes.extend(self.blocks[b.index()].nodes.iter().copied());
        }
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{StatementFacts, TreeBuilder};

    #[test]
    fn empty_method_has_empty_cfg() {
        let mut t = TreeBuilder::new();
        let root = t.block(vec![]);
        let tree = t.finish(root);
        let cfg = Cfg::build(&tree).unwrap();
        assert_eq!(cfg.graph().node_count(), 0);
        assert!(cfg.first_node().is_none());
        assert!(cfg.basic_blocks().is_empty());
    }

    #[test]
    fn straight_line_statements_form_one_block() {
        let mut t = TreeBuilder::new();
        let s1 = t.expr(StatementFacts::new());
        let s2 = t.expr(StatementFacts::new());
        let s3 = t.expr(StatementFacts::new());
        let root = t.block(vec![s1, s2, s3]);
        let tree = t.finish(root);
        let cfg = Cfg::build(&tree).unwrap();
        assert_eq!(cfg.graph().node_count(), 3);
        assert_eq!(cfg.graph().edge_count(), 2);
        assert_eq!(cfg.basic_blocks().len(), 1);
        let first = cfg.first_node().unwrap();
        assert_eq!(cfg.node(first).stmt, s1);
    }
}
