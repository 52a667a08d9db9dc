//! Program Dependence Graph (PDG) module
//!
//! Mirrors the CFG with one node per statement plus a synthetic method-entry
//! node, and derives control, data, anti and output dependence edges. The
//! query surface at the bottom of this file is what downstream slicing and
//! detection logic consumes.

pub mod control;
pub mod data;
pub mod node;

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::alias;
use crate::ast::{StatementTree, StmtId};
use crate::cfg::{BlockId, Cfg, CfgNode};
use crate::error::Result;
use crate::graph::NodeId;
use crate::var::{AbstractVariable, PlainVariable};

pub use node::{DependenceClass, PdgDependence, PdgNode, PdgNodeKind};

/// Program dependence graph of one method body.
///
/// Owns the underlying CFG; both live only for the duration of one analysis
/// and share its id space (CFG node ids from 1, entry node at 0).
pub struct Pdg<'a> {
    pub(crate) cfg: Cfg<'a>,
    pub(crate) graph: DiGraph<PdgNode, PdgDependence>,
    pub(crate) entry: NodeIndex,
    pub(crate) cfg_to_pdg: HashMap<NodeIndex, NodeIndex>,
    pub(crate) parameters: Vec<PlainVariable>,
    accessible_fields: Vec<PlainVariable>,
}

impl<'a> Pdg<'a> {
    /// Build the CFG and PDG for a method body.
    ///
    /// `parameters` is the ordered formal-parameter list;
    /// `accessible_fields` the fields the method may reference. Both come
    /// resolved from the front-end. Fails with a construction error on
    /// malformed input; the error is local to this method's analysis.
    pub fn build(
        tree: &'a StatementTree,
        parameters: Vec<PlainVariable>,
        accessible_fields: Vec<PlainVariable>,
    ) -> Result<Self> {
        let cfg = Cfg::build(tree)?;
        let mut graph = DiGraph::new();
        let entry = graph.add_node(PdgNode::entry(&parameters));

        let mut cfg_to_pdg = HashMap::new();
        for cfg_idx in cfg.nodes_in_id_order() {
            let cfg_node: &CfgNode = cfg.node(cfg_idx);
            let facts = tree.facts(cfg_node.stmt);
            let mut thrown_types = facts.thrown.clone();
            for invocation in &facts.invoked {
                for exception in &invocation.declared_thrown {
                    if !thrown_types.contains(exception) {
                        thrown_types.push(exception.clone());
                    }
                }
            }
            let pdg_idx = graph.add_node(PdgNode {
                id: cfg_node.id,
                kind: PdgNodeKind::Statement {
                    cfg_node: cfg_idx,
                    stmt: cfg_node.stmt,
                },
                declared: facts.declared.clone(),
                defined: facts.defined.clone(),
                used: facts.used.clone(),
                created_types: facts.created.iter().map(|c| c.type_name.clone()).collect(),
                thrown_types,
                control_parent: None,
            });
            cfg_to_pdg.insert(cfg_idx, pdg_idx);
        }

        let mut pdg = Pdg {
            cfg,
            graph,
            entry,
            cfg_to_pdg,
            parameters,
            accessible_fields,
        };
        control::create_control_dependences(&mut pdg)?;
        control::resolve_jumps(&mut pdg)?;
        control::attach_throw_dependences(&mut pdg)?;
        alias::run(&mut pdg);
        data::create_data_dependences(&mut pdg);
        log::debug!(
            "pdg built: {} nodes, {} dependences",
            pdg.graph.node_count(),
            pdg.graph.edge_count()
        );
        Ok(pdg)
    }

    /// The underlying dependence graph
    pub fn graph(&self) -> &DiGraph<PdgNode, PdgDependence> {
        &self.graph
    }

    /// The CFG this PDG mirrors
    pub fn cfg(&self) -> &Cfg<'a> {
        &self.cfg
    }

    /// The method-entry node
    pub fn entry(&self) -> NodeIndex {
        self.entry
    }

    /// The method's ordered formal parameters
    pub fn parameters(&self) -> &[PlainVariable] {
        &self.parameters
    }

    /// Fields the method is permitted to reference
    pub fn accessible_fields(&self) -> &[PlainVariable] {
        &self.accessible_fields
    }

    pub fn node(&self, idx: NodeIndex) -> &PdgNode {
        &self.graph[idx]
    }

    /// All nodes (entry first, then statement nodes in id order)
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &PdgNode)> {
        self.graph.node_indices().map(move |i| (i, &self.graph[i]))
    }

    /// The PDG mirror of a CFG node
    pub fn pdg_node_of_cfg(&self, cfg_idx: NodeIndex) -> Option<NodeIndex> {
        self.cfg_to_pdg.get(&cfg_idx).copied()
    }

    /// The PDG node of a statement, if the statement produced one
    pub fn pdg_node_of_stmt(&self, stmt: StmtId) -> Option<NodeIndex> {
        self.cfg
            .node_of_stmt(stmt)
            .and_then(|c| self.pdg_node_of_cfg(c))
    }

    /// The node with a given analysis-local id
    pub fn node_with_id(&self, id: NodeId) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&i| self.graph[i].id == id)
    }

    /// The basic block holding a PDG node's CFG mirror
    pub fn basic_block_of(&self, idx: NodeIndex) -> Option<BlockId> {
        self.graph[idx].cfg_node().map(|c| self.cfg.block_of(c))
    }

    /// The primary control parent established by the top-down walk.
    ///
    /// Repeatedly following this terminates at the entry node; the entry node
    /// has no parent.
    pub fn control_dependence_parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph[idx].control_parent
    }

    /// Incoming dependences of a node
    pub fn incoming_dependences(
        &self,
        idx: NodeIndex,
    ) -> impl Iterator<Item = (NodeIndex, &PdgDependence)> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
    }

    /// Outgoing dependences of a node
    pub fn outgoing_dependences(
        &self,
        idx: NodeIndex,
    ) -> impl Iterator<Item = (NodeIndex, &PdgDependence)> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
    }

    /// Incoming dependences of one class
    pub fn incoming_of_class(
        &self,
        idx: NodeIndex,
        class: DependenceClass,
    ) -> impl Iterator<Item = (NodeIndex, &PdgDependence)> {
        self.incoming_dependences(idx)
            .filter(move |(_, d)| d.class() == class)
    }

    /// Outgoing dependences of one class
    pub fn outgoing_of_class(
        &self,
        idx: NodeIndex,
        class: DependenceClass,
    ) -> impl Iterator<Item = (NodeIndex, &PdgDependence)> {
        self.outgoing_dependences(idx)
            .filter(move |(_, d)| d.class() == class)
    }

    /// All variables declared anywhere in the method, parameters included
    pub fn declared_variables(&self) -> Vec<PlainVariable> {
        let mut declared = Vec::new();
        for (_, node) in self.nodes() {
            for v in &node.declared {
                if !declared.contains(v) {
                    declared.push(v.clone());
                }
            }
        }
        declared
    }

    /// First node defining `variable`, in textual (id) order
    pub fn first_def_of(&self, variable: &AbstractVariable) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&i| self.graph[i].defines(variable))
            .min_by_key(|&i| self.graph[i].id)
    }

    /// Last node using `variable`, in textual (id) order
    pub fn last_use_of(&self, variable: &AbstractVariable) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&i| self.graph[i].uses(variable))
            .max_by_key(|&i| self.graph[i].id)
    }

    /// Basic blocks reachable from `block`, the slice-extraction boundary
    /// query
    pub fn reachable_blocks(&self, block: BlockId) -> Vec<BlockId> {
        self.cfg.reachable_blocks(block)
    }

    /// PDG nodes of `block` and every block reachable from it, in id order
    pub fn block_based_region(&self, block: BlockId) -> Vec<NodeIndex> {
        let mut region: Vec<NodeIndex> = self
            .cfg
            .region_nodes(block)
            .into_iter()
            .filter_map(|c| self.pdg_node_of_cfg(c))
            .collect();
        region.sort_by_key(|&i| self.graph[i].id);
        region.dedup();
        region
    }

    /// Render the PDG in DOT format (debug aid)
    pub fn to_dot(&self) -> String {
        crate::cfg::visualization::pdg_to_dot(self)
    }
}
