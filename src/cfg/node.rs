//! CFG node and flow edge types

use crate::ast::StmtId;
use crate::graph::NodeId;

/// Kind of block-aggregate CFG node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// `try` block; carries the exception types each catch clause handles,
    /// in clause order
    Try { handled_types: Vec<Vec<String>> },
    Synchronized,
}

/// Kind of branch CFG node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    If,
    /// `while` / `for`
    Loop,
    DoLoop,
    Switch,
}

/// CFG node kind, one variant per construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfgNodeKind {
    Statement,
    Block(BlockKind),
    Branch(BranchKind),
    /// `return` or `throw`
    Exit,
    Break,
    Continue,
    SwitchCase,
}

/// A CFG node: one per constituent statement of the method
#[derive(Debug, Clone)]
pub struct CfgNode {
    pub id: NodeId,
    /// Source statement in the input tree
    pub stmt: StmtId,
    pub kind: CfgNodeKind,
    /// Textual label, when the construct sits under a labeled statement
    pub label: Option<String>,
}

impl CfgNode {
    pub fn new(id: NodeId, stmt: StmtId, kind: CfgNodeKind) -> Self {
        CfgNode {
            id,
            stmt,
            kind,
            label: None,
        }
    }

    /// Whether this node is a Branch variant
    #[must_use]
    pub fn is_branch_kind(&self) -> bool {
        matches!(self.kind, CfgNodeKind::Branch(_))
    }

    #[must_use]
    pub fn is_loop(&self) -> bool {
        matches!(
            self.kind,
            CfgNodeKind::Branch(BranchKind::Loop | BranchKind::DoLoop)
        )
    }

    #[must_use]
    pub fn is_try_block(&self) -> bool {
        matches!(self.kind, CfgNodeKind::Block(BlockKind::Try { .. }))
    }
}

impl PartialEq for CfgNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CfgNode {}

/// Kind of a flow edge; unconditional edges have neither true/false set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Unconditional,
    TrueFlow,
    FalseFlow,
}

/// A directed flow edge between CFG nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    pub kind: FlowKind,
    /// Back-edge of a loop
    pub loopback: bool,
}

impl Flow {
    pub const fn unconditional() -> Self {
        Flow {
            kind: FlowKind::Unconditional,
            loopback: false,
        }
    }

    pub const fn true_flow() -> Self {
        Flow {
            kind: FlowKind::TrueFlow,
            loopback: false,
        }
    }

    pub const fn false_flow() -> Self {
        Flow {
            kind: FlowKind::FalseFlow,
            loopback: false,
        }
    }

    pub const fn with_loopback(mut self) -> Self {
        self.loopback = true;
        self
    }
}
