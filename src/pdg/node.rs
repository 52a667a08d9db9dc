//! PDG node and dependence edge types

use petgraph::graph::NodeIndex;

use crate::ast::StmtId;
use crate::graph::NodeId;
use crate::var::{AbstractVariable, PlainVariable};

/// Kind of a PDG node: the synthetic method entry, or the mirror of one CFG
/// node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdgNodeKind {
    Entry,
    Statement {
        /// The mirrored CFG node
        cfg_node: NodeIndex,
        stmt: StmtId,
    },
}

/// A PDG node with its resolved variable facts.
///
/// The entry node's declared/defined sets are the method's formal parameters,
/// established once at construction. Statement nodes start from their
/// statement's facts; the alias pass may broaden the composite entries of the
/// defined/used sets.
#[derive(Debug, Clone)]
pub struct PdgNode {
    pub id: NodeId,
    pub kind: PdgNodeKind,
    pub declared: Vec<PlainVariable>,
    pub defined: Vec<AbstractVariable>,
    pub used: Vec<AbstractVariable>,
    pub created_types: Vec<String>,
    /// Explicit throw types plus declared throws of invoked methods
    pub thrown_types: Vec<String>,
    /// Primary control parent from the top-down control-dependence walk;
    /// `None` only for the entry node
    pub control_parent: Option<NodeIndex>,
}

impl PdgNode {
    pub(crate) fn entry(parameters: &[PlainVariable]) -> Self {
        PdgNode {
            id: NodeId::METHOD_ENTRY,
            kind: PdgNodeKind::Entry,
            declared: parameters.to_vec(),
            defined: parameters
                .iter()
                .cloned()
                .map(AbstractVariable::Plain)
                .collect(),
            used: Vec::new(),
            created_types: Vec::new(),
            thrown_types: Vec::new(),
            control_parent: None,
        }
    }

    #[must_use]
    pub fn declares(&self, v: &PlainVariable) -> bool {
        self.declared.contains(v)
    }

    #[must_use]
    pub fn defines(&self, v: &AbstractVariable) -> bool {
        self.defined.contains(v)
    }

    #[must_use]
    pub fn uses(&self, v: &AbstractVariable) -> bool {
        self.used.contains(v)
    }

    #[must_use]
    pub fn throws(&self) -> bool {
        !self.thrown_types.is_empty()
    }

    #[must_use]
    pub fn stmt(&self) -> Option<StmtId> {
        match self.kind {
            PdgNodeKind::Entry => None,
            PdgNodeKind::Statement { stmt, .. } => Some(stmt),
        }
    }

    #[must_use]
    pub fn cfg_node(&self) -> Option<NodeIndex> {
        match self.kind {
            PdgNodeKind::Entry => None,
            PdgNodeKind::Statement { cfg_node, .. } => Some(cfg_node),
        }
    }
}

impl PartialEq for PdgNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PdgNode {}

/// Coarse dependence class for filtered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependenceClass {
    Control,
    Data,
    Anti,
    Output,
}

/// A dependence edge between PDG nodes.
///
/// Data/Anti/Output carry the dependent variable and an optional loop tag:
/// the CFG loop (or switch) node whose back-edge the dependence search
/// crossed, i.e. the dependence is loop-carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdgDependence {
    Control {
        true_branch: bool,
    },
    Data {
        variable: AbstractVariable,
        loop_node: Option<NodeIndex>,
    },
    Anti {
        variable: AbstractVariable,
        loop_node: Option<NodeIndex>,
    },
    Output {
        variable: AbstractVariable,
        loop_node: Option<NodeIndex>,
    },
}

impl PdgDependence {
    #[must_use]
    pub fn class(&self) -> DependenceClass {
        match self {
            PdgDependence::Control { .. } => DependenceClass::Control,
            PdgDependence::Data { .. } => DependenceClass::Data,
            PdgDependence::Anti { .. } => DependenceClass::Anti,
            PdgDependence::Output { .. } => DependenceClass::Output,
        }
    }

    #[must_use]
    pub fn variable(&self) -> Option<&AbstractVariable> {
        match self {
            PdgDependence::Control { .. } => None,
            PdgDependence::Data { variable, .. }
            | PdgDependence::Anti { variable, .. }
            | PdgDependence::Output { variable, .. } => Some(variable),
        }
    }

    #[must_use]
    pub fn loop_node(&self) -> Option<NodeIndex> {
        match self {
            PdgDependence::Control { .. } => None,
            PdgDependence::Data { loop_node, .. }
            | PdgDependence::Anti { loop_node, .. }
            | PdgDependence::Output { loop_node, .. } => *loop_node,
        }
    }

    #[must_use]
    pub fn is_control_true(&self) -> bool {
        matches!(self, PdgDependence::Control { true_branch: true })
    }

    #[must_use]
    pub fn is_control_false(&self) -> bool {
        matches!(self, PdgDependence::Control { true_branch: false })
    }
}
