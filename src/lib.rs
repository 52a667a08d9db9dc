//! pdg-rs: intraprocedural CFG/PDG construction and dependence analysis
//!
//! Analyzes a single method body (supplied as a resolved AbstractStatement
//! tree) and builds two layered graphs: a Control Flow Graph and a Program
//! Dependence Graph, plus a lightweight single-pass alias analysis used to
//! broaden field-access facts. The resulting query surface feeds downstream
//! slice extraction and code-smell detection.
//!
//! The front-end that parses source and resolves names is an external
//! collaborator; this crate trusts its input and performs no I/O.

pub mod alias;
pub mod ast;
pub mod batch;
pub mod cfg;
pub mod error;
pub mod graph;
pub mod pdg;
pub mod var;

pub use batch::{analyze_methods, MethodInput};
pub use error::{Error, Result};

// Re-export commonly used types
pub use ast::{
    MethodInvocation, ObjectCreation, ReferenceAssignment, StatementFacts, StatementKind,
    StatementTree, StmtId, TreeBuilder,
};
pub use cfg::{BasicBlock, BlockId, Cfg, CfgNode, CfgNodeKind, Flow, FlowKind};
pub use graph::NodeId;
pub use pdg::{DependenceClass, Pdg, PdgDependence, PdgNode};
pub use var::{AbstractVariable, CompositeVariable, PlainVariable};
