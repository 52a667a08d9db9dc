//! DOT export for debugging
//!
//! Renders a CFG or PDG in Graphviz DOT format. Debug aid only; the graphs
//! themselves are never persisted.

use petgraph::visit::EdgeRef;

use crate::cfg::node::{BlockKind, BranchKind, CfgNodeKind, FlowKind};
use crate::cfg::Cfg;
use crate::pdg::{Pdg, PdgDependence, PdgNodeKind};

fn cfg_node_label(kind: &CfgNodeKind) -> &'static str {
    match kind {
        CfgNodeKind::Statement => "stmt",
        CfgNodeKind::Block(BlockKind::Try { .. }) => "try",
        CfgNodeKind::Block(BlockKind::Synchronized) => "synchronized",
        CfgNodeKind::Branch(BranchKind::If) => "if",
        CfgNodeKind::Branch(BranchKind::Loop) => "loop",
        CfgNodeKind::Branch(BranchKind::DoLoop) => "do",
        CfgNodeKind::Branch(BranchKind::Switch) => "switch",
        CfgNodeKind::Exit => "exit",
        CfgNodeKind::Break => "break",
        CfgNodeKind::Continue => "continue",
        CfgNodeKind::SwitchCase => "case",
    }
}

/// Render a CFG in DOT format
pub fn cfg_to_dot(cfg: &Cfg<'_>) -> String {
    let mut dot = String::from("digraph cfg {\n");
    for idx in cfg.graph().node_indices() {
        let node = cfg.node(idx);
        dot.push_str(&format!(
            "  n{} [label=\"{} {}\"];\n",
            node.id,
            node.id,
            cfg_node_label(&node.kind)
        ));
    }
    for edge in cfg.graph().edge_references() {
        let flow = edge.weight();
        let mut attrs = Vec::new();
        match flow.kind {
            FlowKind::TrueFlow => attrs.push("label=\"T\"".to_string()),
            FlowKind::FalseFlow => attrs.push("label=\"F\"".to_string()),
            FlowKind::Unconditional => {}
        }
        if flow.loopback {
            attrs.push("style=dashed".to_string());
        }
        dot.push_str(&format!(
            "  n{} -> n{} [{}];\n",
            cfg.node(edge.source()).id,
            cfg.node(edge.target()).id,
            attrs.join(",")
        ));
    }
    dot.push_str("}\n");
    dot
}

/// Render a PDG in DOT format
pub fn pdg_to_dot(pdg: &Pdg<'_>) -> String {
    let mut dot = String::from("digraph pdg {\n");
    for (_, node) in pdg.nodes() {
        let label = match node.kind {
            PdgNodeKind::Entry => "entry".to_string(),
            PdgNodeKind::Statement { .. } => format!("{}", node.id),
        };
        dot.push_str(&format!("  n{} [label=\"{}\"];\n", node.id, label));
    }
    for edge in pdg.graph().edge_references() {
        let label = match edge.weight() {
            PdgDependence::Control { true_branch: true } => "C:T".to_string(),
            PdgDependence::Control { true_branch: false } => "C:F".to_string(),
            PdgDependence::Data { variable, .. } => format!("D {variable}"),
            PdgDependence::Anti { variable, .. } => format!("A {variable}"),
            PdgDependence::Output { variable, .. } => format!("O {variable}"),
        };
        dot.push_str(&format!(
            "  n{} -> n{} [label=\"{}\"];\n",
            pdg.node(edge.source()).id,
            pdg.node(edge.target()).id,
            label
        ));
    }
    dot.push_str("}\n");
    dot
}
