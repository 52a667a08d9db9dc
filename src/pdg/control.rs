//! Control dependence construction
//!
//! Top-down walk from the method-entry node using the approximate
//! nesting-based region bound (a branch governs the statements that are both
//! AST-nested under it and physically inside its basic block or a block
//! reachable from it). Also handles switch/case grouping, break/continue
//! resolution, and try/throw abrupt-completion edges.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::ast::{StatementKind, StmtId};
use crate::cfg::{BlockKind, BranchKind, CfgNodeKind};
use crate::error::{Error, Result};
use crate::graph::NodeId;
use crate::pdg::{Pdg, PdgDependence};

/// One entry of a flattened statement list: either a statement that owns a
/// CFG node, or a try/synchronized wrapper with its own flattened contents.
enum FlatItem {
    Node(StmtId),
    Wrapper { stmt: StmtId, nested: Vec<FlatItem> },
}

/// Flatten a statement list through composite blocks and labeled wrappers.
///
/// Try and synchronized statements stay as wrappers so they can be
/// control-attached as a unit; their constituent statements are flattened
/// inside them.
fn flatten(pdg: &Pdg<'_>, stmts: &[StmtId], out: &mut Vec<FlatItem>) {
    let tree = pdg.cfg.tree();
    for &stmt in stmts {
        match tree.kind(stmt) {
            StatementKind::Block => flatten(pdg, tree.children(stmt), out),
            StatementKind::Labeled { .. } => flatten(pdg, tree.children(stmt), out),
            StatementKind::Try { .. } => {
                let mut nested = Vec::new();
                if let Some(body) = tree.try_body(stmt) {
                    flatten(pdg, &[body], &mut nested);
                }
                for &catch_body in tree.catch_bodies(stmt) {
                    flatten(pdg, &[catch_body], &mut nested);
                }
                if let Some(finalizer) = tree.finalizer(stmt) {
                    flatten(pdg, &[finalizer], &mut nested);
                }
                out.push(FlatItem::Wrapper { stmt, nested });
            }
            StatementKind::Synchronized => {
                let mut nested = Vec::new();
                if let Some(body) = tree.body(stmt) {
                    flatten(pdg, &[body], &mut nested);
                }
                out.push(FlatItem::Wrapper { stmt, nested });
            }
            _ => out.push(FlatItem::Node(stmt)),
        }
    }
}

fn flatten_stmt(pdg: &Pdg<'_>, stmt: StmtId) -> Vec<FlatItem> {
    let mut items = Vec::new();
    flatten(pdg, &[stmt], &mut items);
    items
}

fn add_control_edge(pdg: &mut Pdg<'_>, parent: NodeIndex, child: NodeIndex, true_branch: bool) {
    pdg.graph
        .add_edge(parent, child, PdgDependence::Control { true_branch });
    if pdg.graph[child].control_parent.is_none() && child != parent {
        pdg.graph[child].control_parent = Some(parent);
    }
}

/// CFG nodes inside a branch's own basic block or any block reachable from it
fn region_of(pdg: &Pdg<'_>, branch_cfg: NodeIndex) -> HashSet<NodeIndex> {
    pdg.cfg
        .region_nodes(pdg.cfg.block_of(branch_cfg))
        .into_iter()
        .collect()
}

/// Compute all control dependence edges from the entry node down
pub(crate) fn create_control_dependences(pdg: &mut Pdg<'_>) -> Result<()> {
    let root = pdg.cfg.tree().root();
    let mut items = Vec::new();
    flatten(pdg, &pdg.cfg.tree().children(root).to_vec(), &mut items);
    let entry = pdg.entry;
    attach(pdg, entry, entry, true, &items, None)
}

/// Attach `items` beneath `parent` with the given branch flag.
///
/// `wrapper_parent` receives try/synchronized wrapper nodes (the nearest
/// enclosing statement with a PDG node); `region`, when present, bounds the
/// attachment to nodes physically under the governing branch.
fn attach(
    pdg: &mut Pdg<'_>,
    parent: NodeIndex,
    wrapper_parent: NodeIndex,
    true_branch: bool,
    items: &[FlatItem],
    region: Option<&HashSet<NodeIndex>>,
) -> Result<()> {
    for item in items {
        match item {
            FlatItem::Wrapper { stmt, nested } => {
                let Some(cfg_idx) = pdg.cfg.node_of_stmt(*stmt) else {
                    return Err(Error::internal("wrapper statement without a CFG node"));
                };
                if region.is_some_and(|r| !r.contains(&cfg_idx)) {
                    continue;
                }
                let wrapper_pdg = pdg
                    .pdg_node_of_cfg(cfg_idx)
                    .ok_or_else(|| Error::internal("CFG node without a PDG mirror"))?;
                add_control_edge(pdg, wrapper_parent, wrapper_pdg, true_branch);
                attach(pdg, parent, wrapper_pdg, true_branch, nested, region)?;
            }
            FlatItem::Node(stmt) => {
                let Some(cfg_idx) = pdg.cfg.node_of_stmt(*stmt) else {
                    return Err(Error::internal("statement without a CFG node"));
                };
                if region.is_some_and(|r| !r.contains(&cfg_idx)) {
                    continue;
                }
                let node_pdg = pdg
                    .pdg_node_of_cfg(cfg_idx)
                    .ok_or_else(|| Error::internal("CFG node without a PDG mirror"))?;
                add_control_edge(pdg, parent, node_pdg, true_branch);
                attach_nested(pdg, cfg_idx, node_pdg)?;
            }
        }
    }
    Ok(())
}

/// Recurse into a branch node so nested branches attach their own nested
/// statements beneath themselves.
fn attach_nested(pdg: &mut Pdg<'_>, cfg_idx: NodeIndex, node_pdg: NodeIndex) -> Result<()> {
    let stmt = pdg.cfg.node(cfg_idx).stmt;
    let tree = pdg.cfg.tree();
    match pdg.cfg.node(cfg_idx).kind.clone() {
        CfgNodeKind::Branch(BranchKind::If) => {
            let region = region_of(pdg, cfg_idx);
            if let Some(then_branch) = tree.then_branch(stmt) {
                let items = flatten_stmt(pdg, then_branch);
                attach(pdg, node_pdg, node_pdg, true, &items, Some(&region))?;
            }
            if let Some(else_branch) = pdg.cfg.tree().else_branch(stmt) {
                let items = flatten_stmt(pdg, else_branch);
                attach(pdg, node_pdg, node_pdg, false, &items, Some(&region))?;
            }
            Ok(())
        }
        CfgNodeKind::Branch(BranchKind::Loop | BranchKind::DoLoop) => {
            let region = region_of(pdg, cfg_idx);
            if let Some(body) = tree.body(stmt) {
                let items = flatten_stmt(pdg, body);
                attach(pdg, node_pdg, node_pdg, true, &items, Some(&region))?;
            }
            Ok(())
        }
        CfgNodeKind::Branch(BranchKind::Switch) => {
            let region = region_of(pdg, cfg_idx);
            let mut items = Vec::new();
            flatten(pdg, &tree.children(stmt).to_vec(), &mut items);
            let mut buffer = Vec::new();
            switch_scan(pdg, node_pdg, &items, &mut buffer, &region)
        }
        _ => Ok(()),
    }
}

/// Scan a switch body in textual order, buffering case labels to model
/// fallthrough-without-break as continued true dependence.
fn switch_scan(
    pdg: &mut Pdg<'_>,
    switch_pdg: NodeIndex,
    items: &[FlatItem],
    buffer: &mut Vec<NodeIndex>,
    region: &HashSet<NodeIndex>,
) -> Result<()> {
    for item in items {
        match item {
            FlatItem::Wrapper { stmt, nested } => {
                let Some(cfg_idx) = pdg.cfg.node_of_stmt(*stmt) else {
                    return Err(Error::internal("wrapper statement without a CFG node"));
                };
                if !region.contains(&cfg_idx) {
                    continue;
                }
                let wrapper_pdg = pdg
                    .pdg_node_of_cfg(cfg_idx)
                    .ok_or_else(|| Error::internal("CFG node without a PDG mirror"))?;
                add_control_edge(pdg, switch_pdg, wrapper_pdg, true);
                switch_scan(pdg, switch_pdg, nested, buffer, region)?;
            }
            FlatItem::Node(stmt) => {
                let Some(cfg_idx) = pdg.cfg.node_of_stmt(*stmt) else {
                    return Err(Error::internal("statement without a CFG node"));
                };
                if !region.contains(&cfg_idx) {
                    continue;
                }
                let node_pdg = pdg
                    .pdg_node_of_cfg(cfg_idx)
                    .ok_or_else(|| Error::internal("CFG node without a PDG mirror"))?;
                match pdg.cfg.node(cfg_idx).kind {
                    CfgNodeKind::SwitchCase => {
                        add_control_edge(pdg, switch_pdg, node_pdg, true);
                        buffer.push(node_pdg);
                    }
                    CfgNodeKind::Break => {
                        add_control_edge(pdg, switch_pdg, node_pdg, true);
                        for &case in buffer.iter() {
                            pdg.graph.add_edge(
                                node_pdg,
                                case,
                                PdgDependence::Control { true_branch: false },
                            );
                        }
                        buffer.clear();
                    }
                    _ => {
                        add_control_edge(pdg, switch_pdg, node_pdg, true);
                        for &case in buffer.iter() {
                            pdg.graph.add_edge(
                                case,
                                node_pdg,
                                PdgDependence::Control { true_branch: true },
                            );
                        }
                        attach_nested(pdg, cfg_idx, node_pdg)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Resolve break/continue nodes to their enclosing loop or switch.
///
/// Walks the primary control-parent chain, matching by label when the jump is
/// labeled. Adds a false control edge from the jump to the resolved construct
/// plus false edges duplicating the construct's other true dependents that
/// occur later in node order (control flow the jump skips).
pub(crate) fn resolve_jumps(pdg: &mut Pdg<'_>) -> Result<()> {
    let jumps: Vec<NodeIndex> = pdg
        .graph
        .node_indices()
        .filter(|&i| {
            pdg.graph[i]
                .cfg_node()
                .map(|c| {
                    matches!(
                        pdg.cfg.node(c).kind,
                        CfgNodeKind::Break | CfgNodeKind::Continue
                    )
                })
                .unwrap_or(false)
        })
        .collect();

    for jump in jumps {
        let Some(jump_cfg) = pdg.graph[jump].cfg_node() else {
            continue;
        };
        let is_break = matches!(pdg.cfg.node(jump_cfg).kind, CfgNodeKind::Break);
        let jump_name = if is_break { "break" } else { "continue" };
        let label = match pdg.cfg.tree().kind(pdg.cfg.node(jump_cfg).stmt) {
            StatementKind::Break { label } | StatementKind::Continue { label } => label.clone(),
            _ => None,
        };

        let mut target = None;
        let mut current = pdg.graph[jump].control_parent;
        while let Some(parent) = current {
            if let Some(parent_cfg) = pdg.graph[parent].cfg_node() {
                let parent_node = pdg.cfg.node(parent_cfg);
                let structural_match = match parent_node.kind {
                    CfgNodeKind::Branch(BranchKind::Loop | BranchKind::DoLoop) => true,
                    CfgNodeKind::Branch(BranchKind::Switch) => is_break,
                    _ => false,
                };
                let label_match = match &label {
                    Some(l) => parent_node.label.as_deref() == Some(l.as_str()),
                    None => true,
                };
                if structural_match && label_match {
                    target = Some(parent);
                    break;
                }
            }
            current = pdg.graph[parent].control_parent;
        }

        let Some(target) = target else {
            return match label {
                Some(label) => Err(Error::UnresolvedLabel {
                    label,
                    jump: jump_name,
                }),
                None => Err(Error::UnresolvableJump {
                    jump: jump_name,
                    node_id: pdg.graph[jump].id.0,
                }),
            };
        };

        pdg.graph
            .add_edge(jump, target, PdgDependence::Control { true_branch: false });
        let jump_id = pdg.graph[jump].id;
        let skipped: Vec<NodeIndex> = pdg
            .outgoing_dependences(target)
            .filter(|(t, d)| d.is_control_true() && *t != jump && pdg.graph[*t].id > jump_id)
            .map(|(t, _)| t)
            .collect();
        for t in skipped {
            pdg.graph
                .add_edge(jump, t, PdgDependence::Control { true_branch: false });
        }
    }
    Ok(())
}

/// Whether `thrown` contains a type some catch clause of `handled` handles.
///
/// Matching is exact qualified-name equality; subtype matching would need
/// resolver support the input contract excludes.
fn catches(handled: &[Vec<String>], thrown: &[String]) -> bool {
    handled
        .iter()
        .any(|clause| clause.iter().any(|t| thrown.contains(t)))
}

/// Attach throwing nodes beneath their matching try block and add false
/// edges modeling the rest of the block being skipped on abrupt completion.
pub(crate) fn attach_throw_dependences(pdg: &mut Pdg<'_>) -> Result<()> {
    let throwers: Vec<NodeIndex> = pdg
        .graph
        .node_indices()
        .filter(|&i| pdg.graph[i].throws() && pdg.graph[i].cfg_node().is_some())
        .collect();

    for thrower in throwers {
        let Some(thrower_cfg) = pdg.graph[thrower].cfg_node() else {
            continue;
        };
        let thrower_stmt = pdg.cfg.node(thrower_cfg).stmt;
        let thrown = pdg.graph[thrower].thrown_types.clone();

        // Innermost enclosing try whose catch clauses handle one of the
        // thrown types.
        let mut best: Option<(NodeIndex, StmtId)> = None;
        for cfg_idx in pdg.cfg.graph().node_indices() {
            let CfgNodeKind::Block(BlockKind::Try { ref handled_types }) =
                pdg.cfg.node(cfg_idx).kind
            else {
                continue;
            };
            if !catches(handled_types, &thrown) {
                continue;
            }
            let try_stmt = pdg.cfg.node(cfg_idx).stmt;
            let Some(body) = pdg.cfg.tree().try_body(try_stmt) else {
                continue;
            };
            let in_body = pdg.cfg.tree().contains(body, thrower_stmt)
                || control_depends_on(pdg, thrower, cfg_idx);
            if !in_body {
                continue;
            }
            let replace = match best {
                None => true,
                Some((best_cfg, _)) => pdg.cfg.node(cfg_idx).id > pdg.cfg.node(best_cfg).id,
            };
            if replace {
                best = Some((cfg_idx, body));
            }
        }

        let Some((try_cfg, try_body)) = best else {
            continue;
        };
        let try_pdg = pdg
            .pdg_node_of_cfg(try_cfg)
            .ok_or_else(|| Error::internal("try node without a PDG mirror"))?;
        pdg.graph
            .add_edge(try_pdg, thrower, PdgDependence::Control { true_branch: true });

        // Abrupt completion skips the remaining statements of the block.
        let thrower_id = pdg.graph[thrower].id;
        let items = flatten_stmt(pdg, try_body);
        let mut skipped = Vec::new();
        collect_later_siblings(pdg, &items, thrower_id, &mut skipped);
        for sibling in skipped {
            if sibling != thrower {
                pdg.graph.add_edge(
                    thrower,
                    sibling,
                    PdgDependence::Control { true_branch: false },
                );
            }
        }
    }
    Ok(())
}

fn collect_later_siblings(
    pdg: &Pdg<'_>,
    items: &[FlatItem],
    after: NodeId,
    out: &mut Vec<NodeIndex>,
) {
    for item in items {
        let stmt = match item {
            FlatItem::Node(stmt) | FlatItem::Wrapper { stmt, .. } => *stmt,
        };
        if let Some(node_pdg) = pdg.pdg_node_of_stmt(stmt) {
            if pdg.graph[node_pdg].id > after {
                out.push(node_pdg);
            }
        }
    }
}

/// Whether `node` transitively control-depends on the try block at `try_cfg`
fn control_depends_on(pdg: &Pdg<'_>, node: NodeIndex, try_cfg: NodeIndex) -> bool {
    let mut current = pdg.graph[node].control_parent;
    while let Some(parent) = current {
        if pdg.graph[parent].cfg_node() == Some(try_cfg) {
            return true;
        }
        current = pdg.graph[parent].control_parent;
    }
    false
}
