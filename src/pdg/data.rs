//! Data, anti and output dependence computation
//!
//! Loop-aware forward searches over CFG flow edges. Each search owns a
//! visited-edge set, so a loop body is traversed at most once per search;
//! crossing a loop back-edge tags the dependences found beyond it with the
//! owning loop node, and the tag is kept only for targets inside that loop
//! (loop-carried dependences).

use std::collections::HashSet;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::cfg::{BranchKind, CfgNodeKind};
use crate::pdg::{Pdg, PdgDependence};
use crate::var::AbstractVariable;

/// Compute all data/anti/output dependence edges, including the searches
/// seeded by the entry node's formal-parameter definitions.
pub(crate) fn create_data_dependences(pdg: &mut Pdg<'_>) {
    let nodes: Vec<NodeIndex> = pdg.graph.node_indices().collect();
    for n in nodes {
        let Some(start_cfg) = pdg.graph[n].cfg_node() else {
            continue;
        };
        for v in pdg.graph[n].defined.clone() {
            def_search(pdg, n, &v, start_cfg, false);
        }
        for v in pdg.graph[n].used.clone() {
            anti_search(pdg, n, &v, start_cfg);
        }
    }

    if let Some(first_cfg) = pdg.cfg.first_node() {
        let entry = pdg.entry;
        for parameter in pdg.parameters.clone() {
            let v = AbstractVariable::Plain(parameter);
            def_search(pdg, entry, &v, first_cfg, true);
        }
    }
}

/// The loop (or switch) node owning a back-edge: the target for while/for
/// loops, the source for do/while predicates.
fn loop_owner(pdg: &Pdg<'_>, source: NodeIndex, target: NodeIndex) -> NodeIndex {
    if matches!(
        pdg.cfg.node(source).kind,
        CfgNodeKind::Branch(BranchKind::DoLoop)
    ) {
        source
    } else {
        target
    }
}

/// Keep a loop tag only when the dependence target is inside the tagged loop
fn applicable_tag(
    pdg: &Pdg<'_>,
    tag: Option<NodeIndex>,
    target_cfg: NodeIndex,
) -> Option<NodeIndex> {
    tag.filter(|&loop_cfg| {
        target_cfg == loop_cfg
            || pdg
                .cfg
                .tree()
                .contains(pdg.cfg.node(loop_cfg).stmt, pdg.cfg.node(target_cfg).stmt)
    })
}

/// Forward search from a definition of `v` at `src`: reachable uses produce
/// Data edges; the first redefinition on a path produces an Output edge and
/// kills the path.
///
/// With `check_start`, the start node itself is examined first (used for the
/// entry-seeded parameter searches, where the defining node has no CFG
/// counterpart).
fn def_search(
    pdg: &mut Pdg<'_>,
    src: NodeIndex,
    v: &AbstractVariable,
    start_cfg: NodeIndex,
    check_start: bool,
) {
    if check_start {
        let Some(start_pdg) = pdg.pdg_node_of_cfg(start_cfg) else {
            return;
        };
        if pdg.graph[start_pdg].uses(v) {
            pdg.graph.add_edge(
                src,
                start_pdg,
                PdgDependence::Data {
                    variable: v.clone(),
                    loop_node: None,
                },
            );
        }
        if pdg.graph[start_pdg].defines(v) {
            pdg.graph.add_edge(
                src,
                start_pdg,
                PdgDependence::Output {
                    variable: v.clone(),
                    loop_node: None,
                },
            );
            return;
        }
    }

    let mut visited: HashSet<EdgeIndex> = HashSet::new();
    let mut stack: Vec<(NodeIndex, Option<NodeIndex>)> = vec![(start_cfg, None)];
    while let Some((current, tag)) = stack.pop() {
        let edges: Vec<(EdgeIndex, NodeIndex, bool)> = pdg
            .cfg
            .graph()
            .edges(current)
            .map(|e| (e.id(), e.target(), e.weight().loopback))
            .collect();
        for (edge, target_cfg, loopback) in edges {
            if !visited.insert(edge) {
                continue;
            }
            let tag = if loopback {
                Some(loop_owner(pdg, current, target_cfg))
            } else {
                tag
            };
            let Some(target_pdg) = pdg.pdg_node_of_cfg(target_cfg) else {
                continue;
            };
            let edge_tag = applicable_tag(pdg, tag, target_cfg);
            if pdg.graph[target_pdg].uses(v) {
                pdg.graph.add_edge(
                    src,
                    target_pdg,
                    PdgDependence::Data {
                        variable: v.clone(),
                        loop_node: edge_tag,
                    },
                );
            }
            if pdg.graph[target_pdg].defines(v) {
                // A redefinition kills the path; the definition node itself
                // only yields an Output edge when it is a different node.
                if target_pdg != src {
                    pdg.graph.add_edge(
                        src,
                        target_pdg,
                        PdgDependence::Output {
                            variable: v.clone(),
                            loop_node: edge_tag,
                        },
                    );
                }
                continue;
            }
            stack.push((target_cfg, tag));
        }
    }
}

/// Forward search from a use of `v` at `src` to the first redefinition
/// without an intervening use, producing an Anti edge.
fn anti_search(pdg: &mut Pdg<'_>, src: NodeIndex, v: &AbstractVariable, start_cfg: NodeIndex) {
    let mut visited: HashSet<EdgeIndex> = HashSet::new();
    let mut stack: Vec<(NodeIndex, Option<NodeIndex>)> = vec![(start_cfg, None)];
    while let Some((current, tag)) = stack.pop() {
        let edges: Vec<(EdgeIndex, NodeIndex, bool)> = pdg
            .cfg
            .graph()
            .edges(current)
            .map(|e| (e.id(), e.target(), e.weight().loopback))
            .collect();
        for (edge, target_cfg, loopback) in edges {
            if !visited.insert(edge) {
                continue;
            }
            let tag = if loopback {
                Some(loop_owner(pdg, current, target_cfg))
            } else {
                tag
            };
            let Some(target_pdg) = pdg.pdg_node_of_cfg(target_cfg) else {
                continue;
            };
            if pdg.graph[target_pdg].defines(v) {
                let edge_tag = applicable_tag(pdg, tag, target_cfg);
                pdg.graph.add_edge(
                    src,
                    target_pdg,
                    PdgDependence::Anti {
                        variable: v.clone(),
                        loop_node: edge_tag,
                    },
                );
                continue;
            }
            if pdg.graph[target_pdg].uses(v) {
                // An intervening use runs its own anti search; stop here.
                continue;
            }
            stack.push((target_cfg, tag));
        }
    }
}
