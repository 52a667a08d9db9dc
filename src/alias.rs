//! Intraprocedural alias analysis
//!
//! Single-pass, branch-cloning, flow-sensitive tracking of local reference
//! aliasing. Each CFG successor receives an independent copy of the incoming
//! alias set, and every node is processed exactly once: loop back-edges are
//! not iterated to a fixpoint, so aliases established inside a loop body are
//! an under-approximation on the second and later iterations. That is a
//! documented precision limitation, not an error.
//!
//! The computed sets broaden each node's composite-variable def/use facts:
//! for a recorded access `b.f` where `b` is known to alias `a`, the node also
//! records `a.f`.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::pdg::Pdg;
use crate::var::{AbstractVariable, CompositeVariable, PlainVariable};

/// An ordered list of disjoint groups of reference-typed locals, each group
/// denoting "currently known to alias the same object".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachingAliasSet {
    groups: Vec<Vec<PlainVariable>>,
}

impl ReachingAliasSet {
    pub fn new() -> Self {
        ReachingAliasSet::default()
    }

    /// Whether `v` is currently tracked in any alias group
    #[must_use]
    pub fn contains(&self, v: &PlainVariable) -> bool {
        self.groups.iter().any(|g| g.contains(v))
    }

    /// The other members of `v`'s alias group
    #[must_use]
    pub fn aliases_of(&self, v: &PlainVariable) -> Vec<PlainVariable> {
        self.groups
            .iter()
            .find(|g| g.contains(v))
            .map(|g| g.iter().filter(|m| *m != v).cloned().collect())
            .unwrap_or_default()
    }

    /// Record `lhs = rhs`: `lhs` leaves any prior group and joins `rhs`'s
    /// group (a fresh group is started when `rhs` is not tracked yet).
    pub fn insert_alias(&mut self, lhs: PlainVariable, rhs: PlainVariable) {
        self.remove(&lhs);
        match self.groups.iter_mut().find(|g| g.contains(&rhs)) {
            Some(group) => group.push(lhs),
            None => self.groups.push(vec![rhs, lhs]),
        }
    }

    /// Remove `v` from its group; a group left with a single member no
    /// longer expresses aliasing and is discarded.
    pub fn remove(&mut self, v: &PlainVariable) {
        if let Some(idx) = self.groups.iter().position(|g| g.contains(v)) {
            self.groups[idx].retain(|m| m != v);
            if self.groups[idx].len() < 2 {
                self.groups.remove(idx);
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Broaden a node's composite def/use facts, then apply its assignment fact
fn process_node(pdg: &mut Pdg<'_>, pdg_idx: NodeIndex, set: &mut ReachingAliasSet) {
    let node = &pdg.graph[pdg_idx];
    let mut extra_defined: Vec<AbstractVariable> = Vec::new();
    let mut extra_used: Vec<AbstractVariable> = Vec::new();
    for v in &node.defined {
        if let Some(composite) = v.as_composite() {
            for alias in set.aliases_of(&composite.origin) {
                extra_defined.push(
                    CompositeVariable::new(alias, composite.path.clone()).into(),
                );
            }
        }
    }
    for v in &node.used {
        if let Some(composite) = v.as_composite() {
            for alias in set.aliases_of(&composite.origin) {
                extra_used.push(CompositeVariable::new(alias, composite.path.clone()).into());
            }
        }
    }

    let node = &mut pdg.graph[pdg_idx];
    for v in extra_defined {
        if !node.defined.contains(&v) {
            node.defined.push(v);
        }
    }
    for v in extra_used {
        if !node.used.contains(&v) {
            node.used.push(v);
        }
    }

    let stmt = match node.stmt() {
        Some(stmt) => stmt,
        None => return,
    };
    if let Some(assignment) = pdg.cfg.tree().facts(stmt).reference_assignment.clone() {
        match assignment.rhs {
            Some(rhs) => set.insert_alias(assignment.lhs, rhs),
            None => set.remove(&assignment.lhs),
        }
    }
}

/// Run the alias pass over the whole CFG, mutating the PDG nodes' composite
/// def/use facts in place.
pub(crate) fn run(pdg: &mut Pdg<'_>) {
    let Some(first) = pdg.cfg.first_node() else {
        return;
    };
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut stack: Vec<(NodeIndex, ReachingAliasSet)> = vec![(first, ReachingAliasSet::new())];
    while let Some((cfg_idx, mut set)) = stack.pop() {
        if !visited.insert(cfg_idx) {
            continue;
        }
        if let Some(pdg_idx) = pdg.pdg_node_of_cfg(cfg_idx) {
            process_node(pdg, pdg_idx, &mut set);
        }
        let successors: Vec<NodeIndex> = pdg
            .cfg
            .graph()
            .edges(cfg_idx)
            .map(|e| e.target())
            .collect();
        for successor in successors {
            if !visited.contains(&successor) {
                // Each branch gets an independent copy; no merge at joins.
                stack.push((successor, set.clone()));
            }
        }
    }
    log::trace!("alias pass complete: {} nodes visited", visited.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(name: &str) -> PlainVariable {
        PlainVariable::local(name, "java.lang.Object")
    }

    #[test]
    fn insert_alias_starts_and_joins_groups() {
        let mut set = ReachingAliasSet::new();
        set.insert_alias(local("b"), local("a"));
        assert!(set.contains(&local("a")));
        assert_eq!(set.aliases_of(&local("b")), vec![local("a")]);

        set.insert_alias(local("c"), local("b"));
        assert_eq!(set.aliases_of(&local("a")).len(), 2);
    }

    #[test]
    fn reassignment_moves_between_groups() {
        let mut set = ReachingAliasSet::new();
        set.insert_alias(local("b"), local("a"));
        set.insert_alias(local("d"), local("c"));
        set.insert_alias(local("b"), local("c"));
        assert!(!set.aliases_of(&local("a")).contains(&local("b")));
        // {a} alone no longer expresses aliasing
        assert!(!set.contains(&local("a")));
        assert_eq!(set.aliases_of(&local("c")).len(), 2);
    }

    #[test]
    fn untrackable_assignment_removes_lhs() {
        let mut set = ReachingAliasSet::new();
        set.insert_alias(local("b"), local("a"));
        set.insert_alias(local("c"), local("a"));
        set.remove(&local("b"));
        assert!(!set.contains(&local("b")));
        assert!(set.contains(&local("a")));
        set.remove(&local("c"));
        assert!(set.is_empty());
    }
}
