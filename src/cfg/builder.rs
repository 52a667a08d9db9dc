//! CFG builder
//!
//! Recursive, statement-kind-dispatched construction of flow nodes and
//! labeled flow edges from an AbstractStatement tree. Straight-line
//! statements chain by unconditional edges; branches fan out with true/false
//! edges; loop back-edges are marked `loopback`; break/continue are routed to
//! their enclosing construct through a context stack.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::ast::{StatementKind, StatementTree, StmtId};
use crate::cfg::node::{BlockKind, BranchKind, CfgNode, CfgNodeKind, Flow};
use crate::error::{Error, Result};
use crate::graph::IdAllocator;

/// An edge waiting for its target node to be created
#[derive(Debug, Clone, Copy)]
struct PendingEdge {
    source: NodeIndex,
    flow: Flow,
}

impl PendingEdge {
    fn unconditional(source: NodeIndex) -> Self {
        PendingEdge {
            source,
            flow: Flow::unconditional(),
        }
    }
}

/// One enclosing loop/switch while its body is being processed
#[derive(Debug)]
struct JumpContext {
    label: Option<String>,
    kind: BranchKind,
    /// Break nodes targeting this construct; connected to the construct's
    /// successor once it completes
    breaks: Vec<NodeIndex>,
    /// Continue nodes targeting this construct (loops only)
    continues: Vec<NodeIndex>,
}

pub(crate) struct CfgBuilder<'a> {
    tree: &'a StatementTree,
    graph: DiGraph<CfgNode, Flow>,
    ids: IdAllocator,
    contexts: Vec<JumpContext>,
    stmt_nodes: HashMap<StmtId, NodeIndex>,
}

pub(crate) struct CfgParts {
    pub graph: DiGraph<CfgNode, Flow>,
    pub stmt_nodes: HashMap<StmtId, NodeIndex>,
}

impl<'a> CfgBuilder<'a> {
    pub(crate) fn new(tree: &'a StatementTree) -> Self {
        CfgBuilder {
            tree,
            graph: DiGraph::new(),
            ids: IdAllocator::new(),
            contexts: Vec::new(),
            stmt_nodes: HashMap::new(),
        }
    }

    /// Build the flow graph from the method's root block.
    ///
    /// An empty method body yields an empty graph.
    pub(crate) fn build(mut self) -> Result<CfgParts> {
        let root = self.tree.root();
        if !matches!(self.tree.kind(root), StatementKind::Block) {
            return Err(Error::malformed("method root must be a composite block"));
        }
        let mut pending = Vec::new();
        for &child in self.tree.children(root) {
            pending = self.process(pending, child, None)?;
        }
        log::debug!(
            "cfg built: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        Ok(CfgParts {
            graph: self.graph,
            stmt_nodes: self.stmt_nodes,
        })
    }

    fn add_node(&mut self, stmt: StmtId, kind: CfgNodeKind, label: Option<String>) -> NodeIndex {
        let id = self.ids.allocate();
        let mut node = CfgNode::new(id, stmt, kind);
        node.label = label;
        let idx = self.graph.add_node(node);
        self.stmt_nodes.insert(stmt, idx);
        idx
    }

    fn connect(&mut self, pending: &[PendingEdge], target: NodeIndex) {
        for p in pending {
            self.graph.add_edge(p.source, target, p.flow);
        }
    }

    /// Connect dangling edges back to a loop predicate, forcing the loopback
    /// flag while keeping each edge's own true/false kind.
    fn connect_loopback(&mut self, pending: &[PendingEdge], target: NodeIndex) {
        for p in pending {
            self.graph.add_edge(p.source, target, p.flow.with_loopback());
        }
    }

    fn process(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        label: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        match self.tree.kind(stmt).clone() {
            StatementKind::Expression => {
                let node = self.add_node(stmt, CfgNodeKind::Statement, label);
                self.connect(&pending, node);
                Ok(vec![PendingEdge::unconditional(node)])
            }
            StatementKind::Return | StatementKind::Throw => {
                let node = self.add_node(stmt, CfgNodeKind::Exit, label);
                self.connect(&pending, node);
                Ok(Vec::new())
            }
            StatementKind::Block => {
                let mut pending = pending;
                for &child in self.tree.children(stmt) {
                    pending = self.process(pending, child, None)?;
                }
                Ok(pending)
            }
            StatementKind::Labeled { label } => {
                let inner = self
                    .tree
                    .children(stmt)
                    .first()
                    .copied()
                    .ok_or(Error::MissingBody {
                        construct: "labeled statement",
                    })?;
                self.process(pending, inner, Some(label))
            }
            StatementKind::Synchronized => self.process_synchronized(pending, stmt, label),
            StatementKind::If => self.process_if(pending, stmt, label),
            StatementKind::Loop => self.process_loop(pending, stmt, label),
            StatementKind::DoLoop => self.process_do_loop(pending, stmt, label),
            StatementKind::Switch => self.process_switch(pending, stmt, label),
            StatementKind::Try { .. } => self.process_try(pending, stmt, label),
            StatementKind::Break { label: target } => self.process_break(pending, stmt, target),
            StatementKind::Continue { label: target } => {
                self.process_continue(pending, stmt, target)
            }
            StatementKind::SwitchCase { .. } => Err(Error::malformed(
                "case label outside of a switch statement",
            )),
        }
    }

    fn process_synchronized(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        label: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        let body = self.tree.body(stmt).ok_or(Error::MissingBody {
            construct: "synchronized statement",
        })?;
        let node = self.add_node(stmt, CfgNodeKind::Block(BlockKind::Synchronized), label);
        self.connect(&pending, node);
        self.process(vec![PendingEdge::unconditional(node)], body, None)
    }

    fn process_if(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        label: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        let then_branch = self.tree.then_branch(stmt).ok_or(Error::MissingBody {
            construct: "if statement",
        })?;
        let node = self.add_node(stmt, CfgNodeKind::Branch(BranchKind::If), label);
        self.connect(&pending, node);

        let mut tails = self.process(
            vec![PendingEdge {
                source: node,
                flow: Flow::true_flow(),
            }],
            then_branch,
            None,
        )?;
        match self.tree.else_branch(stmt) {
            Some(else_branch) => {
                let else_tails = self.process(
                    vec![PendingEdge {
                        source: node,
                        flow: Flow::false_flow(),
                    }],
                    else_branch,
                    None,
                )?;
                tails.extend(else_tails);
            }
            None => tails.push(PendingEdge {
                source: node,
                flow: Flow::false_flow(),
            }),
        }
        Ok(tails)
    }

    fn process_loop(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        label: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        let body = self.tree.body(stmt).ok_or(Error::MissingBody {
            construct: "loop statement",
        })?;
        let node = self.add_node(stmt, CfgNodeKind::Branch(BranchKind::Loop), label.clone());
        self.connect(&pending, node);

        self.contexts.push(JumpContext {
            label,
            kind: BranchKind::Loop,
            breaks: Vec::new(),
            continues: Vec::new(),
        });
        let body_tails = self.process(
            vec![PendingEdge {
                source: node,
                flow: Flow::true_flow(),
            }],
            body,
            None,
        )?;
        let context = self.contexts.pop().ok_or_else(|| {
            Error::internal("loop context stack underflow")
        })?;

        self.connect_loopback(&body_tails, node);
        for cont in &context.continues {
            self.graph
                .add_edge(*cont, node, Flow::unconditional().with_loopback());
        }

        let mut tails = vec![PendingEdge {
            source: node,
            flow: Flow::false_flow(),
        }];
        tails.extend(context.breaks.iter().map(|&b| PendingEdge::unconditional(b)));
        Ok(tails)
    }

    fn process_do_loop(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        label: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        let body = self.tree.body(stmt).ok_or(Error::MissingBody {
            construct: "do/while statement",
        })?;

        // The body executes once unconditionally and textually precedes the
        // predicate, so its nodes are created first.
        self.contexts.push(JumpContext {
            label: label.clone(),
            kind: BranchKind::DoLoop,
            breaks: Vec::new(),
            continues: Vec::new(),
        });
        let body_start = self.graph.node_count();
        let body_tails = self.process(pending, body, None)?;
        let context = self.contexts.pop().ok_or_else(|| {
            Error::internal("do/while context stack underflow")
        })?;

        let node = self.add_node(stmt, CfgNodeKind::Branch(BranchKind::DoLoop), label);
        self.connect(&body_tails, node);
        // Continue inside a do/while falls forward into the predicate.
        for cont in &context.continues {
            self.graph.add_edge(*cont, node, Flow::unconditional());
        }
        let body_head = if self.graph.node_count() > body_start + 1 {
            NodeIndex::new(body_start)
        } else {
            node
        };
        self.graph
            .add_edge(node, body_head, Flow::true_flow().with_loopback());

        let mut tails = vec![PendingEdge {
            source: node,
            flow: Flow::false_flow(),
        }];
        tails.extend(context.breaks.iter().map(|&b| PendingEdge::unconditional(b)));
        Ok(tails)
    }

    fn process_switch(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        label: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        let node = self.add_node(stmt, CfgNodeKind::Branch(BranchKind::Switch), label.clone());
        self.connect(&pending, node);

        let children: Vec<StmtId> = self.tree.children(stmt).to_vec();
        match children.first() {
            Some(&first) if matches!(self.tree.kind(first), StatementKind::SwitchCase { .. }) => {}
            Some(_) => {
                return Err(Error::malformed("switch body must start with a case label"))
            }
            None => {
                return Ok(vec![PendingEdge {
                    source: node,
                    flow: Flow::false_flow(),
                }])
            }
        }

        self.contexts.push(JumpContext {
            label,
            kind: BranchKind::Switch,
            breaks: Vec::new(),
            continues: Vec::new(),
        });

        let mut current = Vec::new();
        let mut has_default = false;
        for child in children {
            match self.tree.kind(child).clone() {
                StatementKind::SwitchCase { is_default } => {
                    let case = self.add_node(child, CfgNodeKind::SwitchCase, None);
                    // Case-labeled dispatch edge from the switch, plus any
                    // fallthrough from the previous case group.
                    self.graph.add_edge(node, case, Flow::unconditional());
                    self.connect(&current, case);
                    current = vec![PendingEdge::unconditional(case)];
                    has_default |= is_default;
                }
                _ => {
                    current = self.process(current, child, None)?;
                }
            }
        }

        let context = self.contexts.pop().ok_or_else(|| {
            Error::internal("switch context stack underflow")
        })?;

        let mut tails = current;
        if !has_default {
            tails.push(PendingEdge {
                source: node,
                flow: Flow::false_flow(),
            });
        }
        tails.extend(context.breaks.iter().map(|&b| PendingEdge::unconditional(b)));
        Ok(tails)
    }

    fn process_try(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        label: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        let handled_types = match self.tree.kind(stmt) {
            StatementKind::Try { catch_types, .. } => catch_types.clone(),
            _ => unreachable!("process_try dispatched on a non-try statement"),
        };
        let body = self.tree.try_body(stmt).ok_or(Error::MissingBody {
            construct: "try statement",
        })?;
        let node = self.add_node(stmt, CfgNodeKind::Block(BlockKind::Try { handled_types }), label);
        self.connect(&pending, node);

        let mut tails = self.process(vec![PendingEdge::unconditional(node)], body, None)?;
        // Catch clauses are alternative paths out of the try block node.
        for catch_body in self.tree.catch_bodies(stmt).to_vec() {
            let catch_tails =
                self.process(vec![PendingEdge::unconditional(node)], catch_body, None)?;
            tails.extend(catch_tails);
        }
        match self.tree.finalizer(stmt) {
            Some(finalizer) => self.process(tails, finalizer, None),
            None => Ok(tails),
        }
    }

    fn process_break(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        target: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        let node = self.add_node(stmt, CfgNodeKind::Break, None);
        self.connect(&pending, node);
        let node_id = self.graph[node].id.0;
        let context = match &target {
            Some(label) => self
                .contexts
                .iter_mut()
                .rev()
                .find(|c| c.label.as_deref() == Some(label))
                .ok_or_else(|| Error::UnresolvedLabel {
                    label: label.clone(),
                    jump: "break",
                })?,
            None => self
                .contexts
                .last_mut()
                .ok_or(Error::UnresolvableJump {
                    jump: "break",
                    node_id,
                })?,
        };
        context.breaks.push(node);
        Ok(Vec::new())
    }

    fn process_continue(
        &mut self,
        pending: Vec<PendingEdge>,
        stmt: StmtId,
        target: Option<String>,
    ) -> Result<Vec<PendingEdge>> {
        let node = self.add_node(stmt, CfgNodeKind::Continue, None);
        self.connect(&pending, node);
        let node_id = self.graph[node].id.0;
        let context = match &target {
            Some(label) => self
                .contexts
                .iter_mut()
                .rev()
                .find(|c| {
                    c.label.as_deref() == Some(label)
                        && matches!(c.kind, BranchKind::Loop | BranchKind::DoLoop)
                })
                .ok_or_else(|| Error::UnresolvedLabel {
                    label: label.clone(),
                    jump: "continue",
                })?,
            None => self
                .contexts
                .iter_mut()
                .rev()
                .find(|c| matches!(c.kind, BranchKind::Loop | BranchKind::DoLoop))
                .ok_or(Error::UnresolvableJump {
                    jump: "continue",
                    node_id,
                })?,
        };
        context.continues.push(node);
        Ok(Vec::new())
    }
}
