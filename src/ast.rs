//! AbstractStatement input tree
//!
//! The handoff format supplied by the front-end: a rooted tree of statement
//! nodes annotated with resolved semantic facts (declared/defined/used
//! variables, invoked methods, object creations, thrown exception types). The
//! tree is stored in an arena indexed by [`StmtId`] and is read-only once
//! built; this crate never re-resolves names.

use crate::var::{AbstractVariable, PlainVariable};

/// Index of a statement in its [`StatementTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(pub u32);

impl StmtId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// An invoked method, carrying its declared thrown exception types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInvocation {
    /// Stable method key assigned by the front-end resolver
    pub name: String,
    /// Fully qualified checked exception types from the `throws` clause
    pub declared_thrown: Vec<String>,
}

impl MethodInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        MethodInvocation {
            name: name.into(),
            declared_thrown: Vec::new(),
        }
    }

    pub fn throws(mut self, exception_type: impl Into<String>) -> Self {
        self.declared_thrown.push(exception_type.into());
        self
    }
}

/// An object creation (`new T(..)`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCreation {
    pub type_name: String,
}

/// Resolved fact for a simple statement that declares or assigns a
/// reference-typed local, consumed by the alias analyzer.
///
/// `rhs` is the initializer/right-hand side when it is itself an
/// alias-trackable reference local; `None` means the right-hand side is not
/// trackable (a `new` expression, a call, `null`, a field, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAssignment {
    pub lhs: PlainVariable,
    pub rhs: Option<PlainVariable>,
    pub is_declaration: bool,
}

/// Statement kind, with kind-specific payloads resolved by the front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// Expression or local-declaration statement
    Expression,
    /// `{ ... }` composite; children are the contained statements
    Block,
    /// `if`; children are `[then]` or `[then, else]`
    If,
    /// `while`/`for`; children are `[body]`
    Loop,
    /// `do/while`; children are `[body]`
    DoLoop,
    /// `switch`; children are case labels and statements in textual order
    Switch,
    /// `case`/`default` label inside a switch
    SwitchCase { is_default: bool },
    /// `try`; children are `[body, catch bodies.., finalizer?]`
    Try {
        /// Exception types handled by each catch clause, in clause order
        catch_types: Vec<Vec<String>>,
        has_finalizer: bool,
    },
    /// Labeled statement; children are `[wrapped statement]`
    Labeled { label: String },
    /// `synchronized`; children are `[body]`
    Synchronized,
    Break { label: Option<String> },
    Continue { label: Option<String> },
    Return,
    Throw,
}

/// Precomputed semantic facts attached to one statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementFacts {
    pub declared: Vec<PlainVariable>,
    pub defined: Vec<AbstractVariable>,
    pub used: Vec<AbstractVariable>,
    pub invoked: Vec<MethodInvocation>,
    pub created: Vec<ObjectCreation>,
    /// Explicitly thrown exception types (`throw new T(..)`)
    pub thrown: Vec<String>,
    pub reference_assignment: Option<ReferenceAssignment>,
}

impl StatementFacts {
    pub fn new() -> Self {
        StatementFacts::default()
    }

    pub fn declares(mut self, v: PlainVariable) -> Self {
        self.declared.push(v);
        self
    }

    pub fn defines(mut self, v: impl Into<AbstractVariable>) -> Self {
        self.defined.push(v.into());
        self
    }

    pub fn uses(mut self, v: impl Into<AbstractVariable>) -> Self {
        self.used.push(v.into());
        self
    }

    pub fn invokes(mut self, m: MethodInvocation) -> Self {
        self.invoked.push(m);
        self
    }

    pub fn creates(mut self, type_name: impl Into<String>) -> Self {
        self.created.push(ObjectCreation {
            type_name: type_name.into(),
        });
        self
    }

    pub fn throws(mut self, exception_type: impl Into<String>) -> Self {
        self.thrown.push(exception_type.into());
        self
    }

    pub fn assigns_reference(mut self, assignment: ReferenceAssignment) -> Self {
        self.reference_assignment = Some(assignment);
        self
    }
}

/// One statement node in the arena
#[derive(Debug, Clone)]
pub struct StatementData {
    pub kind: StatementKind,
    pub parent: Option<StmtId>,
    pub children: Vec<StmtId>,
    pub facts: StatementFacts,
}

/// The method body: a statement arena rooted at a composite block
#[derive(Debug, Clone)]
pub struct StatementTree {
    stmts: Vec<StatementData>,
    root: StmtId,
}

impl StatementTree {
    #[must_use]
    pub fn root(&self) -> StmtId {
        self.root
    }

    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &StatementData {
        &self.stmts[id.index()]
    }

    #[must_use]
    pub fn kind(&self, id: StmtId) -> &StatementKind {
        &self.stmt(id).kind
    }

    #[must_use]
    pub fn facts(&self, id: StmtId) -> &StatementFacts {
        &self.stmt(id).facts
    }

    #[must_use]
    pub fn children(&self, id: StmtId) -> &[StmtId] {
        &self.stmt(id).children
    }

    #[must_use]
    pub fn parent(&self, id: StmtId) -> Option<StmtId> {
        self.stmt(id).parent
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// `then` branch of an `If` statement
    #[must_use]
    pub fn then_branch(&self, id: StmtId) -> Option<StmtId> {
        self.children(id).first().copied()
    }

    /// `else` branch of an `If` statement, when present
    #[must_use]
    pub fn else_branch(&self, id: StmtId) -> Option<StmtId> {
        self.children(id).get(1).copied()
    }

    /// Body of a `Loop`, `DoLoop` or `Synchronized` statement
    #[must_use]
    pub fn body(&self, id: StmtId) -> Option<StmtId> {
        self.children(id).first().copied()
    }

    /// Body block of a `Try` statement
    #[must_use]
    pub fn try_body(&self, id: StmtId) -> Option<StmtId> {
        self.children(id).first().copied()
    }

    /// Catch clause bodies of a `Try` statement, in clause order
    #[must_use]
    pub fn catch_bodies(&self, id: StmtId) -> &[StmtId] {
        match self.kind(id) {
            StatementKind::Try {
                catch_types,
                has_finalizer,
            } => {
                let end = self.children(id).len() - usize::from(*has_finalizer);
                debug_assert_eq!(end - 1, catch_types.len());
                &self.children(id)[1..end]
            }
            _ => &[],
        }
    }

    /// Finalizer block of a `Try` statement, when present
    #[must_use]
    pub fn finalizer(&self, id: StmtId) -> Option<StmtId> {
        match self.kind(id) {
            StatementKind::Try {
                has_finalizer: true,
                ..
            } => self.children(id).last().copied(),
            _ => None,
        }
    }

    /// Whether `ancestor` textually contains `stmt` (reflexive)
    #[must_use]
    pub fn contains(&self, ancestor: StmtId, stmt: StmtId) -> bool {
        let mut current = Some(stmt);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

/// Builder for [`StatementTree`], used by the front-end adapter and by tests
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stmts: Vec<StatementData>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder::default()
    }

    fn push(&mut self, kind: StatementKind, children: Vec<StmtId>, facts: StatementFacts) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(StatementData {
            kind,
            parent: None,
            children,
            facts,
        });
        id
    }

    pub fn expr(&mut self, facts: StatementFacts) -> StmtId {
        self.push(StatementKind::Expression, Vec::new(), facts)
    }

    pub fn block(&mut self, children: Vec<StmtId>) -> StmtId {
        self.push(StatementKind::Block, children, StatementFacts::new())
    }

    pub fn if_stmt(
        &mut self,
        facts: StatementFacts,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    ) -> StmtId {
        let mut children = vec![then_branch];
        children.extend(else_branch);
        self.push(StatementKind::If, children, facts)
    }

    pub fn loop_stmt(&mut self, facts: StatementFacts, body: StmtId) -> StmtId {
        self.push(StatementKind::Loop, vec![body], facts)
    }

    pub fn do_loop(&mut self, facts: StatementFacts, body: StmtId) -> StmtId {
        self.push(StatementKind::DoLoop, vec![body], facts)
    }

    pub fn switch(&mut self, facts: StatementFacts, children: Vec<StmtId>) -> StmtId {
        self.push(StatementKind::Switch, children, facts)
    }

    pub fn switch_case(&mut self, facts: StatementFacts, is_default: bool) -> StmtId {
        self.push(StatementKind::SwitchCase { is_default }, Vec::new(), facts)
    }

    pub fn try_stmt(
        &mut self,
        body: StmtId,
        catches: Vec<(Vec<String>, StmtId)>,
        finalizer: Option<StmtId>,
    ) -> StmtId {
        let mut children = vec![body];
        let mut catch_types = Vec::with_capacity(catches.len());
        for (types, catch_body) in catches {
            catch_types.push(types);
            children.push(catch_body);
        }
        let has_finalizer = finalizer.is_some();
        children.extend(finalizer);
        self.push(
            StatementKind::Try {
                catch_types,
                has_finalizer,
            },
            children,
            StatementFacts::new(),
        )
    }

    pub fn labeled(&mut self, label: impl Into<String>, stmt: StmtId) -> StmtId {
        self.push(
            StatementKind::Labeled {
                label: label.into(),
            },
            vec![stmt],
            StatementFacts::new(),
        )
    }

    pub fn synchronized(&mut self, facts: StatementFacts, body: StmtId) -> StmtId {
        self.push(StatementKind::Synchronized, vec![body], facts)
    }

    pub fn break_stmt(&mut self, label: Option<String>) -> StmtId {
        self.push(StatementKind::Break { label }, Vec::new(), StatementFacts::new())
    }

    pub fn continue_stmt(&mut self, label: Option<String>) -> StmtId {
        self.push(
            StatementKind::Continue { label },
            Vec::new(),
            StatementFacts::new(),
        )
    }

    pub fn return_stmt(&mut self, facts: StatementFacts) -> StmtId {
        self.push(StatementKind::Return, Vec::new(), facts)
    }

    pub fn throw_stmt(&mut self, facts: StatementFacts) -> StmtId {
        self.push(StatementKind::Throw, Vec::new(), facts)
    }

    /// Finish the tree, fixing up parent links from the child lists
    pub fn finish(mut self, root: StmtId) -> StatementTree {
        for idx in 0..self.stmts.len() {
            let children = self.stmts[idx].children.clone();
            for child in children {
                self.stmts[child.index()].parent = Some(StmtId(idx as u32));
            }
        }
        StatementTree {
            stmts: self.stmts,
            root,
        }
    }
}
