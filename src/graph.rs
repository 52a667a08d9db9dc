//! Graph kernel
//!
//! Shared primitives for the CFG and PDG layers: integer node identity and
//! the per-analysis id allocator. The graphs themselves live in `petgraph`
//! arenas (`DiGraph` with node/edge weights), so nodes and edges never hold
//! references to each other.

use std::fmt;

/// Node identity within one CFG/PDG pair.
///
/// Ids are unique within a single analysis run; node equality is id-based.
/// Id 0 is reserved for the method-entry PDG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The fixed id of the method-entry PDG node
    pub const METHOD_ENTRY: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id allocator owned by a single analysis run.
///
/// Each CFG/PDG construction owns its own allocator, so concurrent analyses
/// of different methods never contend or collide. Ids start at 1; id 0 is
/// reserved for the method-entry node.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator { next: 1 }
    }

    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        IdAllocator::new()
    }
}
