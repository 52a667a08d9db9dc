//! Parallel batch analysis
//!
//! Analyzes many independent methods concurrently. Every analysis owns its
//! graphs and id allocator, so methods never share mutable state; a failed
//! construction is reported for that method alone and never aborts its
//! siblings.

use rayon::prelude::*;

use crate::error::Result;
use crate::ast::StatementTree;
use crate::pdg::Pdg;
use crate::var::PlainVariable;

/// One method handed over by the front-end
#[derive(Debug, Clone)]
pub struct MethodInput {
    /// Display name used in per-method error reports
    pub name: String,
    pub tree: StatementTree,
    /// Ordered formal parameters
    pub parameters: Vec<PlainVariable>,
    /// Fields the method is permitted to reference
    pub accessible_fields: Vec<PlainVariable>,
}

/// Analyze all methods in parallel, one `Result` per input in order.
///
/// Construction errors are logged and returned per-method; a method with no
/// graph available does not affect any other method.
pub fn analyze_methods(methods: &[MethodInput]) -> Vec<Result<Pdg<'_>>> {
    methods
        .par_iter()
        .map(|method| {
            Pdg::build(
                &method.tree,
                method.parameters.clone(),
                method.accessible_fields.clone(),
            )
            .map_err(|error| {
                log::warn!("no graph available for {}: {error}", method.name);
                error
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{StatementFacts, TreeBuilder};

    fn straight_line_method(name: &str) -> MethodInput {
        let mut t = TreeBuilder::new();
        let s1 = t.expr(StatementFacts::new());
        let root = t.block(vec![s1]);
        MethodInput {
            name: name.into(),
            tree: t.finish(root),
            parameters: Vec::new(),
            accessible_fields: Vec::new(),
        }
    }

    fn broken_method(name: &str) -> MethodInput {
        let mut t = TreeBuilder::new();
        // break with no enclosing loop or switch
        let jump = t.break_stmt(None);
        let root = t.block(vec![jump]);
        MethodInput {
            name: name.into(),
            tree: t.finish(root),
            parameters: Vec::new(),
            accessible_fields: Vec::new(),
        }
    }

    #[test]
    fn failures_are_isolated_per_method() {
        let methods = vec![
            straight_line_method("good1"),
            broken_method("bad"),
            straight_line_method("good2"),
        ];
        let results = analyze_methods(&methods);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
