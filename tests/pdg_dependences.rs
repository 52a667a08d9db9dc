use pdg_rs::pdg::{DependenceClass, Pdg, PdgDependence};
use pdg_rs::{AbstractVariable, MethodInvocation, PlainVariable, StatementFacts, TreeBuilder};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

mod common {
    use super::*;

    pub fn var(name: &str) -> PlainVariable {
        PlainVariable::local(name, "int")
    }

    pub fn uses(name: &str) -> StatementFacts {
        StatementFacts::new().uses(var(name))
    }

    pub fn build(tree: &pdg_rs::StatementTree) -> Pdg<'_> {
        let _ = env_logger::builder().is_test(true).try_init();
        Pdg::build(tree, Vec::new(), Vec::new()).unwrap()
    }
}
use common::{build, uses, var};

fn control_edges(pdg: &Pdg<'_>) -> Vec<(NodeIndex, NodeIndex, bool)> {
    pdg.graph()
        .edge_references()
        .filter_map(|e| match e.weight() {
            PdgDependence::Control { true_branch } => {
                Some((e.source(), e.target(), *true_branch))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn straight_line_statements_hang_off_the_entry_node() {
    let mut t = TreeBuilder::new();
    let s1 = t.expr(StatementFacts::new());
    let s2 = t.expr(StatementFacts::new());
    let s3 = t.expr(StatementFacts::new());
    let root = t.block(vec![s1, s2, s3]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let edges = control_edges(&pdg);
    assert_eq!(edges.len(), 3);
    for (src, _, true_branch) in &edges {
        assert_eq!(*src, pdg.entry());
        assert!(*true_branch);
    }
    for stmt in [s1, s2, s3] {
        let n = pdg.pdg_node_of_stmt(stmt).unwrap();
        assert_eq!(pdg.control_dependence_parent(n), Some(pdg.entry()));
    }
}

#[test]
fn empty_method_yields_entry_node_only() {
    let mut t = TreeBuilder::new();
    let root = t.block(vec![]);
    let tree = t.finish(root);
    let pdg = build(&tree);
    assert_eq!(pdg.graph().node_count(), 1);
    assert_eq!(pdg.graph().edge_count(), 0);
}

#[test]
fn control_parent_chains_terminate_at_the_entry_node() {
    let mut t = TreeBuilder::new();
    let x = t.expr(uses("x"));
    let inner_body = t.block(vec![x]);
    let inner = t.if_stmt(uses("d"), inner_body, None);
    let outer_body = t.block(vec![inner]);
    let outer = t.loop_stmt(uses("c"), outer_body);
    let root = t.block(vec![outer]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    assert!(pdg.control_dependence_parent(pdg.entry()).is_none());
    for (idx, _) in pdg.nodes() {
        let mut current = idx;
        let mut steps = 0;
        while let Some(parent) = pdg.control_dependence_parent(current) {
            current = parent;
            steps += 1;
            assert!(steps <= 4, "parent chain exceeds nesting depth");
        }
        assert_eq!(current, pdg.entry());
    }
    // nested statements attach beneath their own branch, not the outer one
    let x_node = pdg.pdg_node_of_stmt(x).unwrap();
    let inner_node = pdg.pdg_node_of_stmt(inner).unwrap();
    let outer_node = pdg.pdg_node_of_stmt(outer).unwrap();
    assert_eq!(pdg.control_dependence_parent(x_node), Some(inner_node));
    assert_eq!(pdg.control_dependence_parent(inner_node), Some(outer_node));
}

#[test]
fn definition_reaches_use_without_loop_tag() {
    let mut t = TreeBuilder::new();
    let decl = t.expr(StatementFacts::new().declares(var("x")).defines(var("x")));
    let print = t.expr(uses("x"));
    let root = t.block(vec![decl, print]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let decl_node = pdg.pdg_node_of_stmt(decl).unwrap();
    let print_node = pdg.pdg_node_of_stmt(print).unwrap();
    let data: Vec<_> = pdg
        .outgoing_of_class(decl_node, DependenceClass::Data)
        .collect();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].0, print_node);
    assert_eq!(
        data[0].1.variable(),
        Some(&AbstractVariable::Plain(var("x")))
    );
    assert!(data[0].1.loop_node().is_none());
}

#[test]
fn loop_carried_dependence_is_tagged_with_the_loop_node() {
    let mut t = TreeBuilder::new();
    let incr = t.expr(StatementFacts::new().defines(var("x")).uses(var("x")));
    let body = t.block(vec![incr]);
    let lp = t.loop_stmt(uses("c"), body);
    let print = t.expr(uses("x"));
    let root = t.block(vec![lp, print]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let incr_node = pdg.pdg_node_of_stmt(incr).unwrap();
    let print_node = pdg.pdg_node_of_stmt(print).unwrap();
    let lp_cfg = pdg.cfg().node_of_stmt(lp).unwrap();

    let data: Vec<_> = pdg
        .outgoing_of_class(incr_node, DependenceClass::Data)
        .collect();
    // next-iteration self dependence carries the loop tag
    let self_dep = data.iter().find(|(t, _)| *t == incr_node).unwrap();
    assert_eq!(self_dep.1.loop_node(), Some(lp_cfg));
    // post-loop dependence does not
    let exit_dep = data.iter().find(|(t, _)| *t == print_node).unwrap();
    assert!(exit_dep.1.loop_node().is_none());
}

#[test]
fn redefinition_produces_an_output_dependence_and_kills_the_path() {
    let mut t = TreeBuilder::new();
    let first = t.expr(StatementFacts::new().declares(var("x")).defines(var("x")));
    let second = t.expr(StatementFacts::new().defines(var("x")));
    let print = t.expr(uses("x"));
    let root = t.block(vec![first, second, print]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let first_node = pdg.pdg_node_of_stmt(first).unwrap();
    let second_node = pdg.pdg_node_of_stmt(second).unwrap();
    let print_node = pdg.pdg_node_of_stmt(print).unwrap();

    let output: Vec<_> = pdg
        .outgoing_of_class(first_node, DependenceClass::Output)
        .collect();
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].0, second_node);
    // the first definition is killed before the use
    assert!(pdg
        .outgoing_of_class(first_node, DependenceClass::Data)
        .next()
        .is_none());
    assert!(pdg
        .outgoing_of_class(second_node, DependenceClass::Data)
        .any(|(t, _)| t == print_node));
}

#[test]
fn use_before_redefinition_produces_an_anti_dependence() {
    let mut t = TreeBuilder::new();
    let print = t.expr(uses("x"));
    let redef = t.expr(StatementFacts::new().defines(var("x")));
    let root = t.block(vec![print, redef]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let print_node = pdg.pdg_node_of_stmt(print).unwrap();
    let redef_node = pdg.pdg_node_of_stmt(redef).unwrap();
    let anti: Vec<_> = pdg
        .outgoing_of_class(print_node, DependenceClass::Anti)
        .collect();
    assert_eq!(anti.len(), 1);
    assert_eq!(anti[0].0, redef_node);
}

#[test]
fn formal_parameters_seed_data_dependences_from_the_entry_node() {
    let p = PlainVariable::parameter("p", "int");
    let mut t = TreeBuilder::new();
    let print = t.expr(StatementFacts::new().uses(p.clone()));
    let root = t.block(vec![print]);
    let tree = t.finish(root);

    let pdg = Pdg::build(&tree, vec![p.clone()], Vec::new()).unwrap();
    let print_node = pdg.pdg_node_of_stmt(print).unwrap();
    assert!(pdg
        .outgoing_of_class(pdg.entry(), DependenceClass::Data)
        .any(|(t, d)| t == print_node
            && d.variable() == Some(&AbstractVariable::Plain(p.clone()))));
    assert!(pdg.node(pdg.entry()).declares(&p));
}

#[test]
fn declared_but_unused_variables_produce_no_edges() {
    let mut t = TreeBuilder::new();
    let decl = t.expr(StatementFacts::new().declares(var("y")));
    let root = t.block(vec![decl]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    assert!(pdg.declared_variables().contains(&var("y")));
    let decl_node = pdg.pdg_node_of_stmt(decl).unwrap();
    assert!(pdg
        .outgoing_dependences(decl_node)
        .all(|(_, d)| d.variable().is_none()));
}

#[test]
fn break_flushes_the_case_buffer_with_false_edges() {
    let mut t = TreeBuilder::new();
    let case_a = t.switch_case(StatementFacts::new(), false);
    let case_b = t.switch_case(StatementFacts::new(), false);
    let brk = t.break_stmt(None);
    let sw = t.switch(uses("s"), vec![case_a, case_b, brk]);
    let after = t.expr(StatementFacts::new());
    let root = t.block(vec![sw, after]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let brk_node = pdg.pdg_node_of_stmt(brk).unwrap();
    let case_a_node = pdg.pdg_node_of_stmt(case_a).unwrap();
    let case_b_node = pdg.pdg_node_of_stmt(case_b).unwrap();
    let after_node = pdg.pdg_node_of_stmt(after).unwrap();

    for case in [case_a_node, case_b_node] {
        assert!(pdg
            .outgoing_of_class(brk_node, DependenceClass::Control)
            .any(|(t, d)| t == case && d.is_control_false()));
    }
    // the buffer was flushed: nothing after the switch picks up leftover
    // true dependences from those cases
    assert!(pdg
        .incoming_of_class(after_node, DependenceClass::Control)
        .all(|(src, d)| !(d.is_control_true() && (src == case_a_node || src == case_b_node))));
}

#[test]
fn fallthrough_without_break_extends_true_dependence() {
    let mut t = TreeBuilder::new();
    let case_a = t.switch_case(StatementFacts::new(), false);
    let stmt_x = t.expr(StatementFacts::new());
    let case_b = t.switch_case(StatementFacts::new(), false);
    let stmt_y = t.expr(StatementFacts::new());
    let sw = t.switch(uses("s"), vec![case_a, stmt_x, case_b, stmt_y]);
    let root = t.block(vec![sw]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let case_a_node = pdg.pdg_node_of_stmt(case_a).unwrap();
    let case_b_node = pdg.pdg_node_of_stmt(case_b).unwrap();
    let stmt_y_node = pdg.pdg_node_of_stmt(stmt_y).unwrap();
    // without a break, earlier cases stay buffered: y depends on both
    for case in [case_a_node, case_b_node] {
        assert!(pdg
            .incoming_of_class(stmt_y_node, DependenceClass::Control)
            .any(|(src, d)| src == case && d.is_control_true()));
    }
}

#[test]
fn jump_resolution_adds_false_edges_to_skipped_statements() {
    let mut t = TreeBuilder::new();
    let brk = t.break_stmt(None);
    let guard = t.if_stmt(uses("d"), brk, None);
    let rest = t.expr(StatementFacts::new());
    let body = t.block(vec![guard, rest]);
    let lp = t.loop_stmt(uses("c"), body);
    let root = t.block(vec![lp]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let brk_node = pdg.pdg_node_of_stmt(brk).unwrap();
    let lp_node = pdg.pdg_node_of_stmt(lp).unwrap();
    let rest_node = pdg.pdg_node_of_stmt(rest).unwrap();

    assert!(pdg
        .outgoing_of_class(brk_node, DependenceClass::Control)
        .any(|(t, d)| t == lp_node && d.is_control_false()));
    // control flow the break causes to be skipped
    assert!(pdg
        .outgoing_of_class(brk_node, DependenceClass::Control)
        .any(|(t, d)| t == rest_node && d.is_control_false()));
}

#[test]
fn throwing_call_attaches_beneath_the_matching_try() {
    let mut t = TreeBuilder::new();
    let risky = t.expr(StatementFacts::new().invokes(MethodInvocation::new("risky").throws("E")));
    let later = t.expr(StatementFacts::new());
    let body = t.block(vec![risky, later]);
    let handle = t.expr(StatementFacts::new());
    let catch_body = t.block(vec![handle]);
    let try_stmt = t.try_stmt(body, vec![(vec!["E".to_string()], catch_body)], None);
    let root = t.block(vec![try_stmt]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let try_node = pdg.pdg_node_of_stmt(try_stmt).unwrap();
    let risky_node = pdg.pdg_node_of_stmt(risky).unwrap();
    let later_node = pdg.pdg_node_of_stmt(later).unwrap();

    assert!(pdg
        .outgoing_of_class(try_node, DependenceClass::Control)
        .any(|(t, d)| t == risky_node && d.is_control_true()));
    // abrupt completion skips the remainder of the block
    assert!(pdg
        .outgoing_of_class(risky_node, DependenceClass::Control)
        .any(|(t, d)| t == later_node && d.is_control_false()));
}

#[test]
fn unmatched_exception_type_adds_no_try_dependence() {
    let mut t = TreeBuilder::new();
    let risky = t.expr(StatementFacts::new().invokes(MethodInvocation::new("risky").throws("F")));
    let body = t.block(vec![risky]);
    let handle = t.expr(StatementFacts::new());
    let catch_body = t.block(vec![handle]);
    let try_stmt = t.try_stmt(body, vec![(vec!["E".to_string()], catch_body)], None);
    let root = t.block(vec![try_stmt]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let try_node = pdg.pdg_node_of_stmt(try_stmt).unwrap();
    let risky_node = pdg.pdg_node_of_stmt(risky).unwrap();
    assert!(!pdg
        .outgoing_of_class(try_node, DependenceClass::Control)
        .any(|(t, _)| t == risky_node));
}

#[test]
fn first_def_and_last_use_follow_textual_order() {
    let mut t = TreeBuilder::new();
    let first = t.expr(StatementFacts::new().declares(var("x")).defines(var("x")));
    let second = t.expr(StatementFacts::new().defines(var("x")).uses(var("x")));
    let print = t.expr(uses("x"));
    let root = t.block(vec![first, second, print]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let x = AbstractVariable::Plain(var("x"));
    assert_eq!(pdg.first_def_of(&x), pdg.pdg_node_of_stmt(first));
    assert_eq!(pdg.last_use_of(&x), pdg.pdg_node_of_stmt(print));
}

#[test]
fn block_based_region_covers_reachable_blocks() {
    let mut t = TreeBuilder::new();
    let a = t.expr(StatementFacts::new());
    let cond = t.if_stmt(uses("c"), a, None);
    let after = t.expr(StatementFacts::new());
    let root = t.block(vec![cond, after]);
    let tree = t.finish(root);

    let pdg = build(&tree);
    let cond_node = pdg.pdg_node_of_stmt(cond).unwrap();
    let entry_block = pdg.basic_block_of(cond_node).unwrap();
    let region = pdg.block_based_region(entry_block);
    for stmt in [cond, a, after] {
        assert!(region.contains(&pdg.pdg_node_of_stmt(stmt).unwrap()));
    }
}
