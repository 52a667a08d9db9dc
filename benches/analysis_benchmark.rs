use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdg_rs::{Pdg, PlainVariable, StatementFacts, StatementTree, TreeBuilder};

/// A chain of loops with interleaved conditionals and a shared counter, large
/// enough to exercise the dependence searches across block boundaries.
fn synthetic_method(loops: usize) -> StatementTree {
    let x = || PlainVariable::local("x", "int");
    let mut t = TreeBuilder::new();
    let decl = t.expr(StatementFacts::new().declares(x()).defines(x()));
    let mut stmts = vec![decl];
    for _ in 0..loops {
        let incr = t.expr(StatementFacts::new().defines(x()).uses(x()));
        let guarded = t.if_stmt(StatementFacts::new().uses(x()), incr, None);
        let body = t.block(vec![guarded]);
        let lp = t.loop_stmt(StatementFacts::new().uses(x()), body);
        stmts.push(lp);
    }
    let print = t.expr(StatementFacts::new().uses(x()));
    stmts.push(print);
    let root = t.block(stmts);
    t.finish(root)
}

fn analysis_benchmark(c: &mut Criterion) {
    let tree = synthetic_method(32);
    c.bench_function("pdg_construction", |b| {
        b.iter(|| {
            black_box(Pdg::build(&tree, Vec::new(), Vec::new()).unwrap());
        });
    });
}

criterion_group!(benches, analysis_benchmark);
criterion_main!(benches);
