//! Benchmarks for the if-conversion pass.
//!
//! Measures the full pipeline (flow matching, statement validation,
//! profitability gates, graph rewrite) over functions built from chains of
//! branch diamonds, plus the matching-only path over functions where every
//! candidate is rejected.

extern crate ifcvt;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use ifcvt::prelude::*;
use std::hint::black_box;

/// Builds a function of `n` half diamonds strung together:
/// `if (x >= k) a = k;` repeated, ending in `return a`.
fn diamond_chain(n: usize) -> FlowGraph {
    let mut b = FunctionBuilder::new();
    let x = b.local(ValType::Int, true);
    let a = b.local(ValType::Int, true);

    let heads: Vec<_> = (0..n).map(|_| b.cond_block()).collect();
    let arms: Vec<_> = (0..n).map(|_| b.jump_block()).collect();
    let merge = b.return_block();

    for i in 0..n {
        let xr = b.local_read(x);
        let k = b.int_const(i as i64, ValType::Int);
        let cond = b.compare(CompareOp::Lt, xr, k);
        b.jump_if_true(heads[i], cond);
        let v = b.int_const(i as i64, ValType::Int);
        b.store(arms[i], a, v);

        let next = if i + 1 < n { heads[i + 1] } else { merge };
        b.branch_to(heads[i], next, arms[i], 0.5);
        b.jump_to(arms[i], next);
    }
    let ar = b.local_read(a);
    b.ret(merge, Some(ar));
    b.finish()
}

/// Like `diamond_chain`, but every arm stores through an opaque value so
/// each candidate is rejected at statement validation.
fn rejected_chain(n: usize) -> FlowGraph {
    let mut b = FunctionBuilder::new();
    let x = b.local(ValType::Int, true);
    let a = b.local(ValType::Int, true);

    let heads: Vec<_> = (0..n).map(|_| b.cond_block()).collect();
    let arms: Vec<_> = (0..n).map(|_| b.jump_block()).collect();
    let merge = b.return_block();

    for i in 0..n {
        let xr = b.local_read(x);
        let k = b.int_const(i as i64, ValType::Int);
        let cond = b.compare(CompareOp::Lt, xr, k);
        b.jump_if_true(heads[i], cond);
        let v = b.opaque(ValType::Int);
        b.flag(v, EffectFlags::SIDE_EFFECT);
        b.store(arms[i], a, v);

        let next = if i + 1 < n { heads[i + 1] } else { merge };
        b.branch_to(heads[i], next, arms[i], 0.5);
        b.jump_to(arms[i], next);
    }
    b.ret(merge, None);
    b.finish()
}

fn bench_convert_diamond_chain(c: &mut Criterion) {
    let pass = IfConversionPass::new();

    let mut group = c.benchmark_group("ifconvert_chain");
    for n in [8usize, 64, 512] {
        let template = diamond_chain(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("convert_{n}_diamonds"), |b| {
            b.iter_batched(
                || template.clone(),
                |mut graph| {
                    let ctx = PassContext::new(PassConfig::default(), Target::default());
                    let status = pass.run(&mut graph, &ctx).unwrap();
                    black_box((graph, status))
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_reject_diamond_chain(c: &mut Criterion) {
    let pass = IfConversionPass::new();

    let mut group = c.benchmark_group("ifconvert_reject");
    for n in [64usize, 512] {
        let template = rejected_chain(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("reject_{n}_candidates"), |b| {
            b.iter_batched(
                || template.clone(),
                |mut graph| {
                    let ctx = PassContext::new(PassConfig::default(), Target::default());
                    let status = pass.run(&mut graph, &ctx).unwrap();
                    black_box((graph, status))
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_parallel_functions(c: &mut Criterion) {
    let pass = IfConversionPass::new();
    let templates: Vec<FlowGraph> = (0..64).map(|_| diamond_chain(16)).collect();

    c.bench_function("ifconvert_64_functions_parallel", |b| {
        b.iter_batched(
            || templates.clone(),
            |mut graphs| {
                let ctx = PassContext::new(PassConfig::default(), Target::default());
                let modified = pass.run_over_functions(&mut graphs, &ctx).unwrap();
                black_box((graphs, modified))
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_convert_diamond_chain,
    bench_reject_diamond_chain,
    bench_parallel_functions
);
criterion_main!(benches);
