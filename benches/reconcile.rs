use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use editchain::{
    core::{adjust::Adjustments, chain::EditChain},
    op::EditOp,
    types::AdjustKind,
};

fn chain_with_discrete(ops: usize) -> EditChain {
    let mut chain = EditChain::new();
    for i in 0..ops {
        let op = if i % 2 == 0 {
            EditOp::Rotate { degrees: 90 }
        } else {
            EditOp::Mirror
        };
        chain.append(op).expect("append");
    }
    chain
}

fn bench_slider_storm(c: &mut Criterion) {
    c.bench_function("reconcile_slider_storm_10k", |b| {
        b.iter(|| {
            let mut chain = chain_with_discrete(8);
            let mut sliders = Adjustments::new();
            for i in 0..10_000i16 {
                let kind = AdjustKind::ORDER[usize::from(i as u16 % 4)];
                sliders.set(kind, (i % 201) - 100);
                let _ = sliders.reconcile(&mut chain);
            }
        });
    });
}

fn bench_reconcile_by_chain_len(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_chain_len");
    for n in [4usize, 64usize, 1024usize] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut chain = chain_with_discrete(n);
            let mut sliders = Adjustments::new();
            sliders.set(AdjustKind::Brightness, 40);
            sliders.set(AdjustKind::Contrast, -25);
            b.iter(|| {
                let _ = sliders.reconcile(&mut chain);
            });
        });
    }
    group.finish();
}

fn bench_wire_encoding(c: &mut Criterion) {
    let mut chain = chain_with_discrete(64);
    let mut sliders = Adjustments::new();
    for kind in AdjustKind::ORDER {
        sliders.set(kind, 33);
    }
    let snapshot = sliders.reconcile(&mut chain);

    c.bench_function("chain_to_wire_tokens_68", |b| {
        b.iter(|| serde_json::to_string(&snapshot[..]).expect("serialize"));
    });

    let json = serde_json::to_string(&snapshot[..]).expect("serialize");
    c.bench_function("chain_from_wire_tokens_68", |b| {
        b.iter(|| serde_json::from_str::<Vec<EditOp>>(&json).expect("parse"));
    });
}

criterion_group!(
    benches,
    bench_slider_storm,
    bench_reconcile_by_chain_len,
    bench_wire_encoding
);
criterion_main!(benches);
