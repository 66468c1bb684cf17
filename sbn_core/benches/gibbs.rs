use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sbn_core::{Gibbs, Net};

const SPRINKLER: &str = include_str!("../../demos/sprinkler.sbn");

// a chain of binary variables: x0 -> x1 -> ... -> xn
fn chain_net(len: usize) -> Net {
    let mut net = Net::new("chain");
    for i in 0..len {
        net.add_variable(&format!("x{}", i), &["t", "f"]).unwrap();
    }
    net.set_probabilities("x0", vec![0.5, 0.5]).unwrap();
    for i in 1..len {
        let (parent, child) = (format!("x{}", i - 1), format!("x{}", i));
        net.add_edge(&parent, &child).unwrap();
        net.set_probabilities(&child, vec![0.9, 0.1, 0.2, 0.8])
            .unwrap();
    }
    net.add_evidence(&format!("x{}", len - 1), "t").unwrap();
    net
}

fn parse(c: &mut Criterion) {
    c.bench_function("parse_sprinkler", |b| {
        b.iter(|| black_box(SPRINKLER).parse::<Net>().unwrap())
    });
}

fn query_sprinkler(c: &mut Criterion) {
    let net: Net = SPRINKLER.parse().unwrap();
    let mut group = c.benchmark_group("query_sprinkler");
    for samples in &[100_usize, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(samples), samples, |b, &n| {
            let sampler = Gibbs::new(Some(n), None).with_seed(7);
            b.iter(|| sampler.query(&net, "rain", |_| {}).unwrap());
        });
    }
    group.finish();
}

fn query_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_chain");
    for len in &[4_usize, 16, 64] {
        let net = chain_net(*len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &net, |b, net| {
            let sampler = Gibbs::new(Some(1000), None).with_seed(7);
            b.iter(|| sampler.query(net, "x0", |_| {}).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, parse, query_sprinkler, query_chain);
criterion_main!(benches);
