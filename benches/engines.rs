//! Criterion benchmarks for the two activation-spreading engines.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ratnet::graph::AssociationGraph;
use ratnet::network::{DynamicalNetwork, NetworkConfig};
use ratnet::prng::Prng;
use ratnet::search::{search, SearchParams};

/// Random sparse association graph with `per_node` outgoing edges per word.
fn make_graph(n: usize, per_node: usize, seed: u64) -> AssociationGraph {
    let mut rng = Prng::new(seed);
    let mut b = AssociationGraph::builder();

    let words: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
    for w in &words {
        b.add_word(w);
    }
    for (j, w) in words.iter().enumerate() {
        for _ in 0..per_node {
            let mut target = rng.gen_range_usize(0, n);
            if target == j {
                target = (target + 1) % n;
            }
            b.add_edge(w, &words[target], rng.gen_range_f32(0.01, 0.6));
        }
    }

    b.build().expect("generated weights are non-negative")
}

fn bench_search_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_size");

    for size in [64, 256, 1024].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("spread", size), size, |b, &size| {
            let graph = make_graph(size, 8, 42);
            let params = SearchParams {
                threshold: 0.0,
                max_visited: 10,
            };
            let cues = [0, 1, 2];
            let target = size - 1;

            b.iter(|| {
                let out = search(&graph, &cues, target, &params).unwrap();
                black_box(out.visited.len())
            });
        });
    }

    group.finish();
}

fn bench_network_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("network_run");
    group.sample_size(10);

    let size = 64;
    group.throughput(Throughput::Elements(size as u64));
    group.bench_function("run_64", |b| {
        let graph = make_graph(size, 8, 42);
        let cfg = NetworkConfig {
            max_visited: 4,
            t_max: 3_000,
            seed: Some(7),
            ..NetworkConfig::default()
        };
        let cues = [0, 1, 2];
        let target = size - 1;

        b.iter(|| {
            let mut net = DynamicalNetwork::new(&graph, cfg).unwrap();
            let out = net.run(&cues, target).unwrap();
            black_box(out.steps)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_search_sizes, bench_network_run);
criterion_main!(benches);
