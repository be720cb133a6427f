use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use spriteforge_core::prelude::*;
use std::hint::black_box;

fn generate_sizes(count: usize, min_size: u32, max_size: u32) -> Vec<SpriteSize> {
    let mut rng = StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            SpriteSize::new(format!("tex_{i}"), w, h)
        })
        .collect()
}

fn bench_heuristics(c: &mut Criterion) {
    let mut group = c.benchmark_group("maxrects_heuristics");
    let heuristics = [
        ("BSSF", MaxRectsHeuristic::BestShortSideFit),
        ("BAF", MaxRectsHeuristic::BestAreaFit),
        ("BLSF", MaxRectsHeuristic::BestLongSideFit),
        ("BL", MaxRectsHeuristic::BottomLeft),
        ("CP", MaxRectsHeuristic::ContactPoint),
    ];

    for count in [50, 100, 200] {
        let sizes = generate_sizes(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));
        for (name, h) in heuristics {
            let cfg = PackingConfig::builder()
                .with_max_dimensions(2048, 2048)
                .allow_rotation(true)
                .heuristic(h)
                .build();
            group.bench_with_input(BenchmarkId::new(name, count), &sizes, |b, sizes| {
                b.iter(|| black_box(pack(sizes, &cfg)));
            });
        }
    }
    group.finish();
}

fn bench_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("bin_growth");
    let sizes = generate_sizes(300, 8, 48);
    for pot in [true, false] {
        let cfg = PackingConfig::builder()
            .with_max_dimensions(1024, 1024)
            .pot(pot)
            .build();
        let label = if pot { "pot" } else { "exact" };
        group.bench_with_input(BenchmarkId::new(label, sizes.len()), &sizes, |b, sizes| {
            b.iter(|| black_box(pack(sizes, &cfg)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_heuristics, bench_growth);
criterion_main!(benches);
