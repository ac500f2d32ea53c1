use criterion::{black_box, criterion_group, criterion_main, Criterion};

use galaxy_core::gates::{build_gate_network, GateConfig};
use galaxy_core::points::{generator_for, DistributionMethod, GeneratorOptions, PointConfig};
use galaxy_core::rng::{EngineKind, SeededRng};
use galaxy_schema::{GateStatus, Star};

fn point_config(count: u32) -> PointConfig {
    PointConfig {
        width: 1500,
        height: 1500,
        count,
        spacing_factor: 0.75,
        options: GeneratorOptions::default(),
    }
}

fn bench_point_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("points");
    for method in [
        DistributionMethod::RandomScatter,
        DistributionMethod::PoissonDisk,
        DistributionMethod::R2Sequence,
        DistributionMethod::StratifiedGrid,
    ] {
        group.bench_function(format!("{method:?}_1000"), |b| {
            let generator = generator_for(method, point_config(1000));
            b.iter(|| {
                let mut rng = SeededRng::new(EngineKind::ChaCha8, 42);
                black_box(generator.sample(&mut rng))
            });
        });
    }
    group.finish();
}

fn bench_gate_network(c: &mut Criterion) {
    let generator = generator_for(DistributionMethod::PoissonDisk, point_config(2000));
    let mut rng = SeededRng::new(EngineKind::ChaCha8, 7);
    let sampled = generator.sample(&mut rng);
    let stars: Vec<Star> = sampled
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| Star {
            id: i as u64 + 1,
            x: p.x,
            y: p.y,
            inhabited: true,
        })
        .collect();

    c.bench_function("gate_network_2000_stars", |b| {
        b.iter(|| {
            black_box(build_gate_network(
                1,
                &stars,
                &GateConfig {
                    adjacency_threshold: 100.0,
                    max_gates_per_system: 6,
                    status: GateStatus::Active,
                    hidden: false,
                },
            ))
        });
    });
}

criterion_group!(benches, bench_point_generation, bench_gate_network);
criterion_main!(benches);
