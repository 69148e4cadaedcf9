use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tellus::{Seed, TerrainConfig, World, WorldConfig};

fn bench_config() -> WorldConfig {
    WorldConfig {
        seed: Seed::from(42u32),
        width_m: 4_096_000.0,
        height_m: 2_048_000.0,
        cell_size_m: 1000.0,
        chunk_cells: 64,
        max_resident_chunks: 16,
        terrain: TerrainConfig {
            coarse_sample_res: 128,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("world-generation");
    group.sample_size(10);

    group.bench_function("world init", |b| {
        b.iter(|| World::generate(black_box(bench_config())).unwrap())
    });

    let mut world = World::generate(bench_config()).unwrap();
    let mut next = 0i64;
    group.bench_function("tile fill", |b| {
        b.iter(|| {
            // Walk fresh coordinates so every iteration is a cache miss
            next += 1;
            world.cache_mut().clear();
            black_box(world.tile(next, next / 7));
        })
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
