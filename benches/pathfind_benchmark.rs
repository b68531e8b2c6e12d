//! Benchmarks for A* pathfinding over generated terrain at a few map sizes.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use myrmidon::sim::map::{generate, Coord};
use myrmidon::sim::pathfind::find_path;

fn bench_short_path(c: &mut Criterion) {
    let generated = generate(7, 48, 32).unwrap();
    c.bench_function("path_short_48x32", |b| {
        b.iter(|| find_path(black_box(&generated.grid), black_box(Coord::new(4, 4)), black_box(Coord::new(12, 10))));
    });
}

fn bench_long_path(c: &mut Criterion) {
    let generated = generate(7, 48, 32).unwrap();
    c.bench_function("path_long_48x32", |b| {
        b.iter(|| find_path(black_box(&generated.grid), black_box(Coord::new(2, 2)), black_box(Coord::new(45, 29))));
    });
}

fn bench_large_map_long_path(c: &mut Criterion) {
    let generated = generate(7, 128, 96).unwrap();
    c.bench_function("path_long_128x96", |b| {
        b.iter(|| find_path(black_box(&generated.grid), black_box(Coord::new(2, 2)), black_box(Coord::new(120, 90))));
    });
}

criterion_group!(benches, bench_short_path, bench_long_path, bench_large_map_long_path);
criterion_main!(benches);
