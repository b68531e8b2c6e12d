//! Benchmarks for the tick pipeline — the hot path that both peers run
//! once per tick of every match.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use myrmidon::sim::command::{Command, CommandKind};
use myrmidon::sim::entity::EntityKind;
use myrmidon::sim::rules::Rules;
use myrmidon::{run_tick, SimState};

fn bench_idle_tick(c: &mut Criterion) {
    let state = SimState::new(1, 48, 32, Rules::default()).unwrap();

    c.bench_function("idle_tick_48x32", |b| {
        b.iter_batched(
            || state.clone(),
            |mut state| {
                run_tick(black_box(&mut state), &[]);
                black_box(state)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_tick_with_orders(c: &mut Criterion) {
    let mut seed_state = SimState::new(2, 48, 32, Rules::default()).unwrap();
    let ants: Vec<_> = seed_state.entities().iter().filter(|e| e.kind == EntityKind::Ant).map(|e| e.id).collect();
    let commands: Vec<Command> = ants
        .iter()
        .map(|&id| Command { kind: CommandKind::Move, player: 0, tick: 0, entity_ids: vec![id], target_x: 40_000, target_y: 20_000, target_entity_id: None })
        .collect();

    c.bench_function("moving_tick_48x32", |b| {
        b.iter_batched(
            || seed_state.clone(),
            |mut state| {
                run_tick(black_box(&mut state), black_box(&commands));
                black_box(state)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    let _ = &mut seed_state;
}

fn bench_300_tick_match(c: &mut Criterion) {
    c.bench_function("300_ticks_48x32_no_orders", |b| {
        b.iter(|| {
            let mut state = SimState::new(3, 48, 32, Rules::default()).unwrap();
            for _ in 0..300 {
                run_tick(black_box(&mut state), &[]);
            }
            black_box(state)
        });
    });
}

criterion_group!(benches, bench_idle_tick, bench_tick_with_orders, bench_300_tick_match);
criterion_main!(benches);
