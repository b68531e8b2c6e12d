#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use myrmidon::sim::command::{sort_canonical, Command, CommandKind};
use myrmidon::sim::invariants::check_invariants;
use myrmidon::sim::rules::Rules;
use myrmidon::sim::state::SimState;
use myrmidon::sim::pipeline::run_tick;

/// Structured input for tick-pipeline fuzzing: a seed plus a bounded batch of
/// commands issued on tick 0.
#[derive(Arbitrary, Debug)]
struct TickInput {
    seed: u32,
    commands: Vec<FuzzCommand>,
}

#[derive(Arbitrary, Debug)]
struct FuzzCommand {
    kind: u8,
    player: i8,
    entity_ids: Vec<u32>,
    target_x: i32,
    target_y: i32,
    target_entity_id: u32,
}

fn command_kind(byte: u8) -> CommandKind {
    match byte % 8 {
        0 => CommandKind::Move,
        1 => CommandKind::Stop,
        2 => CommandKind::Harvest,
        3 => CommandKind::SpawnAnt,
        4 => CommandKind::MergeQueen,
        5 => CommandKind::FoundHive,
        6 => CommandKind::Attack,
        _ => CommandKind::MorphSpitter,
    }
}

fuzz_target!(|input: TickInput| {
    let width = 24;
    let height = 16;
    let Ok(mut state) = SimState::new(input.seed, width, height, Rules::default()) else {
        return;
    };

    let mut commands: Vec<Command> = input
        .commands
        .into_iter()
        .take(64)
        .map(|c| Command {
            kind: command_kind(c.kind),
            player: if c.player == 0 { 0 } else { 1 },
            tick: 0,
            entity_ids: c.entity_ids.into_iter().take(8).collect(),
            target_x: c.target_x,
            target_y: c.target_y,
            target_entity_id: if c.target_entity_id == 0 { None } else { Some(c.target_entity_id) },
        })
        .collect();
    sort_canonical(&mut commands);

    // Arbitrary, possibly-malformed commands must never panic the pipeline
    // and must never leave the state inconsistent.
    for _ in 0..30 {
        run_tick(&mut state, &commands);
        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "invariant violated: {violations:?}");
        commands.clear();
    }
});
