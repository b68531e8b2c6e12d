//! The ordered tick pipeline. This is the one place the pass order is
//! assembled; every subsystem module only exposes the pass(es) it owns.

use crate::sim::apply::apply_commands;
use crate::sim::combat::{run_aggro_redirect, run_combat, run_corpse_decay, run_deaths};
use crate::sim::command::Command;
use crate::sim::founding::run_founding;
use crate::sim::harvest::{run_harvest, run_harvest_redirect, run_hive_income, run_hive_spawn_cooldowns};
use crate::sim::invariants::assert_invariants;
use crate::sim::movement::{run_movement, run_separation};
use crate::sim::state::SimState;
use crate::sim::wildlife::run_wildlife_ai;

/// Run one tick: `commands` must already be in canonical `(player, kind,
/// tick)` order (see [`crate::sim::command::sort_canonical`]).
///
/// Executes all sixteen passes in the fixed order the two peers must agree
/// on, then increments the tick counter. Any deviation from this order
/// breaks determinism.
pub fn run_tick(state: &mut SimState, commands: &[Command]) {
    apply_commands(state, commands); // 1
    run_wildlife_ai(state); // 2
    run_aggro_redirect(state); // 3
    run_harvest_redirect(state); // 4
    run_movement(state); // 5
    run_separation(state); // 6
    run_harvest(state); // 7
    run_combat(state); // 8
    run_deaths(state); // 9
    run_corpse_decay(state); // 10
    run_hive_income(state); // 11
    run_hive_spawn_cooldowns(state); // 12
    run_founding(state); // 13
    state.check_win(); // 14
    state.refresh_visibility(); // 15
    state.advance_tick(); // 16

    assert_invariants(state);
}
