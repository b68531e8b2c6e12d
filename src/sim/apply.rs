//! Pass 1 of the tick pipeline: dispatch each canonically-sorted command by
//! kind. Every branch is a total, silent no-op on invalid input — a peer
//! must never diverge because it validated a command differently than the
//! other did.

use std::collections::HashSet;

use crate::sim::command::{Command, CommandKind};
use crate::sim::entity::{player_index, Entity, EntityId, EntityKind, EntityState, MilliPos, MILLI_PER_TILE, NEUTRAL};
use crate::sim::pathfind::{find_path, nearest_walkable};
use crate::sim::state::SimState;
use crate::sim::units::{milli_of, tile_of};

/// Apply every command in `commands` (already in canonical order) to
/// `state`.
pub(crate) fn apply_commands(state: &mut SimState, commands: &[Command]) {
    for command in commands {
        match command.kind {
            CommandKind::Move => apply_move(state, command),
            CommandKind::Stop => apply_stop(state, command),
            CommandKind::Attack => apply_attack(state, command),
            CommandKind::Harvest => apply_harvest(state, command),
            CommandKind::SpawnAnt => apply_spawn_ant(state, command),
            CommandKind::MergeQueen => apply_merge_queen(state, command),
            CommandKind::FoundHive => apply_found_hive(state, command),
            CommandKind::MorphSpitter => apply_morph_spitter(state, command),
        }
    }
}

/// Resolve a requested tile, redirecting to the nearest walkable tile if
/// the requested one is rock. Returns `None` only when no walkable tile
/// exists within the search radius.
fn resolve_goal(state: &SimState, target_x: i32, target_y: i32) -> Option<crate::sim::map::Coord> {
    let goal = tile_of(MilliPos::new(target_x, target_y));
    nearest_walkable(state.tilemap(), goal)
}

fn path_entity_to(state: &mut SimState, entity_id: EntityId, goal_tile: crate::sim::map::Coord) {
    let Some(start_tile) = state.entities().get(entity_id).map(|e| tile_of(e.pos)) else { return };
    let path = find_path(state.tilemap(), start_tile, goal_tile);
    if let Some(entity) = state.entities_mut().get_mut(entity_id) {
        entity.target = milli_of(goal_tile);
        entity.path = path.into_iter().map(milli_of).collect();
        entity.state = EntityState::Moving;
        entity.target_entity = None;
    }
}

fn apply_move(state: &mut SimState, command: &Command) {
    let Some(goal_tile) = resolve_goal(state, command.target_x, command.target_y) else { return };
    for &id in &command.entity_ids {
        let owned = state.entities().get(id).is_some_and(|e| e.owner == command.player);
        if owned {
            path_entity_to(state, id, goal_tile);
        }
    }
}

fn apply_stop(state: &mut SimState, command: &Command) {
    for &id in &command.entity_ids {
        if let Some(entity) = state.entities_mut().get_mut(id) {
            if entity.owner != command.player {
                continue;
            }
            entity.path.clear();
            entity.target = entity.pos;
            entity.state = EntityState::Idle;
            entity.target_entity = None;
        }
    }
}

fn apply_attack(state: &mut SimState, command: &Command) {
    let Some(target_id) = command.target_entity_id else { return };
    let Some(target_tile) = state.entities().get(target_id).map(|e| tile_of(e.pos)) else { return };
    for &id in &command.entity_ids {
        let responds = state.entities().get(id).is_some_and(|e| e.owner == command.player && e.damage > 0);
        if !responds {
            continue;
        }
        path_entity_to(state, id, target_tile);
        if let Some(entity) = state.entities_mut().get_mut(id) {
            entity.target_entity = Some(target_id);
            entity.state = EntityState::Attacking;
        }
    }
}

fn apply_harvest(state: &mut SimState, command: &Command) {
    let goal_tile = if let Some(corpse_id) = command.target_entity_id {
        match state.entities().get(corpse_id).map(|e| tile_of(e.pos)) {
            Some(tile) => tile,
            None => return,
        }
    } else {
        match resolve_goal(state, command.target_x, command.target_y) {
            Some(tile) => tile,
            None => return,
        }
    };

    for &id in &command.entity_ids {
        let responds = state.entities().get(id).is_some_and(|e| e.owner == command.player && e.kind == EntityKind::Ant);
        if !responds {
            continue;
        }
        path_entity_to(state, id, goal_tile);
        if let Some(entity) = state.entities_mut().get_mut(id) {
            entity.state = EntityState::Harvesting;
            entity.target_entity = command.target_entity_id;
        }
    }
}

fn apply_spawn_ant(state: &mut SimState, command: &Command) {
    let Some(hive_id) = command.target_entity_id else { return };
    let rules = *state.rules();
    let Some(hive) = state.entities().get(hive_id) else { return };
    if hive.owner != command.player || hive.kind != EntityKind::Hive || hive.cooldown != 0 {
        return;
    }
    let player = player_index(command.player);
    if state.jelly(player) < rules.spawn_cost {
        return;
    }
    state.debit_jelly(player, rules.spawn_cost);
    if let Some(hive) = state.entities_mut().get_mut(hive_id) {
        hive.cooldown = rules.spawn_cooldown_ticks;
    }
}

fn apply_merge_queen(state: &mut SimState, command: &Command) {
    let Some(hive_id) = command.target_entity_id else { return };
    let rules = *state.rules();
    let Some(hive) = state.entities().get(hive_id) else { return };
    if hive.owner != command.player || hive.kind != EntityKind::Hive {
        return;
    }
    let hive_pos = hive.pos;
    let merge_range_milli = rules.merge_range * MILLI_PER_TILE;
    let merge_range_sq = i64::from(merge_range_milli) * i64::from(merge_range_milli);
    let merge_cost = usize::try_from(rules.queen_merge_cost).unwrap_or(0);

    let mut chosen = Vec::new();
    for &id in &command.entity_ids {
        if chosen.len() >= merge_cost {
            break;
        }
        if let Some(ant) = state.entities().get(id) {
            if ant.owner == command.player && ant.kind == EntityKind::Ant && ant.pos.dist_sq(hive_pos) <= merge_range_sq {
                chosen.push(id);
            }
        }
    }
    if chosen.len() < merge_cost {
        return;
    }

    let mut removed: HashSet<EntityId> = HashSet::new();
    removed.extend(chosen);
    state.entities_mut().remove_set(&removed);
    state.entities_mut().spawn(|id| Entity::spawn_default(id, EntityKind::Queen, command.player, hive_pos));
}

fn apply_found_hive(state: &mut SimState, command: &Command) {
    let (Some(&queen_id), Some(site_id)) = (command.entity_ids.first(), command.target_entity_id) else { return };
    let queen_owned = state.entities().get(queen_id).is_some_and(|e| e.owner == command.player && e.kind == EntityKind::Queen);
    let site_is_neutral_site = state.entities().get(site_id).is_some_and(|e| e.owner == NEUTRAL && e.kind == EntityKind::HiveSite);
    if !queen_owned || !site_is_neutral_site {
        return;
    }
    let Some(site_tile) = state.entities().get(site_id).map(|e| tile_of(e.pos)) else { return };
    path_entity_to(state, queen_id, site_tile);
    if let Some(queen) = state.entities_mut().get_mut(queen_id) {
        queen.state = EntityState::Founding;
        queen.target_entity = Some(site_id);
    }
}

fn apply_morph_spitter(state: &mut SimState, command: &Command) {
    let (Some(&ant_id), Some(hive_id)) = (command.entity_ids.first(), command.target_entity_id) else { return };
    let rules = *state.rules();
    let Some(hive) = state.entities().get(hive_id) else { return };
    if hive.owner != command.player || hive.kind != EntityKind::Hive {
        return;
    }
    let hive_pos = hive.pos;
    let merge_range_milli = rules.merge_range * MILLI_PER_TILE;
    let merge_range_sq = i64::from(merge_range_milli) * i64::from(merge_range_milli);
    let Some(ant) = state.entities().get(ant_id) else { return };
    if ant.owner != command.player || ant.kind != EntityKind::Ant || ant.pos.dist_sq(hive_pos) > merge_range_sq {
        return;
    }
    let player = player_index(command.player);
    if state.jelly(player) < rules.morph_cost {
        return;
    }
    let ant_pos = ant.pos;
    state.debit_jelly(player, rules.morph_cost);

    let mut removed = HashSet::new();
    removed.insert(ant_id);
    state.entities_mut().remove_set(&removed);
    state.entities_mut().spawn(|id| Entity::spawn_default(id, EntityKind::Spitter, command.player, ant_pos));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::command::{Command, CommandKind};
    use crate::sim::rules::Rules;
    use crate::sim::state::SimState;

    fn new_state() -> SimState {
        SimState::new(1, 24, 16, Rules::default()).unwrap()
    }

    fn cmd(kind: CommandKind, player: i8, entity_ids: Vec<EntityId>) -> Command {
        Command { kind, player, tick: 0, entity_ids, target_x: 0, target_y: 0, target_entity_id: None }
    }

    #[test]
    fn move_sets_path_and_target_for_owned_entity() {
        let mut state = new_state();
        let ant_id = state.entities().iter().find(|e| e.kind == EntityKind::Ant && e.owner == 0).unwrap().id;
        let mut command = cmd(CommandKind::Move, 0, vec![ant_id]);
        command.target_x = 15_000;
        command.target_y = 8_000;
        apply_commands(&mut state, &[command]);
        let ant = state.entities().get(ant_id).unwrap();
        assert_eq!(ant.state, EntityState::Moving);
        assert!(ant.is_moving());
    }

    #[test]
    fn move_ignores_unowned_entity() {
        let mut state = new_state();
        let enemy_ant = state.entities().iter().find(|e| e.kind == EntityKind::Ant && e.owner == 1).unwrap().id;
        let before = state.entities().get(enemy_ant).unwrap().clone();
        let mut command = cmd(CommandKind::Move, 0, vec![enemy_ant]);
        command.target_x = 1_000;
        command.target_y = 1_000;
        apply_commands(&mut state, &[command]);
        assert_eq!(state.entities().get(enemy_ant).unwrap().pos, before.pos);
        assert!(!state.entities().get(enemy_ant).unwrap().is_moving());
    }

    #[test]
    fn stop_clears_motion() {
        let mut state = new_state();
        let ant_id = state.entities().iter().find(|e| e.kind == EntityKind::Ant && e.owner == 0).unwrap().id;
        let mut mv = cmd(CommandKind::Move, 0, vec![ant_id]);
        mv.target_x = 15_000;
        mv.target_y = 8_000;
        apply_commands(&mut state, &[mv]);
        assert!(state.entities().get(ant_id).unwrap().is_moving());

        apply_commands(&mut state, &[cmd(CommandKind::Stop, 0, vec![ant_id])]);
        let ant = state.entities().get(ant_id).unwrap();
        assert!(!ant.is_moving());
        assert_eq!(ant.state, EntityState::Idle);
        assert!(ant.path.is_empty());
    }

    #[test]
    fn spawn_ant_requires_cooldown_and_jelly() {
        let mut state = new_state();
        let hive_id = state.entities().iter().find(|e| e.kind == EntityKind::Hive && e.owner == 0).unwrap().id;
        let mut command = cmd(CommandKind::SpawnAnt, 0, vec![]);
        command.target_entity_id = Some(hive_id);

        // No jelly yet: fails silently, no cooldown set.
        apply_commands(&mut state, &[command.clone()]);
        assert_eq!(state.entities().get(hive_id).unwrap().cooldown, 0);

        state.credit_jelly(0, 100);
        apply_commands(&mut state, &[command]);
        assert!(state.entities().get(hive_id).unwrap().cooldown > 0);
    }

    #[test]
    fn merge_queen_requires_enough_ants_in_range() {
        let mut state = new_state();
        let hive_id = state.entities().iter().find(|e| e.kind == EntityKind::Hive && e.owner == 0).unwrap().id;
        let ants: Vec<_> = state.entities().iter().filter(|e| e.kind == EntityKind::Ant && e.owner == 0).map(|e| e.id).collect();
        // Starting roster has 3 ants, merge cost is 5: must fail silently.
        let mut command = cmd(CommandKind::MergeQueen, 0, ants);
        command.target_entity_id = Some(hive_id);
        apply_commands(&mut state, &[command]);
        assert_eq!(state.entities().iter().filter(|e| e.kind == EntityKind::Queen).count(), 0);
    }
}
