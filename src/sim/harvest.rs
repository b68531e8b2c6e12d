//! Passes 4 and 7 of the tick pipeline: harvest aggro redirection and
//! jelly extraction/deposit.

use crate::sim::entity::{EntityId, EntityKind, EntityState, MILLI_PER_TILE, NEUTRAL};
use crate::sim::pathfind::find_path;
use crate::sim::rules::bresenham;
use crate::sim::state::SimState;
use crate::sim::units::{milli_of, tile_of};

/// Pass 4. A harvesting, empty-handed, mobile ant switches to a closer
/// corpse that has entered `sight/4` tiles.
pub(crate) fn run_harvest_redirect(state: &mut SimState) {
    let ids: Vec<EntityId> = state
        .entities()
        .iter()
        .filter(|e| e.state == EntityState::Harvesting && e.carrying == 0 && e.is_moving())
        .map(|e| e.id)
        .collect();

    for id in ids {
        let Some((origin, sight, current_target)) = state.entities().get(id).map(|e| (e.pos, e.sight, e.target_entity)) else {
            continue;
        };
        let redirect_radius_milli = (sight / 4) * MILLI_PER_TILE;
        let redirect_sq = i64::from(redirect_radius_milli) * i64::from(redirect_radius_milli);
        let current_dist = current_target.and_then(|t| state.entities().get(t)).map(|t| origin.dist_sq(t.pos));

        let mut closer: Option<(i64, EntityId)> = None;
        for corpse in state.entities().iter().filter(|e| e.kind == EntityKind::Corpse && e.jelly_value > 0) {
            if Some(corpse.id) == current_target {
                continue;
            }
            let dist = origin.dist_sq(corpse.pos);
            if dist > redirect_sq {
                continue;
            }
            if let Some(current) = current_dist {
                if dist >= current {
                    continue;
                }
            }
            if closer.is_none_or(|(best, _)| dist < best) {
                closer = Some((dist, corpse.id));
            }
        }

        if let Some((_, new_target)) = closer {
            let Some(goal_pos) = state.entities().get(new_target).map(|e| e.pos) else { continue };
            let goal_tile = tile_of(goal_pos);
            let path = find_path(state.tilemap(), tile_of(origin), goal_tile);
            if let Some(entity) = state.entities_mut().get_mut(id) {
                entity.target_entity = Some(new_target);
                entity.target = milli_of(goal_tile);
                entity.path = path.into_iter().map(milli_of).collect();
            }
        }
    }
}

/// Pass 7. A stationary harvesting ant draws jelly from its locked corpse,
/// then shuttles full loads (or drained corpses) back to the nearest owned
/// hive.
pub(crate) fn run_harvest(state: &mut SimState) {
    let rules = *state.rules();
    let tick = state.tick();

    let ids: Vec<EntityId> =
        state.entities().iter().filter(|e| e.kind == EntityKind::Ant && e.state == EntityState::Harvesting && !e.is_moving()).map(|e| e.id).collect();

    for id in ids {
        let Some((owner, pos, carrying, target_entity)) =
            state.entities().get(id).map(|e| (e.owner, e.pos, e.carrying, e.target_entity))
        else {
            continue;
        };

        if let Some(corpse_id) = target_entity {
            if let Some(corpse) = state.entities().get(corpse_id) {
                let range_milli = rules.harvest_range * MILLI_PER_TILE;
                let in_range = pos.dist_sq(corpse.pos) <= i64::from(range_milli) * i64::from(range_milli);
                if in_range && corpse.jelly_value > 0 && carrying < rules.capacity {
                    let drawn = bresenham(rules.harvest_rate, tick, rules.tick_rate).min(rules.capacity - carrying).min(corpse.jelly_value);
                    if drawn > 0 {
                        if let Some(corpse) = state.entities_mut().get_mut(corpse_id) {
                            corpse.jelly_value -= drawn;
                        }
                        if let Some(ant) = state.entities_mut().get_mut(id) {
                            ant.carrying += drawn;
                        }
                    }
                }
            }
        }

        let carrying_now = state.entities().get(id).map_or(0, |e| e.carrying);
        let corpse_has_jelly = target_entity.and_then(|c| state.entities().get(c)).is_some_and(|c| c.jelly_value > 0);
        let full = carrying_now >= rules.capacity;

        if full || !corpse_has_jelly {
            route_ant_home(state, id, owner);
        }
    }
}

fn route_ant_home(state: &mut SimState, id: EntityId, owner: i8) {
    let Some(ant_pos) = state.entities().get(id).map(|e| e.pos) else { return };
    let nearest_hive = state
        .entities()
        .iter()
        .filter(|e| e.kind == EntityKind::Hive && e.owner == owner)
        .min_by_key(|e| ant_pos.dist_sq(e.pos))
        .map(|e| (e.id, e.pos));

    let Some((hive_id, hive_pos)) = nearest_hive else { return };
    let rules = *state.rules();
    let range_milli = rules.harvest_range * MILLI_PER_TILE;
    let at_hive = ant_pos.dist_sq(hive_pos) <= i64::from(range_milli) * i64::from(range_milli);

    if at_hive {
        let carrying = state.entities().get(id).map_or(0, |e| e.carrying);
        if carrying > 0 {
            state.credit_jelly(crate::sim::entity::player_index(owner), carrying);
        }
        let corpse_id = state.entities().get(id).and_then(|e| e.target_entity);
        let corpse_still_has_jelly = corpse_id.and_then(|c| state.entities().get(c)).is_some_and(|c| c.jelly_value > 0);

        if let Some(ant) = state.entities_mut().get_mut(id) {
            ant.carrying = 0;
        }
        if corpse_still_has_jelly {
            let corpse_pos = state.entities().get(corpse_id.unwrap_or(hive_id)).map(|e| e.pos);
            if let Some(corpse_pos) = corpse_pos {
                let path = find_path(state.tilemap(), tile_of(ant_pos), tile_of(corpse_pos));
                if let Some(ant) = state.entities_mut().get_mut(id) {
                    ant.target = milli_of(tile_of(corpse_pos));
                    ant.path = path.into_iter().map(milli_of).collect();
                    ant.state = EntityState::Harvesting;
                }
            }
        } else if let Some(ant) = state.entities_mut().get_mut(id) {
            ant.state = EntityState::Idle;
            ant.target_entity = None;
        }
    } else {
        let path = find_path(state.tilemap(), tile_of(ant_pos), tile_of(hive_pos));
        if let Some(ant) = state.entities_mut().get_mut(id) {
            ant.target = milli_of(tile_of(hive_pos));
            ant.path = path.into_iter().map(milli_of).collect();
        }
    }
}

/// Pass 11. Credit every hive's owner with its Bresenham-distributed
/// passive income.
pub(crate) fn run_hive_income(state: &mut SimState) {
    let tick = state.tick();
    let tick_rate = state.rules().tick_rate;
    let rate = state.rules().hive_income_per_sec;
    let credits: Vec<(usize, i32)> = state
        .entities()
        .iter()
        .filter(|e| e.kind == EntityKind::Hive && e.owner != NEUTRAL)
        .map(|e| (crate::sim::entity::player_index(e.owner), bresenham(rate, tick, tick_rate)))
        .collect();
    for (player, amount) in credits {
        state.credit_jelly(player, amount);
    }
}

/// Pass 12. Decrement hive spawn cooldowns; a hive reaching zero spawns an
/// ant on the first walkable surrounding tile, starting the search at a
/// random rotation.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn run_hive_spawn_cooldowns(state: &mut SimState) {
    let hives: Vec<EntityId> = state.entities().iter().filter(|e| e.kind == EntityKind::Hive && e.cooldown > 0).map(|e| e.id).collect();

    const OFFSETS: [(i32, i32); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

    for hive_id in hives {
        let Some(entity) = state.entities_mut().get_mut(hive_id) else { continue };
        entity.cooldown -= 1;
        if entity.cooldown > 0 {
            continue;
        }
        let (owner, pos) = (entity.owner, entity.pos);
        let start_rotation = state.rng_mut().next(8) as usize;
        let tile = tile_of(pos);

        let spawn_tile = (0..8)
            .map(|i| OFFSETS[(start_rotation + i) % 8])
            .map(|(dx, dy)| crate::sim::map::Coord::new(tile.x + dx, tile.y + dy))
            .find(|&candidate| state.tilemap().is_walkable(candidate));

        if let Some(spawn_tile) = spawn_tile {
            state.entities_mut().spawn(|id| crate::sim::entity::Entity::spawn_default(id, EntityKind::Ant, owner, milli_of(spawn_tile)));
        }
    }
}
