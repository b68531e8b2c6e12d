//! Passes 3 and 8 of the tick pipeline: combat aggro redirection and the
//! two-phase damage resolution.

use std::collections::HashMap;

use crate::sim::entity::{Entity, EntityId, EntityKind, EntityState, MilliPos, MILLI_PER_TILE};
use crate::sim::pathfind::find_path;
use crate::sim::rules::bresenham;
use crate::sim::state::SimState;
use crate::sim::units::{milli_of, tile_of};

fn is_enemy(attacker_owner: i8, candidate: &Entity) -> bool {
    if !candidate.kind.is_attackable() {
        return false;
    }
    if attacker_owner == candidate.owner {
        return false;
    }
    if attacker_owner < 0 && candidate.owner < 0 {
        return false;
    }
    true
}

/// Pass 3. An attacking, mobile entity re-targets onto a closer enemy that
/// has entered `sight/4` tiles, even mid-approach.
pub(crate) fn run_aggro_redirect(state: &mut SimState) {
    let ids: Vec<EntityId> = state
        .entities()
        .iter()
        .filter(|e| e.target_entity.is_some() && e.damage > 0 && e.is_moving())
        .map(|e| e.id)
        .collect();

    for id in ids {
        let Some((owner, origin, sight, current_target)) =
            state.entities().get(id).map(|e| (e.owner, e.pos, e.sight, e.target_entity))
        else {
            continue;
        };
        let Some(current_target) = current_target else { continue };
        let Some(current_dist) = state.entities().get(current_target).map(|t| origin.dist_sq(t.pos)) else { continue };

        let redirect_radius_milli = (sight / 4) * MILLI_PER_TILE;
        let redirect_sq = i64::from(redirect_radius_milli) * i64::from(redirect_radius_milli);

        let mut closer: Option<(i64, EntityId, MilliPos)> = None;
        for candidate in state.entities().iter() {
            if candidate.id == current_target || !is_enemy(owner, candidate) {
                continue;
            }
            let dist = origin.dist_sq(candidate.pos);
            if dist > redirect_sq || dist >= current_dist {
                continue;
            }
            if closer.is_none_or(|(best, _, _)| dist < best) {
                closer = Some((dist, candidate.id, candidate.pos));
            }
        }

        if let Some((_, new_target, new_pos)) = closer {
            let start_tile = tile_of(origin);
            let goal_tile = tile_of(new_pos);
            let path = find_path(state.tilemap(), start_tile, goal_tile);
            if let Some(entity) = state.entities_mut().get_mut(id) {
                entity.target_entity = Some(new_target);
                entity.target = milli_of(goal_tile);
                entity.path = path.into_iter().map(milli_of).collect();
            }
        }
    }
}

/// Pass 8. Each combatant selects its nearest in-range enemy (tie-break
/// smaller id), then all recorded damage is applied in a second sweep.
pub(crate) fn run_combat(state: &mut SimState) {
    let tick = state.tick();
    let tick_rate = state.rules().tick_rate;

    let attackers: Vec<EntityId> = state.entities().iter().filter(|e| e.damage > 0).map(|e| e.id).collect();

    let mut damages: HashMap<EntityId, i32> = HashMap::new();
    let mut reverts: Vec<EntityId> = Vec::new();
    let mut attacking: Vec<(EntityId, EntityId)> = Vec::new();

    for id in attackers {
        let Some((owner, pos, attack_range, damage, was_attacking)) =
            state.entities().get(id).map(|e| (e.owner, e.pos, e.attack_range, e.damage, e.state == EntityState::Attacking))
        else {
            continue;
        };
        let range_sq = i64::from(attack_range * MILLI_PER_TILE) * i64::from(attack_range * MILLI_PER_TILE);

        let mut best: Option<(i64, EntityId)> = None;
        for candidate in state.entities().iter() {
            if candidate.id == id || !is_enemy(owner, candidate) {
                continue;
            }
            let dist = pos.dist_sq(candidate.pos);
            if dist > range_sq {
                continue;
            }
            let key = (dist, candidate.id);
            if best.is_none_or(|best_key| key < best_key) {
                best = Some(key);
            }
        }

        match best {
            Some((_, target)) => {
                let tick_damage = bresenham(damage, tick, tick_rate);
                *damages.entry(target).or_insert(0) += tick_damage;
                attacking.push((id, target));
            }
            None => {
                if was_attacking {
                    reverts.push(id);
                }
            }
        }
    }

    for (id, target) in attacking {
        if let Some(entity) = state.entities_mut().get_mut(id) {
            entity.target_entity = Some(target);
            entity.state = EntityState::Attacking;
        }
    }
    for id in reverts {
        if let Some(entity) = state.entities_mut().get_mut(id) {
            entity.state = EntityState::Idle;
            entity.target_entity = None;
        }
    }
    for (target, amount) in damages {
        if let Some(entity) = state.entities_mut().get_mut(target) {
            entity.hp -= amount;
        }
    }
}

/// Pass 9. Remove dead entities (excluding corpses and sites) and leave a
/// corpse behind for every kind with a positive corpse value.
pub(crate) fn run_deaths(state: &mut SimState) {
    let dead: Vec<(EntityId, EntityKind, MilliPos)> = state
        .entities()
        .iter()
        .filter(|e| e.hp <= 0 && !matches!(e.kind, EntityKind::Corpse | EntityKind::HiveSite))
        .map(|e| (e.id, e.kind, e.pos))
        .collect();

    if dead.is_empty() {
        return;
    }

    let mut removed = std::collections::HashSet::new();
    for &(id, _, _) in &dead {
        removed.insert(id);
    }
    state.entities_mut().remove_set(&removed);

    let decay_ticks = state.rules().decay_ticks;
    for (_, kind, pos) in dead {
        let value = kind.corpse_value();
        if value <= 0 {
            continue;
        }
        state.entities_mut().spawn(|id| {
            let mut corpse = Entity::spawn_default(id, EntityKind::Corpse, crate::sim::entity::NEUTRAL, pos);
            corpse.hp = decay_ticks;
            corpse.max_hp = decay_ticks;
            corpse.jelly_value = value;
            corpse
        });
    }
}

/// Pass 10. Decrement every corpse's decay countdown; remove expired ones.
pub(crate) fn run_corpse_decay(state: &mut SimState) {
    let mut expired = std::collections::HashSet::new();
    for entity in state.entities_mut().iter_mut() {
        if entity.kind == EntityKind::Corpse {
            entity.hp -= 1;
            if entity.hp <= 0 {
                expired.insert(entity.id);
            }
        }
    }
    state.entities_mut().remove_set(&expired);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::NEUTRAL;
    use crate::sim::rules::Rules;
    use crate::sim::state::SimState;

    #[test]
    fn nearest_enemy_in_range_takes_bresenham_damage() {
        let mut state = SimState::new(4, 24, 16, Rules::default()).unwrap();
        let attacker = state.entities_mut().spawn(|id| {
            let mut e = Entity::spawn_default(id, EntityKind::Spitter, 0, MilliPos::new(10_000, 10_000));
            e.damage = 10;
            e.attack_range = 4;
            e
        });
        let target = state.entities_mut().spawn(|id| Entity::spawn_default(id, EntityKind::Aphid, NEUTRAL, MilliPos::new(11_000, 10_000)));

        run_combat(&mut state);
        let target_after = state.entities().get(target).unwrap();
        assert!(target_after.hp < target_after.max_hp);
        assert_eq!(state.entities().get(attacker).unwrap().state, EntityState::Attacking);
    }

    #[test]
    fn out_of_range_enemy_takes_no_damage() {
        let mut state = SimState::new(4, 40, 24, Rules::default()).unwrap();
        state.entities_mut().spawn(|id| {
            let mut e = Entity::spawn_default(id, EntityKind::Spitter, 0, MilliPos::new(5_000, 5_000));
            e.damage = 10;
            e.attack_range = 1;
            e
        });
        let target = state.entities_mut().spawn(|id| Entity::spawn_default(id, EntityKind::Aphid, NEUTRAL, MilliPos::new(20_000, 20_000)));
        run_combat(&mut state);
        let target_after = state.entities().get(target).unwrap();
        assert_eq!(target_after.hp, target_after.max_hp);
    }

    #[test]
    fn death_leaves_a_corpse_with_decay_ticks() {
        let mut state = SimState::new(4, 24, 16, Rules::default()).unwrap();
        let rules = *state.rules();
        let victim = state.entities_mut().spawn(|id| {
            let mut e = Entity::spawn_default(id, EntityKind::Aphid, NEUTRAL, MilliPos::new(10_000, 10_000));
            e.hp = 0;
            e
        });
        run_deaths(&mut state);
        assert!(state.entities().get(victim).is_none());
        let corpse = state.entities().iter().find(|e| e.kind == EntityKind::Corpse).unwrap();
        assert_eq!(corpse.hp, rules.decay_ticks);
        assert_eq!(corpse.jelly_value, EntityKind::Aphid.corpse_value());
    }

    #[test]
    fn fresh_corpse_survives_its_first_decay_tick() {
        // Decay (pass 10) runs after death (pass 9): a corpse created this
        // tick must not also lose decay progress on the same tick.
        let mut state = SimState::new(4, 24, 16, Rules::default()).unwrap();
        state.entities_mut().spawn(|id| {
            let mut e = Entity::spawn_default(id, EntityKind::Aphid, NEUTRAL, MilliPos::new(10_000, 10_000));
            e.hp = 0;
            e
        });
        run_deaths(&mut state);
        let corpse_id = state.entities().iter().find(|e| e.kind == EntityKind::Corpse).unwrap().id;
        let full = state.entities().get(corpse_id).unwrap().hp;
        assert!(full > 0);
    }
}
