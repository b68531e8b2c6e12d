//! Pass 2 of the tick pipeline: neutral aggressive wildlife AI.

use crate::sim::entity::{EntityId, EntityKind, EntityState, NEUTRAL};
use crate::sim::pathfind::find_path;
use crate::sim::state::SimState;
use crate::sim::units::{milli_of, tile_of};

/// For each idle, non-moving, non-attacking beetle or mantis, scan for the
/// nearest player-owned entity within aggro range and path to it.
pub(crate) fn run_wildlife_ai(state: &mut SimState) {
    let rules = *state.rules();
    let aggro_sq_tiles = i64::from(rules.aggro_range_tiles) * i64::from(rules.aggro_range_tiles);

    let candidates: Vec<EntityId> = state
        .entities()
        .iter()
        .filter(|e| {
            e.owner == NEUTRAL
                && matches!(e.kind, EntityKind::Beetle | EntityKind::Mantis)
                && e.state != EntityState::Attacking
                && !e.is_moving()
        })
        .map(|e| e.id)
        .collect();

    for id in candidates {
        let Some(origin) = state.entities().get(id).map(|e| e.pos) else { continue };
        let origin_tile = tile_of(origin);

        let mut nearest: Option<(i64, crate::sim::map::Coord)> = None;
        for target in state.entities().iter() {
            if target.owner != 0 && target.owner != 1 {
                continue;
            }
            let dist_sq = origin_tile.dist_sq(tile_of(target.pos));
            if dist_sq > aggro_sq_tiles {
                continue;
            }
            if nearest.is_none_or(|(best, _)| dist_sq < best) {
                nearest = Some((dist_sq, tile_of(target.pos)));
            }
        }

        let Some((_, goal_tile)) = nearest else { continue };
        let path = find_path(state.tilemap(), origin_tile, goal_tile);
        if let Some(entity) = state.entities_mut().get_mut(id) {
            entity.target = milli_of(goal_tile);
            entity.path = path.into_iter().map(milli_of).collect();
            entity.state = EntityState::Moving;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Entity, MilliPos};
    use crate::sim::rules::Rules;
    use crate::sim::state::SimState;

    #[test]
    fn beetle_aggroes_onto_nearby_player_entity() {
        let mut state = SimState::new(2, 24, 16, Rules::default()).unwrap();
        let player_ant = state.entities().iter().find(|e| e.kind == EntityKind::Ant && e.owner == 0).unwrap();
        let near_pos = MilliPos::new(player_ant.pos.x + 1000, player_ant.pos.y);
        let beetle = state.entities_mut().spawn(|id| Entity::spawn_default(id, EntityKind::Beetle, NEUTRAL, near_pos));

        run_wildlife_ai(&mut state);
        let beetle = state.entities().get(beetle).unwrap();
        assert_eq!(beetle.state, EntityState::Moving);
    }

    #[test]
    fn beetle_ignores_far_away_targets() {
        let mut state = SimState::new(2, 60, 40, Rules::default()).unwrap();
        let beetle = state.entities_mut().spawn(|id| Entity::spawn_default(id, EntityKind::Beetle, NEUTRAL, MilliPos::new(1000, 1000)));
        run_wildlife_ai(&mut state);
        let beetle = state.entities().get(beetle).unwrap();
        assert_eq!(beetle.state, EntityState::Idle);
    }
}
