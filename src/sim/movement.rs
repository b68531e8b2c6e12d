//! Passes 5 and 6 of the tick pipeline: path following and separation.

use crate::sim::entity::EntityId;
use crate::sim::state::SimState;
use crate::sim::units::tile_of;

/// Pass 5. Move every entity toward its next waypoint (or, lacking a path,
/// straight toward its target) by at most `speed` milli-tiles per tick.
pub(crate) fn run_movement(state: &mut SimState) {
    let ids: Vec<EntityId> = state.entities().ids().collect();
    for id in ids {
        let Some(entity) = state.entities_mut().get_mut(id) else { continue };
        if entity.speed <= 0 {
            continue;
        }

        if let Some(&waypoint) = entity.path.first() {
            step_toward(entity, waypoint);
            if entity.pos == waypoint {
                entity.path.remove(0);
            }
            if entity.path.is_empty() {
                entity.target = entity.pos;
            }
        } else if entity.pos != entity.target {
            let target = entity.target;
            step_toward(entity, target);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn step_toward(entity: &mut crate::sim::entity::Entity, destination: crate::sim::entity::MilliPos) {
    let dx = i64::from(destination.x - entity.pos.x);
    let dy = i64::from(destination.y - entity.pos.y);
    let dist_sq = dx * dx + dy * dy;
    let speed_sq = i64::from(entity.speed) * i64::from(entity.speed);

    if dist_sq <= speed_sq {
        entity.pos = destination;
        return;
    }

    // Integer-only unit vector scaling: no floats, no square root of the
    // actual distance — scale by speed/dist using an integer sqrt of the
    // squared ratio instead.
    let dist = isqrt(dist_sq);
    if dist == 0 {
        entity.pos = destination;
        return;
    }
    let new_x = entity.pos.x + (dx * i64::from(entity.speed) / dist) as i32;
    let new_y = entity.pos.y + (dy * i64::from(entity.speed) / dist) as i32;
    entity.pos = crate::sim::entity::MilliPos::new(new_x, new_y);
}

/// Integer square root via binary search; avoids floating point entirely.
fn isqrt(n: i64) -> i64 {
    if n < 2 {
        return n;
    }
    let mut lo = 0i64;
    let mut hi = n;
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if mid * mid <= n {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Pass 6. Snapshot every mobile entity's position, compute pairwise
/// separation pushes, then apply them — suppressing any push that would
/// enter a non-walkable tile.
pub(crate) fn run_separation(state: &mut SimState) {
    let rules = *state.rules();
    let snapshot: Vec<(EntityId, crate::sim::entity::MilliPos)> =
        state.entities().iter().filter(|e| e.speed > 0).map(|e| (e.id, e.pos)).collect();

    let radius_sq = i64::from(rules.separation_radius) * i64::from(rules.separation_radius);
    let mut pushes: Vec<(EntityId, i64, i64)> = snapshot.iter().map(|&(id, _)| (id, 0, 0)).collect();

    for a in 0..snapshot.len() {
        for b in (a + 1)..snapshot.len() {
            let (id_a, pos_a) = snapshot[a];
            let (id_b, pos_b) = snapshot[b];
            let dx = i64::from(pos_a.x - pos_b.x);
            let dy = i64::from(pos_a.y - pos_b.y);
            let dist_sq = dx * dx + dy * dy;
            if dist_sq > radius_sq {
                continue;
            }

            let (push_dx, push_dy) = if dist_sq == 0 {
                // Exact overlap: higher id pushes +x, the other -x.
                if id_a > id_b { (1, 0) } else { (-1, 0) }
            } else {
                let dist = isqrt(dist_sq).max(1);
                let magnitude = i64::from(rules.separation_force) / dist;
                (dx * magnitude / dist, dy * magnitude / dist)
            };

            pushes[a].1 += push_dx;
            pushes[a].2 += push_dy;
            pushes[b].1 -= push_dx;
            pushes[b].2 -= push_dy;
        }
    }

    for (id, px, py) in pushes {
        if px == 0 && py == 0 {
            continue;
        }
        let Some(entity) = state.entities().get(id) else { continue };
        let candidate = offset_position(entity.pos, px, py);
        let tile = tile_of(candidate);
        if !state.tilemap().is_walkable(tile) {
            continue;
        }
        if let Some(entity) = state.entities_mut().get_mut(id) {
            entity.pos = candidate;
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn offset_position(pos: crate::sim::entity::MilliPos, dx: i64, dy: i64) -> crate::sim::entity::MilliPos {
    let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    crate::sim::entity::MilliPos::new(clamp(i64::from(pos.x) + dx), clamp(i64::from(pos.y) + dy))
}
