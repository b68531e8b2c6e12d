//! Pass 13 of the tick pipeline: a queen that has arrived at her hive site
//! converts it into a new owned hive.

use crate::sim::entity::{Entity, EntityId, EntityKind, EntityState, MILLI_PER_TILE};
use crate::sim::state::SimState;

pub(crate) fn run_founding(state: &mut SimState) {
    let rules = *state.rules();
    let range_milli = rules.found_range * MILLI_PER_TILE;
    let range_sq = i64::from(range_milli) * i64::from(range_milli);

    let foundings: Vec<(EntityId, EntityId, i8, crate::sim::entity::MilliPos)> = state
        .entities()
        .iter()
        .filter(|q| q.state == EntityState::Founding)
        .filter_map(|q| {
            let site_id = q.target_entity?;
            let site = state.entities().get(site_id)?;
            if site.kind != EntityKind::HiveSite || q.pos.dist_sq(site.pos) > range_sq {
                return None;
            }
            Some((q.id, site_id, q.owner, site.pos))
        })
        .collect();

    if foundings.is_empty() {
        return;
    }

    let mut removed = std::collections::HashSet::new();
    for &(queen_id, site_id, _, _) in &foundings {
        removed.insert(queen_id);
        removed.insert(site_id);
    }
    state.entities_mut().remove_set(&removed);

    for (_, _, owner, site_pos) in foundings {
        state.entities_mut().spawn(|id| Entity::spawn_default(id, EntityKind::Hive, owner, site_pos));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::MilliPos;
    use crate::sim::rules::Rules;
    use crate::sim::state::SimState;

    #[test]
    fn queen_in_range_of_site_founds_a_hive() {
        let mut state = SimState::new(11, 24, 16, Rules::default()).unwrap();
        let site = state.entities().iter().find(|e| e.kind == EntityKind::HiveSite).unwrap();
        let site_id = site.id;
        let site_pos = site.pos;
        let queen = state.entities_mut().spawn(|id| {
            let mut e = Entity::spawn_default(id, EntityKind::Queen, 0, site_pos);
            e.state = EntityState::Founding;
            e.target_entity = Some(site_id);
            e
        });

        run_founding(&mut state);
        assert!(state.entities().get(queen).is_none());
        assert!(state.entities().get(site_id).is_none());
        assert!(state.entities().iter().any(|e| e.kind == EntityKind::Hive && e.owner == 0 && e.pos == site_pos));
    }

    #[test]
    fn queen_out_of_range_does_nothing() {
        let mut state = SimState::new(11, 24, 16, Rules::default()).unwrap();
        let site = state.entities().iter().find(|e| e.kind == EntityKind::HiveSite).unwrap();
        let site_id = site.id;
        let far_pos = MilliPos::new(site.pos.x + 50_000, site.pos.y);
        let queen = state.entities_mut().spawn(|id| {
            let mut e = Entity::spawn_default(id, EntityKind::Queen, 0, far_pos);
            e.state = EntityState::Founding;
            e.target_entity = Some(site_id);
            e
        });
        run_founding(&mut state);
        assert!(state.entities().get(queen).is_some());
        assert!(state.entities().get(site_id).is_some());
    }
}
