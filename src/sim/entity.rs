//! Entities and the ordered store that owns them.

use std::collections::HashSet;

/// Stable identifier for an entity, unique and monotonically increasing for
/// the lifetime of a simulation. Never reused once assigned.
pub type EntityId = u32;

/// Player index, or the [`NEUTRAL`] sentinel for wildlife, corpses, and
/// unclaimed landmarks.
pub type PlayerId = i8;

/// Sentinel owner for entities that belong to no player.
pub const NEUTRAL: PlayerId = -1;

/// Convert a player index (`0` or `1`) into an array/slice index. Callers
/// must not pass [`NEUTRAL`].
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn player_index(player: PlayerId) -> usize {
    debug_assert!(player >= 0, "player_index called with NEUTRAL");
    player as usize
}

/// A position or waypoint in milli-tiles (1 tile == 1000 milli-tiles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MilliPos {
    /// X in milli-tiles.
    pub x: i32,
    /// Y in milli-tiles.
    pub y: i32,
}

impl MilliPos {
    /// Construct a position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another position, in milli-tiles squared.
    #[must_use]
    pub fn dist_sq(self, other: MilliPos) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

/// One tile, in milli-tile units.
pub const MILLI_PER_TILE: i32 = 1000;

/// The kind of an entity. Behavior dispatches on this tag rather than on a
/// class hierarchy, so it stays trivially reproducible across peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Worker unit: harvests jelly, can morph into a spitter.
    Ant,
    /// Founds new hives.
    Queen,
    /// Spawns ants, collects passive income.
    Hive,
    /// Neutral landmark a founding queen converts into a hive.
    HiveSite,
    /// Neutral, decaying, holds harvestable jelly.
    Corpse,
    /// Neutral wildlife, passive.
    Aphid,
    /// Neutral wildlife, aggressive melee.
    Beetle,
    /// Neutral wildlife, aggressive melee.
    Mantis,
    /// Ranged combatant, morphed from an ant.
    Spitter,
}

impl EntityKind {
    /// Corpse jelly value this kind leaves behind on death, or `0` if it
    /// leaves no corpse.
    #[must_use]
    pub const fn corpse_value(self) -> i32 {
        match self {
            EntityKind::Ant => 5,
            EntityKind::Spitter => 8,
            EntityKind::Aphid => 10,
            EntityKind::Beetle => 15,
            EntityKind::Mantis => 20,
            EntityKind::Queen | EntityKind::Hive | EntityKind::HiveSite | EntityKind::Corpse => 0,
        }
    }

    /// Whether this kind can ever be the target of an attack.
    #[must_use]
    pub const fn is_attackable(self) -> bool {
        !matches!(self, EntityKind::Corpse | EntityKind::HiveSite)
    }

    /// Baseline stats for a freshly created entity of this kind. Gameplay
    /// balance lives here, alongside [`crate::sim::rules::Rules`] for the
    /// economy-wide constants.
    #[must_use]
    pub const fn base_stats(self) -> BaseStats {
        match self {
            EntityKind::Ant => BaseStats { hp: 20, damage: 0, sight: 5, attack_range: 1, speed: 120 },
            EntityKind::Queen => BaseStats { hp: 30, damage: 0, sight: 4, attack_range: 1, speed: 80 },
            EntityKind::Hive => BaseStats { hp: 150, damage: 0, sight: 6, attack_range: 1, speed: 0 },
            EntityKind::HiveSite => BaseStats { hp: 1, damage: 0, sight: 0, attack_range: 1, speed: 0 },
            EntityKind::Corpse => BaseStats { hp: 1, damage: 0, sight: 0, attack_range: 1, speed: 0 },
            EntityKind::Aphid => BaseStats { hp: 10, damage: 0, sight: 3, attack_range: 1, speed: 60 },
            EntityKind::Beetle => BaseStats { hp: 40, damage: 8, sight: 4, attack_range: 1, speed: 90 },
            EntityKind::Mantis => BaseStats { hp: 25, damage: 14, sight: 6, attack_range: 1, speed: 140 },
            EntityKind::Spitter => BaseStats { hp: 18, damage: 6, sight: 6, attack_range: 4, speed: 100 },
        }
    }
}

/// Baseline stat block returned by [`EntityKind::base_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStats {
    /// Starting and maximum health.
    pub hp: i32,
    /// Damage per second; `0` for non-combatants.
    pub damage: i32,
    /// Vision radius in tiles.
    pub sight: i32,
    /// Attack radius in tiles.
    pub attack_range: i32,
    /// Milli-tiles moved per tick.
    pub speed: i32,
}

/// What an entity is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Not moving, not acting.
    Idle,
    /// Following a path or moving straight toward a target.
    Moving,
    /// Locked onto a combat target.
    Attacking,
    /// Locked onto a corpse to extract jelly.
    Harvesting,
    /// A queen en route to convert a hive site.
    Founding,
}

/// A single mutable simulation entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Stable identifier.
    pub id: EntityId,
    /// Entity kind.
    pub kind: EntityKind,
    /// Owning player, or [`NEUTRAL`].
    pub owner: PlayerId,
    /// Current position, in milli-tiles.
    pub pos: MilliPos,
    /// Destination of current motion; equals `pos` when idle.
    pub target: MilliPos,
    /// Remaining waypoints to traverse, nearest first.
    pub path: Vec<MilliPos>,
    /// Milli-tiles moved per tick. Zero for structures and aphids.
    pub speed: i32,
    /// Current health. For corpses, a decay countdown.
    pub hp: i32,
    /// Maximum health.
    pub max_hp: i32,
    /// Damage per second. Zero for non-combatants.
    pub damage: i32,
    /// Vision radius in tiles.
    pub sight: i32,
    /// Attack radius in tiles.
    pub attack_range: i32,
    /// Current behavioral state.
    pub state: EntityState,
    /// Jelly currently held (ants only).
    pub carrying: i32,
    /// Jelly yielded as a corpse on death; `0` if this kind leaves none.
    pub jelly_value: i32,
    /// Entity this one is locked onto (attack, harvest, or founding target).
    pub target_entity: Option<EntityId>,
    /// Ticks remaining before a hive may spawn again.
    pub cooldown: i32,
}

impl Entity {
    /// Build a freshly spawned entity of `kind` at `pos`, owned by `owner`,
    /// using its baseline stats and no lock-on or cargo.
    #[must_use]
    pub fn spawn_default(id: EntityId, kind: EntityKind, owner: PlayerId, pos: MilliPos) -> Self {
        let stats = kind.base_stats();
        Self {
            id,
            kind,
            owner,
            pos,
            target: pos,
            path: Vec::new(),
            speed: stats.speed,
            hp: stats.hp,
            max_hp: stats.hp,
            damage: stats.damage,
            sight: stats.sight,
            attack_range: stats.attack_range,
            state: EntityState::Idle,
            carrying: 0,
            jelly_value: 0,
            target_entity: None,
            cooldown: 0,
        }
    }

    /// Whether the entity is currently in motion (has somewhere left to go).
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.pos != self.target
    }
}

/// Ordered, id-stable collection of entities.
///
/// Iteration order always equals insertion (id) order; removing an entity
/// leaves a gap in the id sequence rather than reusing it.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
    next_id: EntityId,
}

impl EntityStore {
    /// An empty store with ids starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self { entities: Vec::new(), next_id: 0 }
    }

    /// Next id that will be assigned, exposed for the state hash.
    #[must_use]
    pub const fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Append a new entity, assigning it the next id. Returns the assigned id.
    pub fn spawn(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(build(id));
        id
    }

    /// Look up an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Look up an entity by id, mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Remove every entity whose id is in `ids`, preserving the relative
    /// order of survivors.
    pub fn remove_set(&mut self, ids: &HashSet<EntityId>) {
        self.entities.retain(|e| !ids.contains(&e.id));
    }

    /// Iterate entities in insertion (id) order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Iterate entities mutably in insertion (id) order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Ids currently present, in order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(|e| e.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ant(id: EntityId, owner: PlayerId) -> Entity {
        Entity {
            id,
            kind: EntityKind::Ant,
            owner,
            pos: MilliPos::default(),
            target: MilliPos::default(),
            path: Vec::new(),
            speed: 100,
            hp: 20,
            max_hp: 20,
            damage: 0,
            sight: 5,
            attack_range: 1,
            state: EntityState::Idle,
            carrying: 0,
            jelly_value: 0,
            target_entity: None,
            cooldown: 0,
        }
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut store = EntityStore::new();
        let a = store.spawn(|id| ant(id, 0));
        let b = store.spawn(|id| ant(id, 0));
        assert!(b > a);

        let mut removed = HashSet::new();
        removed.insert(a);
        store.remove_set(&removed);

        let c = store.spawn(|id| ant(id, 0));
        assert!(c > b);
        assert!(store.get(a).is_none());
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut store = EntityStore::new();
        let ids: Vec<_> = (0..5).map(|_| store.spawn(|id| ant(id, 0))).collect();
        let observed: Vec<_> = store.iter().map(|e| e.id).collect();
        assert_eq!(ids, observed);
    }

    #[test]
    fn remove_set_preserves_order_of_survivors() {
        let mut store = EntityStore::new();
        let ids: Vec<_> = (0..6).map(|_| store.spawn(|id| ant(id, 0))).collect();
        let mut removed = HashSet::new();
        removed.insert(ids[1]);
        removed.insert(ids[3]);
        store.remove_set(&removed);

        let survivors: Vec<_> = store.iter().map(|e| e.id).collect();
        assert_eq!(survivors, vec![ids[0], ids[2], ids[4], ids[5]]);
    }

    #[test]
    fn is_moving_matches_position_vs_target() {
        let mut e = ant(0, 0);
        assert!(!e.is_moving());
        e.target = MilliPos::new(1000, 0);
        assert!(e.is_moving());
    }
}
