//! The single owning value for a match: tilemap, entities, RNG, visibility,
//! and outcome. Nothing in the simulation lives outside this struct.

use crate::sim::entity::{Entity, EntityKind, EntityStore, NEUTRAL};
use crate::sim::hash::{hash_state, StateDigest};
use crate::sim::map::{self, Coord, MapGenError, TileGrid};
use crate::sim::rng::Lcg;
use crate::sim::rules::Rules;
use crate::sim::units::milli_of;
use crate::sim::visibility::VisibilityGrid;

/// Ants each player starts with, placed adjacent to their starting hive.
const STARTING_ANTS: i32 = 3;

/// The full state of one simulation instance.
#[derive(Debug, Clone)]
pub struct SimState {
    tick: u32,
    rng: Lcg,
    tilemap: TileGrid,
    entities: EntityStore,
    visibility: [VisibilityGrid; 2],
    player_jelly: [i32; 2],
    game_over: bool,
    winner: Option<i8>,
    rules: Rules,
}

impl SimState {
    /// Build a fresh match: generate the map from `seed`, then place each
    /// player's starting hive and ants and the two neutral hive sites.
    ///
    /// # Errors
    /// Propagates [`MapGenError`] for degenerate dimensions.
    pub fn new(seed: u32, width: i32, height: i32, rules: Rules) -> Result<Self, MapGenError> {
        let generated = map::generate(seed, width, height)?;
        let mut entities = EntityStore::new();

        for (player, &start) in generated.player_starts.iter().enumerate() {
            #[allow(clippy::cast_possible_wrap)]
            let owner = player as i8;
            entities.spawn(|id| Entity::spawn_default(id, EntityKind::Hive, owner, milli_of(start)));
            for i in 0..STARTING_ANTS {
                let offset = Coord::new(start.x + 1 + i, start.y);
                entities.spawn(|id| Entity::spawn_default(id, EntityKind::Ant, owner, milli_of(offset)));
            }
        }
        for &site in &generated.hive_sites {
            entities.spawn(|id| Entity::spawn_default(id, EntityKind::HiveSite, NEUTRAL, milli_of(site)));
        }

        let mut state = Self {
            tick: 0,
            rng: Lcg::new(seed),
            tilemap: generated.grid,
            entities,
            visibility: [VisibilityGrid::new(width, height), VisibilityGrid::new(width, height)],
            player_jelly: [0, 0],
            game_over: false,
            winner: None,
            rules,
        };
        state.refresh_visibility();
        Ok(state)
    }

    /// Build a match on a hand-authored tilemap with no entities and an
    /// unseeded RNG fixed at `seed`. Scenario tests and map-editor tooling
    /// use this to exercise specific terrain layouts that procedural
    /// generation wouldn't reliably reproduce; callers populate entities
    /// via [`SimState::entities_mut`].
    #[must_use]
    pub fn from_tilemap(seed: u32, tilemap: TileGrid, rules: Rules) -> Self {
        let width = tilemap.width();
        let height = tilemap.height();
        let mut state = Self {
            tick: 0,
            rng: Lcg::new(seed),
            tilemap,
            entities: EntityStore::new(),
            visibility: [VisibilityGrid::new(width, height), VisibilityGrid::new(width, height)],
            player_jelly: [0, 0],
            game_over: false,
            winner: None,
            rules,
        };
        state.refresh_visibility();
        state
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> u32 {
        self.tick
    }

    /// Advance the tick counter. Called once, at the end of the pipeline.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// The immutable tile grid.
    #[must_use]
    pub const fn tilemap(&self) -> &TileGrid {
        &self.tilemap
    }

    /// The entity store.
    #[must_use]
    pub const fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// The entity store, mutably.
    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    /// The PRNG.
    pub fn rng_mut(&mut self) -> &mut Lcg {
        &mut self.rng
    }

    /// Gameplay constants for this match.
    #[must_use]
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Jelly held by `player`.
    #[must_use]
    pub fn jelly(&self, player: usize) -> i32 {
        self.player_jelly[player]
    }

    /// Credit `amount` jelly to `player`.
    pub fn credit_jelly(&mut self, player: usize, amount: i32) {
        self.player_jelly[player] += amount;
    }

    /// Debit `amount` jelly from `player`. Saturates at zero; callers must
    /// check affordability before calling.
    pub fn debit_jelly(&mut self, player: usize, amount: i32) {
        self.player_jelly[player] = (self.player_jelly[player] - amount).max(0);
    }

    /// One player's fog-of-war grid.
    #[must_use]
    pub const fn visibility(&self, player: usize) -> &VisibilityGrid {
        &self.visibility[player]
    }

    /// Whether the match has concluded.
    #[must_use]
    pub const fn game_over(&self) -> bool {
        self.game_over
    }

    /// The winner, if the match has concluded. `Some(NEUTRAL)` means both
    /// players were eliminated simultaneously.
    #[must_use]
    pub const fn winner(&self) -> Option<i8> {
        self.winner
    }

    /// Evaluate the win condition: a player with zero hives is eliminated.
    /// Called once per tick, after deaths and founding are resolved.
    pub fn check_win(&mut self) {
        if self.game_over {
            return;
        }
        let mut alive = [false, false];
        for e in self.entities.iter() {
            if e.kind == EntityKind::Hive {
                if e.owner == 0 {
                    alive[0] = true;
                } else if e.owner == 1 {
                    alive[1] = true;
                }
            }
        }
        match alive {
            [true, true] => {}
            [false, false] => {
                self.game_over = true;
                self.winner = Some(NEUTRAL);
            }
            [true, false] => {
                self.game_over = true;
                self.winner = Some(0);
            }
            [false, true] => {
                self.game_over = true;
                self.winner = Some(1);
            }
        }
    }

    /// Downgrade visible tiles to fog, then reveal around every owned
    /// entity. Run once per tick, and once at construction.
    pub fn refresh_visibility(&mut self) {
        for grid in &mut self.visibility {
            grid.downgrade_visible_to_fog();
        }
        for e in self.entities.iter() {
            if e.sight <= 0 {
                continue;
            }
            let owner = match e.owner {
                0 => 0usize,
                1 => 1usize,
                _ => continue,
            };
            let tile = crate::sim::units::tile_of(e.pos);
            self.visibility[owner].reveal(tile.x, tile.y, e.sight);
        }
    }

    /// Canonical hash of the current state, for desync detection.
    #[must_use]
    pub fn state_hash(&self) -> StateDigest {
        hash_state(self.tick, self.rng.state(), self.entities.iter())
    }
}
