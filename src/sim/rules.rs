//! Tunable gameplay constants, gathered in one place the way the teacher
//! keeps scoring and metering weights in a single config struct rather than
//! scattered literals.

/// All gameplay constants the tick pipeline consults. Constructed once per
/// match and never mutated; every subsystem borrows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Jelly cost to spawn an ant.
    pub spawn_cost: i32,
    /// Ticks a hive must wait between spawns.
    pub spawn_cooldown_ticks: i32,
    /// Ants consumed to produce a queen.
    pub queen_merge_cost: i32,
    /// Tile radius within which ants/ants-to-hive interactions are valid
    /// for merging and morphing.
    pub merge_range: i32,
    /// Jelly cost to morph an ant into a spitter.
    pub morph_cost: i32,
    /// Tile radius within which a harvesting ant can draw jelly from a
    /// corpse.
    pub harvest_range: i32,
    /// Jelly drawn per second from a corpse by one ant.
    pub harvest_rate: i32,
    /// Maximum jelly an ant can carry.
    pub capacity: i32,
    /// Tile radius within which neutral wildlife aggroes onto a player
    /// entity.
    pub aggro_range_tiles: i32,
    /// Milli-tile radius within which mobile entities push each other apart.
    pub separation_radius: i32,
    /// Separation push magnitude numerator (divided by distance).
    pub separation_force: i32,
    /// Ticks a corpse persists before decaying away.
    pub decay_ticks: i32,
    /// Jelly credited to a hive's owner per second, passively.
    pub hive_income_per_sec: i32,
    /// Tile radius within which a founding queen converts a hive site.
    pub found_range: i32,
    /// Simulation ticks per second; also the Bresenham DPS period `T`.
    pub tick_rate: i32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            spawn_cost: 10,
            spawn_cooldown_ticks: 50,
            queen_merge_cost: 5,
            merge_range: 3,
            morph_cost: 15,
            harvest_range: 1,
            harvest_rate: 4,
            capacity: 10,
            aggro_range_tiles: 6,
            separation_radius: 800,
            separation_force: 400,
            decay_ticks: 600,
            hive_income_per_sec: 1,
            found_range: 1,
            tick_rate: 10,
        }
    }
}

/// Parameters governing the lockstep coordinator, independent of gameplay
/// balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockstepConfig {
    /// Ticks between a command's issue and the tick it executes on.
    pub input_delay: u32,
    /// Ticks between published state-hash checks.
    pub hash_interval: u32,
    /// Milliseconds of silence before surfacing a "waiting" indicator.
    pub warn_ms: u64,
    /// Milliseconds of silence before declaring the peer disconnected.
    pub disconnect_ms: u64,
}

impl Default for LockstepConfig {
    fn default() -> Self {
        Self { input_delay: 2, hash_interval: 10, warn_ms: 2_000, disconnect_ms: 10_000 }
    }
}

/// Bresenham-style integer distribution of a per-second rate across the
/// ticks of one second, summing to exactly `rate` every period.
///
/// `damage_this_tick = floor(rate*(t+1)/T) - floor(rate*t/T)` where `t = tick
/// mod T`. Used for both combat DPS and passive hive income so the two share
/// one audited implementation.
#[must_use]
pub fn bresenham(rate: i32, tick: u32, tick_rate: i32) -> i32 {
    if tick_rate <= 0 {
        return 0;
    }
    let t = i64::from(tick % tick_rate.unsigned_abs());
    let rate = i64::from(rate);
    let period = i64::from(tick_rate);
    let upto = |n: i64| (rate * n).div_euclid(period);
    (upto(t + 1) - upto(t)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bresenham_conserves_total_over_one_period() {
        for dps in [0, 1, 3, 7, 10, 23, 100] {
            let sum: i32 = (0..10).map(|t| bresenham(dps, t, 10)).sum();
            assert_eq!(sum, dps, "dps={dps}");
        }
    }

    #[test]
    fn bresenham_is_periodic() {
        for dps in [1, 7, 13] {
            let first: Vec<_> = (0..10).map(|t| bresenham(dps, t, 10)).collect();
            let second: Vec<_> = (10..20).map(|t| bresenham(dps, t, 10)).collect();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn bresenham_never_negative() {
        for dps in 0..50 {
            for t in 0..10 {
                assert!(bresenham(dps, t, 10) >= 0);
            }
        }
    }
}
