//! Conversions between tile coordinates and milli-tile positions.

use crate::sim::entity::{MilliPos, MILLI_PER_TILE};
use crate::sim::map::Coord;

/// The tile containing a milli-tile position (floor division, so negative
/// positions round toward negative infinity rather than toward zero).
#[must_use]
pub fn tile_of(pos: MilliPos) -> Coord {
    Coord::new(pos.x.div_euclid(MILLI_PER_TILE), pos.y.div_euclid(MILLI_PER_TILE))
}

/// The milli-tile position at the origin corner of a tile.
#[must_use]
pub fn milli_of(tile: Coord) -> MilliPos {
    MilliPos::new(tile.x * MILLI_PER_TILE, tile.y * MILLI_PER_TILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_on_tile_boundaries() {
        let tile = Coord::new(4, -2);
        assert_eq!(tile_of(milli_of(tile)), tile);
    }

    #[test]
    fn floors_toward_negative_infinity() {
        let pos = MilliPos::new(-1, -1);
        assert_eq!(tile_of(pos), Coord::new(-1, -1));
    }
}
