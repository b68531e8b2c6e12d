//! Canonical state hashing for desync detection.

use sha2::{Digest, Sha256};

use crate::sim::entity::Entity;

/// A 256-bit state digest.
pub type StateDigest = [u8; 32];

/// Hash `tick`, `rng`, and every entity's hashed fields, in that order, into
/// a canonical digest.
///
/// The serialization is fixed-endian (big-endian) and touches only the
/// fields named in the entity hash contract (id, kind, owner, position,
/// target, speed, hp, max_hp, damage, state, carrying, jelly_value) — never
/// path contents, cooldowns, or anything else that two conformant peers
/// could legitimately disagree on mid-tick.
#[must_use]
pub fn hash_state<'a>(tick: u32, rng_state: u32, entities: impl Iterator<Item = &'a Entity>) -> StateDigest {
    let mut hasher = Sha256::new();
    hasher.update(tick.to_be_bytes());
    hasher.update(rng_state.to_be_bytes());

    let entities: Vec<&Entity> = entities.collect();
    hasher.update((entities.len() as u32).to_be_bytes());

    for e in entities {
        hasher.update(e.id.to_be_bytes());
        hasher.update([e.kind as u8]);
        hasher.update(e.owner.to_be_bytes());
        hasher.update(e.pos.x.to_be_bytes());
        hasher.update(e.pos.y.to_be_bytes());
        hasher.update(e.target.x.to_be_bytes());
        hasher.update(e.target.y.to_be_bytes());
        hasher.update(e.speed.to_be_bytes());
        hasher.update(e.hp.to_be_bytes());
        hasher.update(e.max_hp.to_be_bytes());
        hasher.update(e.damage.to_be_bytes());
        hasher.update([e.state as u8]);
        hasher.update(e.carrying.to_be_bytes());
        hasher.update(e.jelly_value.to_be_bytes());
    }

    hasher.finalize().into()
}
