//! Debug-only sanity checks for the data-model invariants.
//!
//! These should never trigger in a correctly implemented pipeline. If they
//! do, a tick subsystem broke one of the guarantees other subsystems (and
//! the lockstep hash comparison) rely on.

use crate::sim::entity::{EntityKind, NEUTRAL};
use crate::sim::state::SimState;

/// A single invariant violation, carrying enough context to locate the bug.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Human-readable description of what broke.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check every data-model invariant against the current state.
///
/// Returns every violation found; empty means the state is consistent.
#[must_use]
pub fn check_invariants(state: &SimState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let decay_ticks = state.rules().decay_ticks;

    let mut last_id = None;
    for entity in state.entities().iter() {
        if let Some(last) = last_id {
            if entity.id <= last {
                violations.push(InvariantViolation { message: format!("entity id {} is not greater than previous id {last}", entity.id) });
            }
        }
        last_id = Some(entity.id);

        if entity.kind == EntityKind::Corpse {
            if entity.owner != NEUTRAL {
                violations.push(InvariantViolation { message: format!("corpse {} has non-neutral owner {}", entity.id, entity.owner) });
            }
            if entity.speed != 0 {
                violations.push(InvariantViolation { message: format!("corpse {} has nonzero speed {}", entity.id, entity.speed) });
            }
            if entity.damage != 0 {
                violations.push(InvariantViolation { message: format!("corpse {} has nonzero damage {}", entity.id, entity.damage) });
            }
            if entity.hp < 1 || entity.hp > decay_ticks {
                violations.push(InvariantViolation { message: format!("corpse {} has hp {} outside [1, {decay_ticks}]", entity.id, entity.hp) });
            }
        }
    }

    violations
}

/// Panic if any invariant is violated. Only active in debug builds.
///
/// # Panics
/// Panics with every violation's message joined, if any are found.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &SimState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("simulation invariant violations at tick {}:\n  - {}", state.tick(), messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &SimState) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rules::Rules;

    #[test]
    fn fresh_state_has_no_violations() {
        let state = SimState::new(9, 24, 16, Rules::default()).unwrap();
        assert!(check_invariants(&state).is_empty());
    }

    #[test]
    fn corpse_with_wrong_owner_is_flagged() {
        let mut state = SimState::new(9, 24, 16, Rules::default()).unwrap();
        let decay = state.rules().decay_ticks;
        state.entities_mut().spawn(|id| {
            let mut e = crate::sim::entity::Entity::spawn_default(id, EntityKind::Corpse, 0, crate::sim::entity::MilliPos::new(5000, 5000));
            e.hp = decay;
            e.max_hp = decay;
            e
        });
        let violations = check_invariants(&state);
        assert!(violations.iter().any(|v| v.message.contains("non-neutral owner")));
    }

    #[test]
    fn entity_ids_ascending_has_no_violation() {
        let state = SimState::new(9, 24, 16, Rules::default()).unwrap();
        let ids: Vec<_> = state.entities().ids().collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert!(check_invariants(&state).is_empty());
    }
}
