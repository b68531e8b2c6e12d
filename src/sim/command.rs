//! Player commands and their canonical tick-execution order.

use crate::sim::entity::{EntityId, PlayerId};

/// The kind of action a command requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandKind {
    /// Move the targeted entities toward a tile.
    Move,
    /// Halt the targeted entities in place.
    Stop,
    /// Direct ants onto a corpse (or the nearest one reachable).
    Harvest,
    /// Spawn an ant from an owned hive.
    SpawnAnt,
    /// Consume ants near a hive to produce a queen.
    MergeQueen,
    /// Send a queen to convert a hive site.
    FoundHive,
    /// Lock an entity onto a combat target.
    Attack,
    /// Consume an ant near a hive to produce a spitter.
    MorphSpitter,
}

/// An immutable player command, tagged with the tick it takes effect on.
///
/// Two commands compare equal iff every field matches; this is exactly the
/// equality the wire layer uses to deduplicate redundant transmissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// What to do.
    pub kind: CommandKind,
    /// Issuing player.
    pub player: PlayerId,
    /// Tick this command executes on.
    pub tick: u32,
    /// Entities this command addresses, sorted ascending.
    pub entity_ids: Vec<EntityId>,
    /// Destination X, in milli-tiles, for motion-setting commands.
    pub target_x: i32,
    /// Destination Y, in milli-tiles, for motion-setting commands.
    pub target_y: i32,
    /// Entity this command locks onto, if any.
    pub target_entity_id: Option<EntityId>,
}

impl Command {
    /// The key used to sort commands for tick execution: `(player, kind,
    /// tick)` ascending. Both peers must sort identically, so this key must
    /// never depend on anything but the command's own fields.
    #[must_use]
    pub fn sort_key(&self) -> (PlayerId, CommandKind, u32) {
        (self.player, self.kind, self.tick)
    }
}

/// Sort `commands` into canonical tick-execution order, in place.
///
/// The sort is stable, so commands with an identical sort key keep their
/// relative submission order — this is deliberate: it is the only remaining
/// degree of freedom once `(player, kind, tick)` ties, and both peers must
/// resolve it the same way, which a stable sort over an already-merged,
/// identically-ordered input guarantees.
pub fn sort_canonical(commands: &mut [Command]) {
    commands.sort_by_key(Command::sort_key);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(kind: CommandKind, player: PlayerId, tick: u32) -> Command {
        Command { kind, player, tick, entity_ids: Vec::new(), target_x: 0, target_y: 0, target_entity_id: None }
    }

    #[test]
    fn sort_is_total_and_order_independent_of_insertion() {
        let mut a = vec![
            cmd(CommandKind::Attack, 1, 5),
            cmd(CommandKind::Move, 0, 9),
            cmd(CommandKind::Move, 0, 1),
            cmd(CommandKind::Stop, 0, 1),
        ];
        let mut b = vec![a[2].clone(), a[0].clone(), a[3].clone(), a[1].clone()];

        sort_canonical(&mut a);
        sort_canonical(&mut b);
        assert_eq!(a, b);

        let keys: Vec<_> = a.iter().map(Command::sort_key).collect();
        let mut sorted_keys = keys.clone();
        sorted_keys.sort();
        assert_eq!(keys, sorted_keys);
    }

    #[test]
    fn equality_requires_every_field() {
        let a = cmd(CommandKind::Move, 0, 1);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.target_x = 1;
        assert_ne!(a, b);
    }

    #[test]
    fn kind_ordering_matches_declaration_order() {
        assert!(CommandKind::Move < CommandKind::Stop);
        assert!(CommandKind::Stop < CommandKind::Harvest);
        assert!(CommandKind::MorphSpitter > CommandKind::Attack);
    }
}
