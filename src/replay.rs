//! Game recording and replay.
//!
//! Because the simulation is deterministic, a recording needs only the
//! seed, the map dimensions, the rule set, and the canonical per-tick
//! command stream. To view tick N, the engine re-runs the pipeline from
//! tick 0 — there are no state deltas to store.

use crate::sim::command::Command;
use crate::sim::map::MapGenError;
use crate::sim::rules::Rules;
use crate::sim::state::SimState;
use std::fs::File;
use std::io::{self, Read as IoRead, Write as IoWrite};
use std::path::Path;

/// A complete recording of one match: everything needed to reproduce
/// it tick-for-tick on any machine.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Map-generation seed.
    pub seed: u32,
    /// Map width in tiles.
    pub width: i32,
    /// Map height in tiles.
    pub height: i32,
    /// Gameplay rule constants in effect for the match.
    pub rules: Rules,
    /// Canonically-sorted commands for each tick that had any, keyed
    /// by tick. A tick absent from this map had zero commands.
    pub ticks: Vec<(u32, Vec<Command>)>,
}

impl Recording {
    /// Start an empty recording for a match about to begin.
    #[must_use]
    pub fn new(seed: u32, width: i32, height: i32, rules: Rules) -> Self {
        Self { seed, width, height, rules, ticks: Vec::new() }
    }

    /// Append one tick's canonical commands. Call this even for ticks
    /// with no commands so `goto_tick` can distinguish "not yet
    /// recorded" from "recorded as empty" — callers that only append
    /// non-empty ticks still replay correctly, since `step_forward`
    /// treats any tick absent from `ticks` as empty.
    pub fn record_tick(&mut self, tick: u32, commands: Vec<Command>) {
        self.ticks.push((tick, commands));
    }

    /// Commands recorded for `tick`, or an empty slice if none were.
    #[must_use]
    pub fn commands_at(&self, tick: u32) -> &[Command] {
        self.ticks.iter().find(|(t, _)| *t == tick).map_or(&[], |(_, c)| c.as_slice())
    }

    /// Save the recording to a file.
    ///
    /// Format: big-endian fixed-width fields followed by per-tick
    /// command records, mirroring the wire encoding in
    /// [`crate::net::codec`] but framed for a file rather than a
    /// datagram.
    ///
    /// # Errors
    /// Returns an error if file I/O fails.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.seed.to_be_bytes())?;
        file.write_all(&self.width.to_be_bytes())?;
        file.write_all(&self.height.to_be_bytes())?;
        write_rules(&mut file, &self.rules)?;

        #[allow(clippy::cast_possible_truncation)]
        let n_ticks = self.ticks.len() as u32;
        file.write_all(&n_ticks.to_be_bytes())?;

        for (tick, commands) in &self.ticks {
            file.write_all(&tick.to_be_bytes())?;
            let frame = crate::net::codec::encode(&crate::net::codec::Message::Commands { tick: *tick, commands: commands.clone() });
            // Skip the 3-byte message header; the file format keeps its own tick field above
            // instead of relying on the wire frame's.
            #[allow(clippy::cast_possible_truncation)]
            let len = (frame.len() - 3) as u32;
            file.write_all(&len.to_be_bytes())?;
            file.write_all(&frame[3..])?;
        }
        Ok(())
    }

    /// Load a recording from a file.
    ///
    /// # Errors
    /// Returns an error if file I/O fails or the format is invalid.
    pub fn load(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let seed = read_u32(&mut file)?;
        let width = read_i32(&mut file)?;
        let height = read_i32(&mut file)?;
        let rules = read_rules(&mut file)?;

        let n_ticks = read_u32(&mut file)?;
        let mut ticks = Vec::with_capacity(n_ticks as usize);
        for _ in 0..n_ticks {
            let tick = read_u32(&mut file)?;
            let len = read_u32(&mut file)?;
            let mut payload = vec![0u8; len as usize + 3];
            payload[0] = 2; // Commands message kind byte, reconstructed for the shared decoder.
            #[allow(clippy::cast_possible_truncation)]
            let len_bytes = (len as u16).to_be_bytes();
            payload[1] = len_bytes[0];
            payload[2] = len_bytes[1];
            file.read_exact(&mut payload[3..])?;
            let commands = match crate::net::codec::decode(&payload) {
                Ok(crate::net::codec::Message::Commands { commands, .. }) => commands,
                _ => return Err(io::Error::new(io::ErrorKind::InvalidData, "malformed recording tick payload")),
            };
            ticks.push((tick, commands));
        }

        Ok(Self { seed, width, height, rules, ticks })
    }
}

fn write_rules(file: &mut File, rules: &Rules) -> io::Result<()> {
    file.write_all(&rules.spawn_cost.to_be_bytes())?;
    file.write_all(&rules.spawn_cooldown_ticks.to_be_bytes())?;
    file.write_all(&rules.queen_merge_cost.to_be_bytes())?;
    file.write_all(&rules.merge_range.to_be_bytes())?;
    file.write_all(&rules.morph_cost.to_be_bytes())?;
    file.write_all(&rules.harvest_range.to_be_bytes())?;
    file.write_all(&rules.harvest_rate.to_be_bytes())?;
    file.write_all(&rules.capacity.to_be_bytes())?;
    file.write_all(&rules.aggro_range_tiles.to_be_bytes())?;
    file.write_all(&rules.separation_radius.to_be_bytes())?;
    file.write_all(&rules.separation_force.to_be_bytes())?;
    file.write_all(&rules.decay_ticks.to_be_bytes())?;
    file.write_all(&rules.hive_income_per_sec.to_be_bytes())?;
    file.write_all(&rules.found_range.to_be_bytes())?;
    file.write_all(&rules.tick_rate.to_be_bytes())
}

fn read_rules(file: &mut File) -> io::Result<Rules> {
    Ok(Rules {
        spawn_cost: read_i32(file)?,
        spawn_cooldown_ticks: read_i32(file)?,
        queen_merge_cost: read_i32(file)?,
        merge_range: read_i32(file)?,
        morph_cost: read_i32(file)?,
        harvest_range: read_i32(file)?,
        harvest_rate: read_i32(file)?,
        capacity: read_i32(file)?,
        aggro_range_tiles: read_i32(file)?,
        separation_radius: read_i32(file)?,
        separation_force: read_i32(file)?,
        decay_ticks: read_i32(file)?,
        hive_income_per_sec: read_i32(file)?,
        found_range: read_i32(file)?,
        tick_rate: read_i32(file)?,
    })
}

fn read_u32(file: &mut File) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    file.read_exact(&mut bytes)?;
    Ok(u32::from_be_bytes(bytes))
}

fn read_i32(file: &mut File) -> io::Result<i32> {
    read_u32(file).map(|v| v as i32)
}

/// Error conditions specific to stepping through a replay (as opposed
/// to the underlying file I/O, which surfaces as [`io::Error`]).
#[derive(Debug, Clone, Copy)]
pub enum ReplayError {
    /// Map generation for the recorded seed/dimensions failed.
    MapGeneration(MapGenError),
    /// The requested tick is beyond the end of the recording.
    TickOutOfBounds {
        /// Requested tick.
        requested: u32,
        /// Last tick actually recorded, inclusive.
        max_tick: u32,
    },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::MapGeneration(e) => write!(f, "map generation failed: {e}"),
            ReplayError::TickOutOfBounds { requested, max_tick } => {
                write!(f, "tick {requested} out of bounds (max recorded tick: {max_tick})")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

/// Steps a [`Recording`] forward deterministically. Because replay is
/// just re-execution, seeking backward means rebuilding from tick 0.
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    state: SimState,
    current_tick: u32,
}

impl ReplayEngine {
    /// Build a fresh engine at tick 0.
    ///
    /// # Errors
    /// Returns [`ReplayError::MapGeneration`] if the recorded seed and
    /// dimensions fail to generate a map.
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        let state = SimState::new(recording.seed, recording.width, recording.height, recording.rules).map_err(ReplayError::MapGeneration)?;
        Ok(Self { recording, state, current_tick: 0 })
    }

    /// The last tick this recording has commands recorded for,
    /// inclusive. A fresh match with no recorded ticks reports `0`.
    #[must_use]
    pub fn max_tick(&self) -> u32 {
        self.recording.ticks.iter().map(|(t, _)| *t).max().unwrap_or(0)
    }

    /// The tick the engine is currently positioned at.
    #[must_use]
    pub fn current_tick(&self) -> u32 {
        self.current_tick
    }

    /// A read-only view of the simulation at the current tick.
    #[must_use]
    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// Execute exactly one more tick using its recorded commands.
    pub fn step_forward(&mut self) {
        let commands = self.recording.commands_at(self.current_tick).to_vec();
        crate::sim::pipeline::run_tick(&mut self.state, &commands);
        self.current_tick += 1;
    }

    /// Jump to `target_tick`, replaying from tick 0 if `target_tick` is
    /// behind the engine's current position (stepping through a
    /// deterministic simulation has no cheaper way to go backward).
    ///
    /// # Errors
    /// Returns [`ReplayError::TickOutOfBounds`] if `target_tick`
    /// exceeds [`ReplayEngine::max_tick`], and
    /// [`ReplayError::MapGeneration`] if rebuilding from tick 0 fails
    /// (this can only happen if the recorded seed/dimensions are
    /// themselves invalid, which `Recording::load` would already have
    /// accepted).
    pub fn goto_tick(&mut self, target_tick: u32) -> Result<(), ReplayError> {
        let max_tick = self.max_tick();
        if target_tick > max_tick {
            return Err(ReplayError::TickOutOfBounds { requested: target_tick, max_tick });
        }
        if target_tick < self.current_tick {
            self.state = SimState::new(self.recording.seed, self.recording.width, self.recording.height, self.recording.rules)
                .map_err(ReplayError::MapGeneration)?;
            self.current_tick = 0;
        }
        while self.current_tick < target_tick {
            self.step_forward();
        }
        Ok(())
    }
}
