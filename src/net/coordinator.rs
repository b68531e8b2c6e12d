//! The lockstep coordinator: per-tick command buffers, the try-advance
//! loop, periodic hash exchange, and connection liveness tracking.

use crate::net::codec::Message;
use crate::net::peer::DatagramPeer;
use crate::sim::command::{sort_canonical, Command};
use crate::sim::hash::StateDigest;
use crate::sim::pipeline::run_tick;
use crate::sim::state::SimState;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

/// A confirmed divergence between this peer's and the remote peer's
/// state. The simulation keeps running after this — correctness is
/// lost but observability still has value.
#[derive(Debug, Clone, Copy)]
pub struct DesyncReport {
    /// The tick the mismatching hashes were computed for.
    pub tick: u32,
    /// This peer's digest.
    pub local: StateDigest,
    /// The remote peer's digest.
    pub remote: StateDigest,
}

impl fmt::Display for DesyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "desync at tick {}: local {} != remote {}", self.tick, hex(&self.local), hex(&self.remote))
    }
}

impl std::error::Error for DesyncReport {}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Liveness state derived from how long it has been since any datagram
/// was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Datagrams are arriving within `warn_ms`.
    Connected,
    /// No datagram for at least `warn_ms` but less than `disconnect_ms`.
    Waiting,
    /// No datagram for at least `disconnect_ms`. Terminal.
    Disconnected,
}

/// Owns the datagram peer, the per-tick own/peer command buffers, and
/// drives ticks forward as both sides' inputs become available.
#[derive(Debug)]
pub struct Coordinator {
    peer: DatagramPeer,
    input_delay: u32,
    hash_interval: u32,
    warn_timeout: Duration,
    disconnect_timeout: Duration,
    current: u32,
    own_commands: HashMap<u32, Vec<Command>>,
    peer_commands: HashMap<u32, Vec<Command>>,
    published: HashSet<u32>,
    own_hashes: HashMap<u32, StateDigest>,
    peer_hashes: HashMap<u32, StateDigest>,
    last_received: Instant,
    desyncs: Vec<DesyncReport>,
}

impl Coordinator {
    /// Construct a coordinator starting at tick 0, owning `peer`.
    #[must_use]
    pub fn new(peer: DatagramPeer, input_delay: u32, hash_interval: u32, warn_ms: u64, disconnect_ms: u64) -> Self {
        Self {
            peer,
            input_delay,
            hash_interval,
            warn_timeout: Duration::from_millis(warn_ms),
            disconnect_timeout: Duration::from_millis(disconnect_ms),
            current: 0,
            own_commands: HashMap::new(),
            peer_commands: HashMap::new(),
            published: HashSet::new(),
            own_hashes: HashMap::new(),
            peer_hashes: HashMap::new(),
            last_received: Instant::now(),
            desyncs: Vec::new(),
        }
    }

    /// The tick the coordinator is currently trying to advance past.
    #[must_use]
    pub fn current_tick(&self) -> u32 {
        self.current
    }

    /// Every desync detected so far, in the order they were found.
    #[must_use]
    pub fn desyncs(&self) -> &[DesyncReport] {
        &self.desyncs
    }

    /// Queue a locally-issued command for the tick `input_delay` ticks
    /// from `self.current`. The caller is responsible for stamping
    /// `command.tick` to match.
    pub fn queue_own_command(&mut self, command: Command) {
        self.own_commands.entry(command.tick).or_default().push(command);
    }

    /// The tick a command issued right now would execute on.
    #[must_use]
    pub fn next_input_tick(&self) -> u32 {
        self.current + self.input_delay
    }

    /// Current liveness classification based on time since the last
    /// received datagram.
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        let elapsed = self.last_received.elapsed();
        if elapsed >= self.disconnect_timeout {
            LinkState::Disconnected
        } else if elapsed >= self.warn_timeout {
            LinkState::Waiting
        } else {
            LinkState::Connected
        }
    }

    /// One coordinator frame: drain inbound datagrams, publish any
    /// not-yet-published own-tick commands in `[current, current + D)`,
    /// then try-advance as many ticks as both sides' inputs allow.
    ///
    /// Returns the number of ticks actually advanced this frame.
    pub fn poll(&mut self, state: &mut SimState) -> u32 {
        self.drain_inbound();
        self.publish_pending();
        self.try_advance(state)
    }

    fn drain_inbound(&mut self) {
        let messages = self.peer.drain();
        if !messages.is_empty() {
            self.last_received = Instant::now();
        }
        for (message, _from) in messages {
            match message {
                Message::Commands { tick, commands } => {
                    self.peer_commands.entry(tick).or_insert(commands);
                }
                Message::HashCheck { tick, digest } => {
                    self.peer_hashes.insert(tick, digest);
                    self.check_desync(tick);
                }
                Message::Connect | Message::ConnectAck { .. } | Message::Disconnect => {}
            }
        }
    }

    fn publish_pending(&mut self) {
        for tick in self.current..self.current + self.input_delay {
            if self.published.insert(tick) {
                let commands = self.own_commands.get(&tick).cloned().unwrap_or_default();
                self.peer.send_redundant(&Message::Commands { tick, commands });
            }
        }
    }

    fn try_advance(&mut self, state: &mut SimState) -> u32 {
        let mut advanced = 0;
        loop {
            if !self.published.contains(&self.current) {
                break;
            }
            let Some(peer) = self.peer_commands.get(&self.current) else { break };

            let mut merged = self.own_commands.get(&self.current).cloned().unwrap_or_default();
            merged.extend(peer.iter().cloned());
            sort_canonical(&mut merged);
            self.advance_one(state, &merged);
            advanced += 1;
        }
        advanced
    }

    fn advance_one(&mut self, state: &mut SimState, commands: &[Command]) {
        let completed_tick = self.current;
        run_tick(state, commands);
        self.own_commands.remove(&completed_tick);
        self.peer_commands.remove(&completed_tick);
        self.current += 1;

        if self.hash_interval > 0 && completed_tick % self.hash_interval == 0 {
            let digest = state.state_hash();
            self.own_hashes.insert(completed_tick, digest);
            self.peer.send_redundant(&Message::HashCheck { tick: completed_tick, digest });
            self.check_desync(completed_tick);
        }
    }

    fn check_desync(&mut self, tick: u32) {
        if let (Some(&local), Some(&remote)) = (self.own_hashes.get(&tick), self.peer_hashes.get(&tick)) {
            if local != remote {
                self.desyncs.push(DesyncReport { tick, local, remote });
            }
        }
    }
}
