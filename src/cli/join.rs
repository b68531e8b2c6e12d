//! Join mode: connect to a host at `host:port`, then run the match as
//! player 1.

use super::{run_match_loop, CliError};
use myrmidon::net::coordinator::Coordinator;
use myrmidon::net::peer::{join_handshake, DatagramPeer};
use myrmidon::sim::rules::{LockstepConfig, Rules};
use myrmidon::sim::state::SimState;
use std::time::Duration;

const MAP_WIDTH: i32 = 48;
const MAP_HEIGHT: i32 = 32;

/// Execute the join command: connect to `addr`, adopt the seed the
/// host assigns, and run the match.
///
/// # Errors
/// Returns an error if the socket cannot be bound, `addr` does not
/// resolve, or map generation for the adopted seed fails.
pub(crate) fn execute(addr: &str) -> Result<(), CliError> {
    let mut peer = DatagramPeer::connect("0.0.0.0:0", addr)?;
    log::info!("connecting to {addr}");

    let info = join_handshake(&mut peer, Duration::from_secs(1));
    log::info!("connected as player {}, seed {}", info.player_id, info.seed);

    let rules = Rules::default();
    let lockstep = LockstepConfig::default();
    let mut state = SimState::new(info.seed, MAP_WIDTH, MAP_HEIGHT, rules)?;
    let mut coordinator = Coordinator::new(peer, lockstep.input_delay, lockstep.hash_interval, lockstep.warn_ms, lockstep.disconnect_ms);

    run_match_loop(&mut coordinator, &mut state, info.tick_rate);
    Ok(())
}
