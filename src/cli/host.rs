//! Host-on-port mode: bind a socket, wait for a joiner, then run the
//! match as player 0.

use super::{clock_seed, run_match_loop, CliError};
use myrmidon::net::coordinator::Coordinator;
use myrmidon::net::peer::{host_handshake, DatagramPeer};
use myrmidon::sim::rules::{LockstepConfig, Rules};
use myrmidon::sim::state::SimState;
use std::time::Duration;

/// Default map dimensions for a hosted match (illustrative; a real
/// driver would take these as arguments or a lobby negotiation).
const MAP_WIDTH: i32 = 48;
const MAP_HEIGHT: i32 = 32;

/// Execute the host command: listen on `port`, run the match once a
/// joiner connects.
///
/// # Errors
/// Returns an error if the socket cannot be bound or map generation
/// for the generated seed fails.
pub(crate) fn execute(port: u16) -> Result<(), CliError> {
    let mut peer = DatagramPeer::bind(("0.0.0.0", port))?;
    log::info!("hosting on port {port}, waiting for a joiner");

    let seed = clock_seed();
    let rules = Rules::default();
    let lockstep = LockstepConfig::default();
    #[allow(clippy::cast_sign_loss)]
    let tick_rate = rules.tick_rate as u32;

    let info = host_handshake(&mut peer, seed, tick_rate, Duration::from_millis(100));
    log::info!("joiner connected, starting match with seed {seed}");

    let mut state = SimState::new(info.seed, MAP_WIDTH, MAP_HEIGHT, rules)?;
    let mut coordinator = Coordinator::new(peer, lockstep.input_delay, lockstep.hash_interval, lockstep.warn_ms, lockstep.disconnect_ms);

    run_match_loop(&mut coordinator, &mut state, info.tick_rate);
    Ok(())
}
