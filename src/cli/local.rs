//! Local-loopback mode: run both players in one process for testing
//! and demonstration, driving the genuine handshake and coordinator
//! over real loopback sockets rather than sharing state directly.

use super::{clock_seed, run_match_loop, CliError};
use myrmidon::net::coordinator::Coordinator;
use myrmidon::net::peer::{host_handshake, join_handshake, DatagramPeer};
use myrmidon::sim::rules::{LockstepConfig, Rules};
use myrmidon::sim::state::SimState;
use std::time::Duration;

const MAP_WIDTH: i32 = 48;
const MAP_HEIGHT: i32 = 32;

/// Execute the local-loopback command: spin up both peers on
/// `127.0.0.1`, run the handshake between them, and drive both
/// coordinators to completion.
///
/// # Errors
/// Returns an error if either socket fails to bind or map generation
/// fails.
pub(crate) fn execute() -> Result<(), CliError> {
    let mut host_peer = DatagramPeer::bind("127.0.0.1:0")?;
    let host_addr = host_peer.local_addr()?;
    let mut join_peer = DatagramPeer::connect("127.0.0.1:0", host_addr)?;

    let seed = clock_seed();
    let rules = Rules::default();
    #[allow(clippy::cast_sign_loss)]
    let tick_rate = rules.tick_rate as u32;

    let joiner = std::thread::spawn(move || {
        let info = join_handshake(&mut join_peer, Duration::from_millis(50));
        (info, join_peer)
    });
    let host_info = host_handshake(&mut host_peer, seed, tick_rate, Duration::from_millis(10));
    let (join_info, join_peer) = joiner.join().expect("joiner thread panicked");

    log::info!("local match starting, seed {seed}");

    let lockstep = LockstepConfig::default();
    let mut host_state = SimState::new(host_info.seed, MAP_WIDTH, MAP_HEIGHT, rules)?;
    let mut join_state = SimState::new(join_info.seed, MAP_WIDTH, MAP_HEIGHT, rules)?;

    let mut host_coordinator = Coordinator::new(host_peer, lockstep.input_delay, lockstep.hash_interval, lockstep.warn_ms, lockstep.disconnect_ms);
    let mut join_coordinator = Coordinator::new(join_peer, lockstep.input_delay, lockstep.hash_interval, lockstep.warn_ms, lockstep.disconnect_ms);

    let join_thread = std::thread::spawn(move || {
        run_match_loop(&mut join_coordinator, &mut join_state, join_info.tick_rate);
        join_state.state_hash()
    });
    run_match_loop(&mut host_coordinator, &mut host_state, host_info.tick_rate);
    let join_hash = join_thread.join().expect("join-side match thread panicked");

    if host_state.state_hash() != join_hash {
        log::error!("local match ended with diverged final state hashes");
    }
    Ok(())
}
