//! CLI command implementations for Myrmidon.

pub(crate) mod host;
pub(crate) mod join;
pub(crate) mod local;

use std::error::Error;
use std::fmt;

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<myrmidon::net::peer::PeerError> for CliError {
    fn from(e: myrmidon::net::peer::PeerError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<myrmidon::sim::map::MapGenError> for CliError {
    fn from(e: myrmidon::sim::map::MapGenError) -> Self {
        Self::new(e.to_string())
    }
}

/// Generate a 32-bit seed from a non-simulation clock source. Only the
/// host side of the handshake calls this; the joiner receives the seed
/// over the wire.
pub(crate) fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    #[allow(clippy::cast_possible_truncation)]
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u32).unwrap_or(1);
    nanos
}

/// Drive `coordinator`/`state` forward at the simulation's tick pace
/// until the match ends or the link is declared disconnected.
///
/// This is the thin loop the spec calls "renderer/presentation loop and
/// simulation loop on the same thread of control" — here collapsed to
/// its simulation half, since rendering is out of scope for this
/// driver.
pub(crate) fn run_match_loop(coordinator: &mut myrmidon::net::coordinator::Coordinator, state: &mut myrmidon::sim::state::SimState, tick_rate: u32) {
    let frame_pace = std::time::Duration::from_millis(1000 / u64::from(tick_rate.max(1)));
    let mut warned = false;
    let mut desyncs_logged = 0;

    loop {
        coordinator.poll(state);

        if state.game_over() {
            log::info!("match complete at tick {}, winner {:?}", state.tick(), state.winner());
            break;
        }

        match coordinator.link_state() {
            myrmidon::net::coordinator::LinkState::Disconnected => {
                log::warn!("peer disconnected at tick {}", coordinator.current_tick());
                break;
            }
            myrmidon::net::coordinator::LinkState::Waiting => {
                if !warned {
                    log::warn!("waiting on peer input at tick {}", coordinator.current_tick());
                    warned = true;
                }
            }
            myrmidon::net::coordinator::LinkState::Connected => warned = false,
        }

        for desync in &coordinator.desyncs()[desyncs_logged..] {
            log::error!("{desync}");
        }
        desyncs_logged = coordinator.desyncs().len();

        std::thread::sleep(frame_pace);
    }
}
