// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Myrmidon: a deterministic lockstep simulation core for a two-player
//! ant-colony real-time strategy game.
//!
//! This crate provides the simulation engine two independent peers run
//! side by side, staying in lockstep by exchanging only commands (not
//! state) over an unreliable datagram transport. It is designed for:
//! - Bit-exact deterministic execution, integer-only throughout
//! - A fixed, audited ordered tick pipeline (see [`sim::pipeline::run_tick`])
//! - A wire codec and lockstep coordinator that detect divergence by hash
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     cli (host / join / local)       │
//! ├─────────────────────────────────────┤
//! │  net::coordinator (lockstep driver) │
//! ├────────────────┬────────────────────┤
//! │ net::peer/codec │ sim (tick pipeline)│
//! └────────────────┴────────────────────┘
//! ```
//!
//! The simulation in [`sim`] is oblivious to networking; [`net`] is
//! oblivious to gameplay rules beyond the wire shape of a
//! [`sim::command::Command`].

pub mod net;
pub mod replay;
pub mod sim;

pub use net::coordinator::Coordinator;
pub use replay::{Recording, ReplayEngine, ReplayError};
pub use sim::command::Command;
pub use sim::pipeline::run_tick;
pub use sim::state::SimState;
