//! The deterministic simulation core: map generation, pathfinding, entity
//! storage, the command model, and the ordered tick pipeline.
//!
//! Everything here is integer-only and single-threaded by construction —
//! see [`pipeline::run_tick`] for the contract both lockstep peers rely on.

mod apply;
pub mod command;
pub mod combat;
pub mod entity;
pub mod founding;
pub mod hash;
pub mod harvest;
pub mod invariants;
pub mod map;
pub mod movement;
pub mod pathfind;
pub mod pipeline;
pub mod rng;
pub mod rules;
pub mod state;
pub mod units;
pub mod visibility;
pub mod wildlife;
