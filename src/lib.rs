//! This is a plugin for the Bevy game engine providing deterministic, block based hierarchical pathfinding for lockstep RTS simulations
//!

pub mod bundle;
pub mod pathfinding;
pub mod plugin;

pub mod prelude;
