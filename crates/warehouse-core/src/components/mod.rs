//! Component definitions for the fleet simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod robot;

pub use robot::*;
