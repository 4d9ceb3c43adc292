//! Pure warehouse fleet logic.
//!
//! This crate contains everything about the warehouse that is independent of
//! the simulation engine: geometry, pathfinding, battery arithmetic, package
//! containers and the setup configuration. Functions take plain data and
//! return results, so they are unit-testable on their own and shared by the
//! engine and the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`battery`] | Charge/discharge arithmetic and the low-battery policy |
//! | [`config`] | Tunable run parameters and fleet counts |
//! | [`constants`] | Default values for every tunable |
//! | [`grid`] | Positions, bounds, orthogonal neighbors, occupancy index |
//! | [`inventory`] | Packages, bounded shelves, dock queues |
//! | [`layout`] | Floor plan loading (JSON) and validation |
//! | [`pathfinding`] | Deterministic 4-directional A* |

pub mod battery;
pub mod config;
pub mod constants;
pub mod grid;
pub mod inventory;
pub mod layout;
pub mod pathfinding;
