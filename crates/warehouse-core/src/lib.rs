//! Warehouse Core - LGV Fleet Simulation Engine
//!
//! A tick-driven simulation of laser-guided vehicles moving packages from an
//! unload dock to shelves and a load dock, managing their own batteries.
//!
//! # Architecture
//!
//! Robots are `hecs` entities carrying a [`components::Robot`] component. The
//! static site (grid, shelves, docks, stations) lives in a shared
//! [`warehouse::Warehouse`] that systems mutate through `&mut` borrows.
//! - **Dispatcher**: assigns destinations to every robot before anyone acts
//! - **Agent**: per-robot state machine (charge, fetch, deliver, unstick)
//! - **Telemetry**: append-only per-robot event stream
//!
//! # Example
//!
//! ```rust,no_run
//! use warehouse_core::prelude::*;
//!
//! let mut engine = SimulationEngine::standard().unwrap();
//! let summary = SimulationClock::from_config(engine.config()).run(&mut engine);
//! println!("{:?} after {} ticks", summary.reason, summary.ticks);
//! ```

pub mod clock;
pub mod components;
pub mod engine;
pub mod error;
pub mod generation;
pub mod persistence;
pub mod systems;
pub mod warehouse;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::clock::{RunSummary, SimulationClock};
    pub use crate::components::*;
    pub use crate::engine::{FleetMetrics, HaltReason, RunStatus, SimulationEngine};
    pub use crate::error::FleetError;
    pub use warehouse_logic::config::SimConfig;
    pub use warehouse_logic::grid::Position;
    pub use warehouse_logic::layout::WarehouseLayout;
}
