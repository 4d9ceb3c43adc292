//! Dispatcher - assigns destinations once per tick, before robots act.
//!
//! Empty-handed robots are sent to the unload dock while it has stock and
//! wander otherwise. Loaded robots are routed when they have no destination,
//! alternating between shelf and load-dock delivery in phases of a fixed
//! number of completed deliveries.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use warehouse_logic::config::SimConfig;
use warehouse_logic::grid::Position;

use super::agent::assign_destination;
use crate::components::Robot;
use crate::warehouse::Warehouse;

/// Where loaded robots are currently being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryPhase {
    #[default]
    Shelves,
    LoadDock,
}

impl DeliveryPhase {
    fn flipped(self) -> Self {
        match self {
            DeliveryPhase::Shelves => DeliveryPhase::LoadDock,
            DeliveryPhase::LoadDock => DeliveryPhase::Shelves,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dispatcher {
    phase: DeliveryPhase,
    /// Deliveries completed since the last phase flip.
    delivered_in_phase: u32,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DeliveryPhase {
        self.phase
    }

    pub fn delivered_in_phase(&self) -> u32 {
        self.delivered_in_phase
    }

    /// Count one completed delivery, flipping the phase every `phase_size`.
    pub fn record_delivery(&mut self, phase_size: u32) {
        self.delivered_in_phase += 1;
        if self.delivered_in_phase >= phase_size.max(1) {
            self.phase = self.phase.flipped();
            self.delivered_in_phase = 0;
            log::debug!("Delivery phase now {:?}", self.phase);
        }
    }

    /// Give one robot its destination for this tick.
    pub fn dispatch<R: Rng + ?Sized>(
        &mut self,
        robot: &mut Robot,
        wh: &Warehouse,
        config: &SimConfig,
        rng: &mut R,
    ) {
        if robot.stalled || robot.needs_charge(config.low_battery_threshold) {
            return;
        }

        let target = if robot.is_carrying() {
            if robot.destination.is_some() {
                return;
            }
            Some(self.route_package(robot.position, wh))
        } else if !wh.unload_dock.is_empty() {
            Some(wh.unload_dock.stand)
        } else {
            wander_target(robot, wh, rng)
        };

        if let Err(e) = assign_destination(robot, target, wh) {
            log::debug!("Dispatch to robot {} failed: {}", robot.id, e);
        }
    }

    /// Pick the delivery stand for a loaded robot under the current phase.
    fn route_package(&self, from: Position, wh: &Warehouse) -> Position {
        match self.phase {
            DeliveryPhase::LoadDock => wh.load_dock.stand,
            DeliveryPhase::Shelves => wh
                .nearest_open_shelf_stand(from)
                .unwrap_or(wh.load_dock.stand),
        }
    }
}

/// A random free orthogonal neighbor, if any.
fn wander_target<R: Rng + ?Sized>(robot: &Robot, wh: &Warehouse, rng: &mut R) -> Option<Position> {
    let free: Vec<Position> = wh
        .grid
        .neighbors4(robot.position)
        .filter(|p| !wh.grid.is_blocked_for(*p, robot.id, false))
        .collect();
    free.choose(rng).copied()
}
