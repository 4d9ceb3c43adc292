//! Robot (LGV) component and its operational states.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use warehouse_logic::battery;
use warehouse_logic::grid::Position;
use warehouse_logic::inventory::Package;

/// Operational state of a robot. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RobotState {
    #[default]
    Idle,
    PathingToPickup,
    PickingUp,
    PathingToDeliver,
    Delivering,
    PathingToCharge,
    Charging,
    Stuck,
}

/// What a robot did during one tick. Recorded in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotAction {
    Move,
    Pickup,
    DeliverLoad,
    DeliverShelf,
    Charge,
    Idle,
}

impl RobotAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotAction::Move => "move",
            RobotAction::Pickup => "pickup",
            RobotAction::DeliverLoad => "deliver_load",
            RobotAction::DeliverShelf => "deliver_shelf",
            RobotAction::Charge => "charge",
            RobotAction::Idle => "idle",
        }
    }
}

/// A warehouse robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub id: u32,
    pub position: Position,
    pub state: RobotState,
    /// 0..=100
    pub battery: u8,
    pub carrying: Option<Package>,
    pub destination: Option<Position>,
    /// Planned cells, consumed front to back. Never contains the current cell.
    pub path: VecDeque<Position>,
    /// Consecutive ticks the next planned cell was blocked.
    pub stuck_counter: u32,
    pub movements: u64,
    pub delivered: u64,
    /// Sitting on a station and recharging.
    pub charging: bool,
    /// Set after an escape move; the next step plans from scratch.
    pub needs_replan: bool,
    /// Battery ran out away from a station.
    pub stalled: bool,
}

impl Robot {
    pub fn new(id: u32, position: Position) -> Self {
        Self {
            id,
            position,
            state: RobotState::Idle,
            battery: battery::FULL,
            carrying: None,
            destination: None,
            path: VecDeque::new(),
            stuck_counter: 0,
            movements: 0,
            delivered: 0,
            charging: false,
            needs_replan: false,
            stalled: false,
        }
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying.is_some()
    }

    /// Heading to or sitting on a battery station. Stations only admit
    /// robots with this intent.
    pub fn has_charging_intent(&self) -> bool {
        self.charging || self.state == RobotState::PathingToCharge
    }

    /// Whether the dispatcher should leave this robot alone this tick.
    pub fn needs_charge(&self, low_threshold: u8) -> bool {
        self.charging || battery::is_low(self.battery, low_threshold)
    }
}
