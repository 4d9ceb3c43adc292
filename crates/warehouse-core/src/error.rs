//! Fleet-level conditions.
//!
//! Every variant is recoverable. They are returned from robot and dispatcher
//! operations so callers can log or react, but nothing in the engine lets one
//! of them stop the simulation.

use warehouse_logic::grid::Position;
use warehouse_logic::inventory::ShelfFull;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    /// Goal unreachable under current occupancy.
    PathNotFound { from: Position, to: Position },
    /// Chosen shelf had no room left.
    ShelfFull { shelf: Position },
    /// Next planned cell is taken by someone else.
    CellOccupied { cell: Position },
    /// Pickup attempted on an empty unload dock.
    DockEmpty,
    /// Battery hit zero away from a station.
    BatteryDepleted { robot_id: u32 },
    /// Destination cell is not a stop position or dock stand.
    NotAStop { cell: Position },
    UnknownRobot(u32),
    OutOfBounds(Position),
}

impl From<ShelfFull> for FleetError {
    fn from(e: ShelfFull) -> Self {
        FleetError::ShelfFull { shelf: e.position }
    }
}

impl std::fmt::Display for FleetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FleetError::PathNotFound { from, to } => write!(f, "No path from {} to {}", from, to),
            FleetError::ShelfFull { shelf } => write!(f, "Shelf at {} is full", shelf),
            FleetError::CellOccupied { cell } => write!(f, "Cell {} is occupied", cell),
            FleetError::DockEmpty => write!(f, "Unload dock is empty"),
            FleetError::BatteryDepleted { robot_id } => {
                write!(f, "Robot {} ran out of battery", robot_id)
            }
            FleetError::NotAStop { cell } => write!(f, "{} does not service a shelf or dock", cell),
            FleetError::UnknownRobot(id) => write!(f, "No robot with id {}", id),
            FleetError::OutOfBounds(pos) => write!(f, "{} is outside the grid", pos),
        }
    }
}

impl std::error::Error for FleetError {}
