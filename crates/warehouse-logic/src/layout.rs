//! Warehouse floor plan: the externally authored setup configuration.
//!
//! A layout names every static feature of the floor: shelves, docks,
//! battery stations, obstacles, the standing cells robots use to service
//! shelves and docks, and where robots spawn. It is loaded from JSON and
//! validated against a [`SimConfig`] before a simulation is built from it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::constants;
use crate::grid::{GridBounds, Position};

/// The bundled 18×12 warehouse.
pub const STANDARD_LAYOUT_JSON: &str = include_str!("../data/warehouse_layout.json");

fn default_capacity() -> usize {
    constants::shelf::CAPACITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfSpec {
    pub position: Position,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Packages already on the shelf at start, taken from the incoming total.
    #[serde(default)]
    pub initial_load: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DockSpec {
    pub position: Position,
    pub stand: Position,
}

/// One entry of the stop-position map: standing cell → serviced feature.
///
/// Each shelf has at most one standing cell; a second entry for the same
/// shelf fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopSpec {
    pub stand: Position,
    pub target: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseLayout {
    pub width: i32,
    pub height: i32,
    pub unload_dock: DockSpec,
    pub load_dock: DockSpec,
    pub shelves: Vec<ShelfSpec>,
    #[serde(default)]
    pub stop_positions: Vec<StopSpec>,
    pub battery_stations: Vec<Position>,
    #[serde(default)]
    pub obstacles: Vec<Position>,
    pub robot_spawns: Vec<Position>,
}

impl WarehouseLayout {
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The bundled default floor plan.
    pub fn standard() -> Result<Self, LayoutError> {
        Self::from_json(STANDARD_LAYOUT_JSON)
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.width, self.height)
    }

    /// Total packages placed on shelves before the first tick.
    pub fn preloaded_packages(&self) -> usize {
        self.shelves.iter().map(|s| s.initial_load).sum()
    }

    /// Cells no robot may ever stand on.
    fn static_cells(&self) -> impl Iterator<Item = (&'static str, Position)> + '_ {
        self.shelves
            .iter()
            .map(|s| ("shelf", s.position))
            .chain(std::iter::once(("unload dock", self.unload_dock.position)))
            .chain(std::iter::once(("load dock", self.load_dock.position)))
            .chain(self.obstacles.iter().map(|p| ("obstacle", *p)))
            .chain(self.battery_stations.iter().map(|p| ("battery station", *p)))
    }

    /// Check the layout is internally consistent and can host `config`.
    pub fn validate(&self, config: &SimConfig) -> Result<(), LayoutError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(LayoutError::ZeroSize {
                width: self.width,
                height: self.height,
            });
        }
        let bounds = self.bounds();

        // Static features: in bounds and pairwise distinct
        let mut taken = HashSet::new();
        for (what, pos) in self.static_cells() {
            if !bounds.in_bounds(pos) {
                return Err(LayoutError::OutOfBounds { what, position: pos });
            }
            if !taken.insert(pos) {
                return Err(LayoutError::Overlap { what, position: pos });
            }
        }

        // Standing cells and spawns must be walkable
        let stands = self
            .stop_positions
            .iter()
            .map(|s| ("stop position", s.stand))
            .chain(std::iter::once(("unload stand", self.unload_dock.stand)))
            .chain(std::iter::once(("load stand", self.load_dock.stand)));
        for (what, pos) in stands {
            if !bounds.in_bounds(pos) {
                return Err(LayoutError::OutOfBounds { what, position: pos });
            }
            if taken.contains(&pos) {
                return Err(LayoutError::Overlap { what, position: pos });
            }
        }

        let mut spawns = HashSet::new();
        for &pos in &self.robot_spawns {
            if !bounds.in_bounds(pos) {
                return Err(LayoutError::OutOfBounds {
                    what: "robot spawn",
                    position: pos,
                });
            }
            if taken.contains(&pos) || !spawns.insert(pos) {
                return Err(LayoutError::Overlap {
                    what: "robot spawn",
                    position: pos,
                });
            }
        }

        let mut served_shelves = HashSet::new();
        for stop in &self.stop_positions {
            let is_shelf = self.shelves.iter().any(|s| s.position == stop.target);
            let known = is_shelf
                || stop.target == self.unload_dock.position
                || stop.target == self.load_dock.position;
            if !known {
                return Err(LayoutError::UnknownStopTarget {
                    stand: stop.stand,
                    target: stop.target,
                });
            }
            if is_shelf && !served_shelves.insert(stop.target) {
                return Err(LayoutError::DuplicateShelfStand {
                    stand: stop.stand,
                    shelf: stop.target,
                });
            }
        }

        for shelf in &self.shelves {
            if shelf.initial_load > shelf.capacity {
                return Err(LayoutError::ShelfOverCapacity {
                    position: shelf.position,
                    load: shelf.initial_load,
                    capacity: shelf.capacity,
                });
            }
        }

        let shelved = self.preloaded_packages();
        if shelved > config.initial_packages as usize {
            return Err(LayoutError::OverfilledShelves {
                shelved,
                total: config.initial_packages as usize,
            });
        }

        if self.robot_spawns.len() < config.num_robots as usize {
            return Err(LayoutError::NotEnoughSpawns {
                needed: config.num_robots as usize,
                available: self.robot_spawns.len(),
            });
        }

        if self.battery_stations.is_empty() {
            return Err(LayoutError::MissingStation);
        }

        Ok(())
    }
}

/// Errors raised while loading or validating a layout.
#[derive(Debug)]
pub enum LayoutError {
    Json(serde_json::Error),
    ZeroSize {
        width: i32,
        height: i32,
    },
    OutOfBounds {
        what: &'static str,
        position: Position,
    },
    Overlap {
        what: &'static str,
        position: Position,
    },
    UnknownStopTarget {
        stand: Position,
        target: Position,
    },
    DuplicateShelfStand {
        stand: Position,
        shelf: Position,
    },
    ShelfOverCapacity {
        position: Position,
        load: usize,
        capacity: usize,
    },
    OverfilledShelves {
        shelved: usize,
        total: usize,
    },
    NotEnoughSpawns {
        needed: usize,
        available: usize,
    },
    MissingStation,
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        LayoutError::Json(e)
    }
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::Json(e) => write!(f, "Layout parse error: {}", e),
            LayoutError::ZeroSize { width, height } => {
                write!(f, "Grid must be non-empty, got {}x{}", width, height)
            }
            LayoutError::OutOfBounds { what, position } => {
                write!(f, "{} at {} is outside the grid", what, position)
            }
            LayoutError::Overlap { what, position } => {
                write!(f, "{} at {} overlaps another feature", what, position)
            }
            LayoutError::DuplicateShelfStand { stand, shelf } => write!(
                f,
                "Stop position {} is a second stand for the shelf at {}",
                stand, shelf
            ),
            LayoutError::UnknownStopTarget { stand, target } => write!(
                f,
                "Stop position {} points at {}, which is not a shelf or dock",
                stand, target
            ),
            LayoutError::ShelfOverCapacity {
                position,
                load,
                capacity,
            } => write!(
                f,
                "Shelf at {} starts with {} packages but holds {}",
                position, load, capacity
            ),
            LayoutError::OverfilledShelves { shelved, total } => write!(
                f,
                "Shelves start with {} packages but only {} arrive",
                shelved, total
            ),
            LayoutError::NotEnoughSpawns { needed, available } => write!(
                f,
                "{} robots requested but only {} spawn cells",
                needed, available
            ),
            LayoutError::MissingStation => write!(f, "Layout has no battery station"),
        }
    }
}

impl std::error::Error for LayoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_is_valid() {
        let layout = WarehouseLayout::standard().unwrap();
        assert_eq!((layout.width, layout.height), (18, 12));
        layout.validate(&SimConfig::default()).unwrap();
    }

    #[test]
    fn test_shelf_capacity_defaults_to_three() {
        let json = r#"{
            "width": 4, "height": 4,
            "unload_dock": { "position": [0, 0], "stand": [1, 0] },
            "load_dock": { "position": [3, 3], "stand": [2, 3] },
            "shelves": [{ "position": [3, 0] }],
            "battery_stations": [[0, 3]],
            "robot_spawns": [[1, 1]]
        }"#;
        let layout = WarehouseLayout::from_json(json).unwrap();
        assert_eq!(layout.shelves[0].capacity, 3);
        assert_eq!(layout.shelves[0].initial_load, 0);
        assert!(layout.stop_positions.is_empty());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            WarehouseLayout::from_json("{ not json"),
            Err(LayoutError::Json(_))
        ));
    }
}
