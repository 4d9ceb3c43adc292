//! Shared site state: the grid, shelves, docks, stations and stop map.
//!
//! Everything robots mutate during a tick lives here. The registries are
//! partitioned by kind so nearest-target scans only look at the relevant
//! subset, and the grid keeps the position → occupant index current.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use warehouse_logic::grid::{DockKind, GridWorld, Occupant, Position};
use warehouse_logic::inventory::{Dock, Package, Shelf};

use crate::error::FleetError;

/// What a standing cell services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopTarget {
    /// Index into the shelf registry.
    Shelf(usize),
    Dock(DockKind),
}

/// Where a delivered package ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    LoadDock,
    Shelf(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub grid: GridWorld,
    pub shelves: Vec<Shelf>,
    pub unload_dock: Dock,
    pub load_dock: Dock,
    pub stations: Vec<Position>,
    stop_map: HashMap<Position, StopTarget>,
    /// Reverse of `stop_map` for shelves; first registered stand wins.
    shelf_stands: HashMap<usize, Position>,
}

impl Warehouse {
    /// Empty floor with its two docks placed.
    pub fn new(width: i32, height: i32, unload_dock: Dock, load_dock: Dock) -> Self {
        let mut grid = GridWorld::new(width, height);
        grid.place(unload_dock.position, Occupant::Dock(DockKind::Unload));
        grid.place(load_dock.position, Occupant::Dock(DockKind::Load));

        let mut stop_map = HashMap::new();
        stop_map.insert(unload_dock.stand, StopTarget::Dock(DockKind::Unload));
        stop_map.insert(load_dock.stand, StopTarget::Dock(DockKind::Load));

        Self {
            grid,
            shelves: Vec::new(),
            unload_dock,
            load_dock,
            stations: Vec::new(),
            stop_map,
            shelf_stands: HashMap::new(),
        }
    }

    pub fn add_shelf(&mut self, shelf: Shelf) -> usize {
        let idx = self.shelves.len();
        self.grid.place(shelf.position, Occupant::Shelf(idx));
        self.shelves.push(shelf);
        idx
    }

    pub fn add_station(&mut self, position: Position) {
        self.grid.place(position, Occupant::BatteryStation);
        self.stations.push(position);
    }

    pub fn add_obstacle(&mut self, position: Position) {
        self.grid.place(position, Occupant::Obstacle);
    }

    /// Register a standing cell for the shelf or dock at `target`.
    /// Returns false if nothing is at `target`.
    pub fn add_stop(&mut self, stand: Position, target: Position) -> bool {
        let resolved = if target == self.unload_dock.position {
            Some(StopTarget::Dock(DockKind::Unload))
        } else if target == self.load_dock.position {
            Some(StopTarget::Dock(DockKind::Load))
        } else {
            self.shelf_index_at(target).map(StopTarget::Shelf)
        };
        let Some(resolved) = resolved else {
            return false;
        };
        if let StopTarget::Shelf(idx) = resolved {
            self.shelf_stands.entry(idx).or_insert(stand);
        }
        self.stop_map.insert(stand, resolved);
        true
    }

    pub fn stop_target(&self, stand: Position) -> Option<StopTarget> {
        self.stop_map.get(&stand).copied()
    }

    pub fn stand_for_shelf(&self, shelf_idx: usize) -> Option<Position> {
        self.shelf_stands.get(&shelf_idx).copied()
    }

    pub fn shelf_index_at(&self, position: Position) -> Option<usize> {
        self.shelves.iter().position(|s| s.position == position)
    }

    /// Standing cell of the closest shelf with spare capacity.
    ///
    /// Distance is Manhattan from `from` to the shelf itself; on ties the
    /// shelf registered first wins. Shelves without a stand are skipped.
    pub fn nearest_open_shelf_stand(&self, from: Position) -> Option<Position> {
        self.shelves
            .iter()
            .enumerate()
            .filter(|(_, shelf)| shelf.has_space())
            .filter_map(|(idx, shelf)| {
                self.stand_for_shelf(idx)
                    .map(|stand| (from.manhattan(&shelf.position), stand))
            })
            .min_by_key(|(dist, _)| *dist)
            .map(|(_, stand)| stand)
    }

    /// Closest battery station to `from`.
    ///
    /// Stations occupied by a robot other than `robot_id` are passed over
    /// when a free one exists. Ties go to registry order.
    pub fn nearest_station(&self, from: Position, robot_id: u32) -> Option<Position> {
        let free = self
            .stations
            .iter()
            .filter(|s| self.grid.robot_at(**s).map_or(true, |id| id == robot_id))
            .min_by_key(|s| from.manhattan(s))
            .copied();
        free.or_else(|| self.stations.iter().min_by_key(|s| from.manhattan(s)).copied())
    }

    /// Take one package from the unload dock.
    pub fn pickup(&mut self) -> Result<Package, FleetError> {
        self.unload_dock.pop().ok_or(FleetError::DockEmpty)
    }

    /// Hand a package over at standing cell `stand`.
    ///
    /// On failure nothing is mutated and the caller still holds the package.
    pub fn deliver(&mut self, stand: Position, package: Package) -> Result<Sink, FleetError> {
        match self.stop_target(stand) {
            Some(StopTarget::Dock(DockKind::Load)) => {
                self.load_dock.push(package);
                Ok(Sink::LoadDock)
            }
            Some(StopTarget::Shelf(idx)) => {
                let shelf = self
                    .shelves
                    .get_mut(idx)
                    .ok_or(FleetError::NotAStop { cell: stand })?;
                shelf.add(package)?;
                Ok(Sink::Shelf(idx))
            }
            Some(StopTarget::Dock(DockKind::Unload)) | None => {
                Err(FleetError::NotAStop { cell: stand })
            }
        }
    }

    pub fn packages_shelved(&self) -> usize {
        self.shelves.iter().map(|s| s.current_load()).sum()
    }
}
