//! Grid geometry and the live occupancy index.
//!
//! `GridBounds` answers pure spatial questions (bounds, orthogonal
//! neighbors, Manhattan distance). `GridWorld` layers a position → occupant
//! index on top of it, maintained incrementally as robots move.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Integer cell coordinate. Serialized as `[x, y]`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `|dx| + |dy|`
    pub fn manhattan(&self, other: &Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Position> for (i32, i32) {
    fn from(p: Position) -> Self {
        (p.x, p.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of the warehouse floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

/// Neighbor offsets in the fixed order used everywhere: +x, -x, +y, -y.
const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl GridBounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// The four orthogonal cells around `pos`, filtered to in-bounds only.
    pub fn neighbors4(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        ORTHOGONAL
            .iter()
            .map(move |&(dx, dy)| Position::new(pos.x + dx, pos.y + dy))
            .filter(move |p| self.in_bounds(*p))
    }
}

/// Which dock a `Dock` occupant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DockKind {
    Unload,
    Load,
}

/// Coarse kind tag for anything that can sit on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Robot,
    Shelf,
    Dock,
    BatteryStation,
    StaticObstacle,
}

/// An entity registered in the occupancy index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupant {
    Robot(u32),
    /// Index into the shelf registry.
    Shelf(usize),
    Dock(DockKind),
    BatteryStation,
    Obstacle,
}

impl Occupant {
    pub fn kind(&self) -> EntityKind {
        match self {
            Occupant::Robot(_) => EntityKind::Robot,
            Occupant::Shelf(_) => EntityKind::Shelf,
            Occupant::Dock(_) => EntityKind::Dock,
            Occupant::BatteryStation => EntityKind::BatteryStation,
            Occupant::Obstacle => EntityKind::StaticObstacle,
        }
    }
}

/// Bounds plus the live occupancy index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridWorld {
    bounds: GridBounds,
    cells: HashMap<Position, Vec<Occupant>>,
}

impl GridWorld {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            bounds: GridBounds::new(width, height),
            cells: HashMap::new(),
        }
    }

    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        self.bounds.in_bounds(pos)
    }

    pub fn neighbors4(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        self.bounds.neighbors4(pos)
    }

    /// Current occupants of a cell. Out-of-bounds cells are always empty.
    pub fn occupants_at(&self, pos: Position) -> &[Occupant] {
        self.cells.get(&pos).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Register an occupant. Returns false (and does nothing) when `pos` is
    /// outside the grid.
    pub fn place(&mut self, pos: Position, occupant: Occupant) -> bool {
        if !self.bounds.in_bounds(pos) {
            return false;
        }
        self.cells.entry(pos).or_default().push(occupant);
        true
    }

    /// Remove an occupant from a cell. Returns whether it was there.
    pub fn remove(&mut self, pos: Position, occupant: Occupant) -> bool {
        let Some(list) = self.cells.get_mut(&pos) else {
            return false;
        };
        let Some(idx) = list.iter().position(|o| *o == occupant) else {
            return false;
        };
        list.remove(idx);
        if list.is_empty() {
            self.cells.remove(&pos);
        }
        true
    }

    /// Move a robot's occupancy entry from `from` to `to`.
    pub fn move_robot(&mut self, robot_id: u32, from: Position, to: Position) -> bool {
        if !self.bounds.in_bounds(to) {
            return false;
        }
        self.remove(from, Occupant::Robot(robot_id));
        self.place(to, Occupant::Robot(robot_id))
    }

    /// Id of the robot standing on `pos`, if any.
    pub fn robot_at(&self, pos: Position) -> Option<u32> {
        self.occupants_at(pos).iter().find_map(|o| match o {
            Occupant::Robot(id) => Some(*id),
            _ => None,
        })
    }

    pub fn has_kind(&self, pos: Position, kind: EntityKind) -> bool {
        self.occupants_at(pos).iter().any(|o| o.kind() == kind)
    }

    pub fn is_station(&self, pos: Position) -> bool {
        self.has_kind(pos, EntityKind::BatteryStation)
    }

    /// Shelves, docks and obstacles. Robots can never stand here.
    pub fn is_static_blocked(&self, pos: Position) -> bool {
        self.occupants_at(pos).iter().any(|o| match o.kind() {
            EntityKind::Shelf | EntityKind::Dock | EntityKind::StaticObstacle => true,
            EntityKind::Robot | EntityKind::BatteryStation => false,
        })
    }

    /// Blocking predicate as seen by robot `robot_id`.
    ///
    /// Battery stations only admit robots that are heading to charge.
    pub fn is_blocked_for(&self, pos: Position, robot_id: u32, may_enter_station: bool) -> bool {
        if !self.bounds.in_bounds(pos) {
            return true;
        }
        self.occupants_at(pos).iter().any(|o| match *o {
            Occupant::Robot(id) => id != robot_id,
            Occupant::Shelf(_) | Occupant::Dock(_) | Occupant::Obstacle => true,
            Occupant::BatteryStation => !may_enter_station,
        })
    }
}
