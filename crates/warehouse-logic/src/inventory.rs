//! Package containers: bounded shelves and dock queues.

use serde::{Deserialize, Serialize};

use crate::grid::{DockKind, Position};

/// An opaque package token. Carries identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    pub id: u32,
}

/// Returned when a package does not fit on a shelf. The shelf is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShelfFull {
    pub position: Position,
    pub capacity: usize,
}

impl std::fmt::Display for ShelfFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "shelf at {} is full ({} packages)",
            self.position, self.capacity
        )
    }
}

impl std::error::Error for ShelfFull {}

/// Bounded package container. Packages are never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shelf {
    pub position: Position,
    capacity: usize,
    packages: Vec<Package>,
}

impl Shelf {
    pub fn new(position: Position, capacity: usize) -> Self {
        Self {
            position,
            capacity,
            packages: Vec::with_capacity(capacity),
        }
    }

    /// Append a package if there is room; otherwise leave the shelf as is.
    pub fn add(&mut self, package: Package) -> Result<(), ShelfFull> {
        if self.packages.len() >= self.capacity {
            return Err(ShelfFull {
                position: self.position,
                capacity: self.capacity,
            });
        }
        self.packages.push(package);
        Ok(())
    }

    pub fn current_load(&self) -> usize {
        self.packages.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_space(&self) -> bool {
        self.packages.len() < self.capacity
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }
}

/// A truck bay. The unload dock is a supply the fleet drains; the load dock
/// is an unbounded sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dock {
    pub kind: DockKind,
    pub position: Position,
    /// Cell a robot stands on to use the dock.
    pub stand: Position,
    queue: Vec<Package>,
}

impl Dock {
    pub fn new(kind: DockKind, position: Position, stand: Position) -> Self {
        Self {
            kind,
            position,
            stand,
            queue: Vec::new(),
        }
    }

    /// Take the package at the end of the queue.
    pub fn pop(&mut self) -> Option<Package> {
        self.queue.pop()
    }

    pub fn push(&mut self, package: Package) {
        self.queue.push(package);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(id: u32) -> Package {
        Package { id }
    }

    #[test]
    fn test_full_shelf_rejects_without_mutation() {
        let mut shelf = Shelf::new(Position::new(2, 2), 3);
        for id in 0..3 {
            shelf.add(pkg(id)).unwrap();
        }
        let err = shelf.add(pkg(99)).unwrap_err();
        assert_eq!(err.capacity, 3);
        assert_eq!(shelf.current_load(), 3);
        assert!(!shelf.packages().contains(&pkg(99)));
    }

    #[test]
    fn test_has_space() {
        let mut shelf = Shelf::new(Position::new(0, 0), 1);
        assert!(shelf.has_space());
        shelf.add(pkg(1)).unwrap();
        assert!(!shelf.has_space());
    }

    #[test]
    fn test_dock_pops_from_end() {
        let mut dock = Dock::new(DockKind::Unload, Position::new(0, 5), Position::new(1, 5));
        dock.push(pkg(1));
        dock.push(pkg(2));
        assert_eq!(dock.pop(), Some(pkg(2)));
        assert_eq!(dock.pop(), Some(pkg(1)));
        assert_eq!(dock.pop(), None);
        assert!(dock.is_empty());
    }
}
